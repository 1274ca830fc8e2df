use crate::client::BibRecord;
use unicode_normalization::UnicodeNormalization;

/// Characters that are illegal in filenames on at least one supported platform
const ILLEGAL_CHARS: &str = "<>:\"/\\|?*";

/// Maximum length of a generated filename stem, in characters
const MAX_STEM_LEN: usize = 200;

/// Extension appended to every generated name
const EXTENSION: &str = ".pdf";

/// Render a metadata record into a sanitized filename using a template with
/// `{author}`, `{title}`, `{year}`, `{journal}`, and `{publisher}`
/// placeholders.
pub fn render(record: &BibRecord, template: &str) -> String {
    let name = template
        .replace("{author}", &format_author(&record.authors))
        .replace("{title}", if record.title.is_empty() { "Untitled" } else { &record.title })
        .replace("{year}", &record.year)
        .replace("{journal}", &record.journal)
        .replace("{publisher}", &record.publisher);

    let mut name = sanitize(&name);
    name.push_str(EXTENSION);
    name
}

/// Format the author list for a filename: last name only for one author,
/// "Last1 & Last2" for two, "Last1 et al." for three or more.
pub fn format_author(authors: &[String]) -> String {
    let last_names: Vec<&str> = authors
        .iter()
        .map(|author| author.split(',').next().unwrap_or(author).trim())
        .collect();

    match last_names.as_slice() {
        [] => "Unknown".to_string(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} & {second}"),
        [first, ..] => format!("{first} et al."),
    }
}

/// Sanitize a filename stem: NFKD normalization, strip illegal characters,
/// collapse whitespace runs, trim, and truncate to `MAX_STEM_LEN` characters
/// breaking at the last space when truncation lands mid-word.
///
/// Idempotent: sanitizing an already-sanitized name is a no-op.
pub fn sanitize(name: &str) -> String {
    let normalized: String = name.nfkd().collect();
    let stripped: String = normalized
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(*c))
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= MAX_STEM_LEN {
        return collapsed;
    }

    let prefix: String = collapsed.chars().take(MAX_STEM_LEN).collect();
    match prefix.rfind(' ') {
        Some(cut) => prefix[..cut].to_string(),
        None => prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetadataSource;

    fn record(authors: &[&str], title: &str, year: &str) -> BibRecord {
        BibRecord {
            title: title.to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            year: year.to_string(),
            ..BibRecord::new(MetadataSource::Crossref, 1.0)
        }
    }

    #[test]
    fn test_single_author_last_name_only() {
        assert_eq!(format_author(&["Shannon, Claude E.".to_string()]), "Shannon");
    }

    #[test]
    fn test_two_authors_joined() {
        let authors = vec!["Cormen, Thomas".to_string(), "Leiserson, Charles".to_string()];
        assert_eq!(format_author(&authors), "Cormen & Leiserson");
    }

    #[test]
    fn test_three_authors_et_al() {
        let authors = vec![
            "Vaswani, Ashish".to_string(),
            "Shazeer, Noam".to_string(),
            "Parmar, Niki".to_string(),
        ];
        assert_eq!(format_author(&authors), "Vaswani et al.");
    }

    #[test]
    fn test_no_authors_unknown() {
        assert_eq!(format_author(&[]), "Unknown");
    }

    #[test]
    fn test_author_without_comma_used_whole() {
        assert_eq!(format_author(&["Ashish Vaswani".to_string()]), "Ashish Vaswani");
    }

    #[test]
    fn test_render_standard_template() {
        let name = render(
            &record(&["Shannon, Claude"], "A Mathematical Theory of Communication", "1948"),
            "{author} - {title} ({year})",
        );
        assert_eq!(name, "Shannon - A Mathematical Theory of Communication (1948).pdf");
    }

    #[test]
    fn test_render_empty_title_becomes_untitled() {
        let name = render(&record(&[], "", ""), "{title}");
        assert_eq!(name, "Untitled.pdf");
    }

    #[test]
    fn test_sanitize_strips_illegal_chars() {
        assert_eq!(sanitize("a<b>c:d\"e/f\\g|h?i*j"), "abcdefghij");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize("  a \t b \n  c  "), "a b c");
    }

    #[test]
    fn test_sanitize_truncates_at_word_boundary() {
        let long = "word ".repeat(60);
        let result = sanitize(&long);
        assert!(result.chars().count() <= MAX_STEM_LEN);
        assert!(!result.ends_with(' '));
        assert!(result.ends_with("word"));
    }

    #[test]
    fn test_sanitize_truncates_unbroken_run() {
        let long = "x".repeat(300);
        assert_eq!(sanitize(&long).chars().count(), MAX_STEM_LEN);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let cases = [
            "Ordinary Title",
            "  spaced   out  ",
            "ill<egal>/chars",
            "Ünïcode — compatibility ﬁgures",
            &"word ".repeat(80),
        ];
        for case in cases {
            let once = sanitize(case);
            let twice = sanitize(&once);
            assert_eq!(once, twice, "sanitize not idempotent for {case:?}");
        }
    }
}
