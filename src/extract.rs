use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Maximum characters of extracted text retained on the document info
pub const TEXT_SNIPPET_LIMIT: usize = 3000;

/// Maximum characters kept from a title-guess line
const TITLE_GUESS_LIMIT: usize = 200;

/// Metadata fields checked for an embedded DOI, in order
const DOI_METADATA_FIELDS: &[&str] = &["subject", "keywords", "doi"];

/// Identifiers extracted from one document. Immutable once produced;
/// absence of any identifier is a normal state, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub doi: Option<String>,
    /// ISBN with hyphens and spaces stripped
    pub isbn: Option<String>,
    pub title_guess: Option<String>,
    /// First pages of extracted text, capped at `TEXT_SNIPPET_LIMIT` chars
    pub text_snippet: String,
}

/// Derives a DOI, ISBN, and title guess from document metadata fields and
/// raw text supplied by the document reader.
pub struct IdentifierExtractor {
    doi_pattern: Regex,
    isbn_pattern: Regex,
}

impl IdentifierExtractor {
    pub fn new() -> Self {
        Self {
            doi_pattern: Regex::new(r#"(?i)10\.\d{4,9}/[^\s,;"'\]}>]+"#)
                .expect("DOI pattern is valid"),
            isbn_pattern: Regex::new(r"(?i)(?:ISBN[-:]?\s*)?((?:97[89][-\s]?)?(?:\d[-\s]?){9}[\dX])")
                .expect("ISBN pattern is valid"),
        }
    }

    /// Extract identifiers from metadata fields (keys lowercased by the
    /// reader), document text, and the file's base name. Identifier search
    /// covers the full supplied text; only the retained snippet is capped.
    pub fn extract(
        &self,
        metadata: &HashMap<String, String>,
        text: &str,
        file_name: &str,
    ) -> DocumentInfo {
        let doi = self.extract_doi(metadata, text, file_name);
        let isbn = self.extract_isbn(text);
        let title_guess = self.guess_title(text);
        let snippet: String = text.chars().take(TEXT_SNIPPET_LIMIT).collect();

        debug!(?doi, ?isbn, ?title_guess, "Extracted identifiers");
        DocumentInfo {
            doi,
            isbn,
            title_guess,
            text_snippet: snippet,
        }
    }

    /// Search order: metadata fields, then text, then the filename.
    /// First match wins.
    fn extract_doi(
        &self,
        metadata: &HashMap<String, String>,
        text: &str,
        file_name: &str,
    ) -> Option<String> {
        for field in DOI_METADATA_FIELDS {
            if let Some(value) = metadata.get(*field) {
                if let Some(m) = self.doi_pattern.find(value) {
                    return Some(clean_doi(m.as_str()).to_string());
                }
            }
        }

        if let Some(m) = self.doi_pattern.find(text) {
            return Some(clean_doi(m.as_str()).to_string());
        }

        self.doi_pattern
            .find(file_name)
            .map(|m| clean_doi(m.as_str()).to_string())
    }

    fn extract_isbn(&self, text: &str) -> Option<String> {
        self.isbn_pattern.captures(text).map(|caps| {
            caps[1]
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect()
        })
    }

    /// The title is often the first long-ish line of the first page: take
    /// the first of the leading ten non-blank lines that is longer than ten
    /// characters, is not itself a DOI, and is not a URL.
    fn guess_title(&self, text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(10)
            .find(|line| {
                line.chars().count() > 10
                    && !self.doi_pattern.is_match(line)
                    && !line.starts_with("http")
            })
            .map(|line| line.chars().take(TITLE_GUESS_LIMIT).collect())
    }
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip trailing punctuation from a matched DOI. The DOI pattern is greedy
/// and picks up sentence punctuation and closing brackets around citations.
pub fn clean_doi(doi: &str) -> &str {
    doi.trim_end_matches(|c| ".,;:\"'>)}]".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_clean_doi_strips_trailing_punctuation() {
        assert_eq!(clean_doi("10.1/abc."), "10.1/abc");
        assert_eq!(clean_doi("10.1/abc.,;:"), "10.1/abc");
        assert_eq!(clean_doi("10.1/abc)]"), "10.1/abc");
        assert_eq!(clean_doi("10.1/abc"), "10.1/abc");
    }

    #[test]
    fn test_doi_from_metadata_field_wins() {
        let extractor = IdentifierExtractor::new();
        let meta = fields(&[("subject", "doi:10.1038/nature12373.")]);
        let info = extractor.extract(&meta, "Text mentioning 10.9999/other", "file.pdf");
        assert_eq!(info.doi.as_deref(), Some("10.1038/nature12373"));
    }

    #[test]
    fn test_doi_from_text() {
        let extractor = IdentifierExtractor::new();
        let info = extractor.extract(
            &HashMap::new(),
            "See https://doi.org/10.1002/j.1538-7305.1948.tb01338.x, for details",
            "file.pdf",
        );
        assert_eq!(
            info.doi.as_deref(),
            Some("10.1002/j.1538-7305.1948.tb01338.x")
        );
    }

    #[test]
    fn test_doi_from_filename_as_last_resort() {
        let extractor = IdentifierExtractor::new();
        let info = extractor.extract(&HashMap::new(), "no identifiers here", "10.1234_5678.pdf");
        // The '/' is not present in filenames; this one should not match
        assert_eq!(info.doi, None);

        let info = extractor.extract(&HashMap::new(), "", "paper 10.1234/abcd.pdf");
        assert_eq!(info.doi.as_deref(), Some("10.1234/abcd.pdf"));
    }

    #[test]
    fn test_isbn_with_label_and_hyphens() {
        let extractor = IdentifierExtractor::new();
        let info = extractor.extract(
            &HashMap::new(),
            "Published 2022. ISBN: 978-0-262-04630-5",
            "f.pdf",
        );
        assert_eq!(info.isbn.as_deref(), Some("9780262046305"));
    }

    #[test]
    fn test_isbn_ten_digit_with_check_x() {
        let extractor = IdentifierExtractor::new();
        let info = extractor.extract(&HashMap::new(), "ISBN 0-8044-2957-X", "f.pdf");
        assert_eq!(info.isbn.as_deref(), Some("080442957X"));
    }

    #[test]
    fn test_title_guess_skips_short_lines_and_urls() {
        let extractor = IdentifierExtractor::new();
        let text = "\n  Vol. 3  \nhttp://example.com/paper\nA Longer Candidate Title Line\nbody text follows";
        let info = extractor.extract(&HashMap::new(), text, "f.pdf");
        assert_eq!(info.title_guess.as_deref(), Some("A Longer Candidate Title Line"));
    }

    #[test]
    fn test_title_guess_skips_doi_lines() {
        let extractor = IdentifierExtractor::new();
        let text = "doi: 10.1038/nature12373\nThe Actual Title of the Paper\n";
        let info = extractor.extract(&HashMap::new(), text, "f.pdf");
        assert_eq!(
            info.title_guess.as_deref(),
            Some("The Actual Title of the Paper")
        );
    }

    #[test]
    fn test_title_guess_only_first_ten_lines() {
        let extractor = IdentifierExtractor::new();
        let mut text = "short\n".repeat(10);
        text.push_str("A Perfectly Good Title Too Far Down\n");
        let info = extractor.extract(&HashMap::new(), &text, "f.pdf");
        assert_eq!(info.title_guess, None);
    }

    #[test]
    fn test_title_guess_truncated_to_200_chars() {
        let extractor = IdentifierExtractor::new();
        let long_line = "word ".repeat(100);
        let info = extractor.extract(&HashMap::new(), &long_line, "f.pdf");
        assert_eq!(info.title_guess.map(|t| t.chars().count()), Some(200));
    }

    #[test]
    fn test_text_snippet_capped() {
        let extractor = IdentifierExtractor::new();
        let text = "x".repeat(5000);
        let info = extractor.extract(&HashMap::new(), &text, "f.pdf");
        assert_eq!(info.text_snippet.len(), TEXT_SNIPPET_LIMIT);
    }

    #[test]
    fn test_identifiers_found_beyond_snippet_cap() {
        let extractor = IdentifierExtractor::new();
        let mut text = "filler ".repeat(600);
        text.push_str("\ncited as 10.1038/nature12373, ISBN 978-0-262-04630-5\n");
        let info = extractor.extract(&HashMap::new(), &text, "f.pdf");

        assert_eq!(info.doi.as_deref(), Some("10.1038/nature12373"));
        assert_eq!(info.isbn.as_deref(), Some("9780262046305"));
        assert_eq!(info.text_snippet.chars().count(), TEXT_SNIPPET_LIMIT);
    }

    #[test]
    fn test_no_identifiers_is_normal() {
        let extractor = IdentifierExtractor::new();
        let info = extractor.extract(&HashMap::new(), "", "raw_scan.pdf");
        assert_eq!(info.doi, None);
        assert_eq!(info.isbn, None);
        assert_eq!(info.title_guess, None);
    }
}
