use pdf_shelf::client::providers::title_overlap_confidence;
use pdf_shelf::extract::clean_doi;
use pdf_shelf::rename::filename::{format_author, sanitize};
use proptest::prelude::*;

mod doi_cleaning_props {
    use super::*;

    proptest! {
        #[test]
        fn test_clean_doi_idempotent(doi in r"10\.\d{4,9}/[a-zA-Z0-9._/-]{1,40}[.,;:)\]}]{0,4}") {
            let once = clean_doi(&doi);
            let twice = clean_doi(once);
            prop_assert_eq!(once, twice, "DOI cleaning should be idempotent");
        }

        #[test]
        fn test_clean_doi_never_ends_in_punctuation(doi in r"10\.\d{4}/[a-z0-9]{1,20}[.,;:)\]}]{0,4}") {
            let punctuation = ".,;:\"'>)}]";
            let cleaned = clean_doi(&doi);
            if let Some(last) = cleaned.chars().last() {
                prop_assert!(!punctuation.contains(last));
            }
        }

        #[test]
        fn test_clean_doi_is_prefix(doi in r"[\x20-\x7e]{0,60}") {
            prop_assert!(doi.starts_with(clean_doi(&doi)));
        }
    }

    #[test]
    fn test_clean_doi_examples() {
        assert_eq!(clean_doi("10.1/abc."), "10.1/abc");
        assert_eq!(clean_doi("10.1/abc\"')"), "10.1/abc");
    }
}

mod sanitizer_props {
    use super::*;

    proptest! {
        #[test]
        fn test_sanitize_idempotent(name in ".{0,400}") {
            let once = sanitize(&name);
            let twice = sanitize(&once);
            prop_assert_eq!(once, twice, "sanitize should be idempotent");
        }

        #[test]
        fn test_sanitize_strips_illegal_characters(name in ".{0,200}") {
            let sanitized = sanitize(&name);
            for illegal in "<>:\"/\\|?*".chars() {
                prop_assert!(!sanitized.contains(illegal), "found {:?} in {:?}", illegal, sanitized);
            }
        }

        #[test]
        fn test_sanitize_bounded_length(name in ".{0,500}") {
            prop_assert!(sanitize(&name).chars().count() <= 200);
        }

        #[test]
        fn test_sanitize_no_leading_or_trailing_space(name in ".{0,200}") {
            let sanitized = sanitize(&name);
            prop_assert_eq!(sanitized.trim(), sanitized.as_str());
        }

        #[test]
        fn test_sanitize_no_whitespace_runs(name in ".{0,200}") {
            prop_assert!(!sanitize(&name).contains("  "));
        }
    }
}

mod author_format_props {
    use super::*;

    proptest! {
        #[test]
        fn test_three_plus_authors_et_al(count in 3usize..10) {
            let authors: Vec<String> = (0..count).map(|i| format!("Family{i}, Given{i}")).collect();
            prop_assert_eq!(format_author(&authors), "Family0 et al.");
        }
    }

    #[test]
    fn test_empty_author_list() {
        assert_eq!(format_author(&[]), "Unknown");
    }
}

mod overlap_props {
    use super::*;

    proptest! {
        #[test]
        fn test_overlap_in_unit_range(query in r"[a-z ]{1,60}", result in r"[a-z ]{1,60}") {
            let score = title_overlap_confidence(&query, &result);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn test_identical_titles_score_one(title in r"[a-z]{1,10}( [a-z]{1,10}){0,5}") {
            let score = title_overlap_confidence(&title, &title);
            prop_assert!((score - 1.0).abs() < f64::EPSILON);
        }
    }
}
