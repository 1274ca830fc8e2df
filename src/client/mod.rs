pub mod providers;
pub mod resolver;

pub use resolver::{Resolver, ResolverConfig};

use crate::Result;
use serde::{Deserialize, Serialize};

/// DOI (Digital Object Identifier) wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doi(String);

impl Doi {
    /// Create a new DOI from a string, validating the format
    pub fn new(doi: &str) -> Result<Self> {
        let cleaned = doi
            .trim()
            .trim_start_matches("doi:")
            .trim_start_matches("https://doi.org/");

        if cleaned.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "doi".to_string(),
                reason: "DOI cannot be empty".to_string(),
            });
        }

        if !cleaned.starts_with("10.") || !cleaned.contains('/') {
            return Err(crate::Error::InvalidInput {
                field: "doi".to_string(),
                reason: "DOI must start with '10.' and contain a '/'".to_string(),
            });
        }

        Ok(Self(cleaned.to_string()))
    }

    /// Get the DOI string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a URL-safe format
    #[must_use]
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).to_string()
    }
}

impl std::fmt::Display for Doi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Doi {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Which lookup service produced a metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    Crossref,
    SemanticScholar,
    OpenLibrary,
    GoogleBooks,
    Zotero,
    /// No provider matched; the record carries only a best-effort title
    ManualReview,
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Crossref => "crossref",
            Self::SemanticScholar => "semantic_scholar",
            Self::OpenLibrary => "open_library",
            Self::GoogleBooks => "google_books",
            Self::Zotero => "zotero",
            Self::ManualReview => "manual_review",
        };
        write!(f, "{name}")
    }
}

/// Normalized bibliographic record, the single output of the resolution
/// waterfall for one document.
///
/// `confidence` is a design-assigned heuristic weight in `[0.0, 1.0]`, not a
/// probability: exact-identifier matches are 1.0, free-text matches carry the
/// provider's fixed or computed score, and `manual_review` records are 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibRecord {
    pub title: String,
    /// Authors in "Family, Given" order
    pub authors: Vec<String>,
    /// Publication year as a string; empty when unknown
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub doi: String,
    pub source: MetadataSource,
    pub confidence: f64,
    /// Zotero item key, present only on records from the personal library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zotero_key: Option<String>,
}

impl BibRecord {
    /// Create an empty record attributed to a source
    #[must_use]
    pub fn new(source: MetadataSource, confidence: f64) -> Self {
        Self {
            title: String::new(),
            authors: Vec::new(),
            year: String::new(),
            journal: String::new(),
            publisher: String::new(),
            doi: String::new(),
            source,
            confidence,
            zotero_key: None,
        }
    }

    /// Synthesize the terminal fallback record for a document nothing
    /// matched. `title` is the extracted title guess or, failing that, the
    /// file's base name without extension.
    #[must_use]
    pub fn manual_review(title: String, doi: String) -> Self {
        Self {
            title,
            doi,
            ..Self::new(MetadataSource::ManualReview, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doi_parsing() {
        let doi = Doi::new("10.1038/nature12373").unwrap();
        assert_eq!(doi.as_str(), "10.1038/nature12373");

        let prefixed = Doi::new("https://doi.org/10.1038/nature12373").unwrap();
        assert_eq!(prefixed, doi);

        assert!(Doi::new("").is_err());
        assert!(Doi::new("not-a-doi").is_err());
        assert!(Doi::new("10.1038nature").is_err());
    }

    #[test]
    fn test_doi_url_encoding() {
        let doi = Doi::new("10.1000/a<b>c").unwrap();
        assert!(!doi.url_encoded().contains('<'));
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&MetadataSource::SemanticScholar).unwrap();
        assert_eq!(json, "\"semantic_scholar\"");
        let back: MetadataSource = serde_json::from_str("\"manual_review\"").unwrap();
        assert_eq!(back, MetadataSource::ManualReview);
    }

    #[test]
    fn test_manual_review_record() {
        let record = BibRecord::manual_review("raw_scan".to_string(), String::new());
        assert_eq!(record.source, MetadataSource::ManualReview);
        assert_eq!(record.confidence, 0.0);
        assert_eq!(record.title, "raw_scan");
        assert!(record.authors.is_empty());
    }
}
