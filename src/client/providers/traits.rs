use crate::client::BibRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A single lookup request against a bibliographic source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// Exact lookup by Digital Object Identifier
    Doi(String),
    /// Exact-key lookup by ISBN (hyphens and spaces already stripped)
    Isbn(String),
    /// Free-text search by title guess
    Title(String),
}

impl LookupQuery {
    /// The query payload, regardless of kind
    pub fn value(&self) -> &str {
        match self {
            Self::Doi(v) | Self::Isbn(v) | Self::Title(v) => v,
        }
    }
}

/// Context shared by all lookups in one resolution run
#[derive(Debug, Clone)]
pub struct LookupContext {
    /// Timeout applied to each provider request
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for LookupContext {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!(
                "pdf-shelf/{} (https://github.com/Ladvien/pdf_shelf)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

/// Errors that can occur during provider lookups.
///
/// The resolution waterfall treats every variant identically to a no-match:
/// these exist so logs can say why a provider was skipped, never to abort a
/// resolution run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Provider error: {0}")]
    Other(String),
}

/// Trait for bibliographic lookup providers.
///
/// `lookup` returns `Ok(None)` when the source has no match for the query.
/// Transport failures, non-success responses, and malformed payloads map to
/// `ProviderError`; the caller coalesces both outcomes.
#[async_trait]
pub trait BibProvider: Send + Sync {
    /// Unique name/identifier for this provider
    fn name(&self) -> &str;

    /// Which query kinds this provider can answer
    fn supports(&self, query: &LookupQuery) -> bool;

    /// Look up bibliographic metadata for a query
    async fn lookup(
        &self,
        query: &LookupQuery,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError>;
}

/// Word-level set overlap between a query title and a result title,
/// case-insensitive: |query words ∩ result words| / |query words|.
/// Used as the confidence score for free-text title searches.
pub fn title_overlap_confidence(query: &str, result: &str) -> f64 {
    let query_words: std::collections::HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let result_words: std::collections::HashSet<String> = result
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let overlap = query_words.intersection(&result_words).count();
    let ratio = overlap as f64 / query_words.len() as f64;
    (ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_full_match() {
        let score = title_overlap_confidence("Deep Learning", "Deep Learning");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap_case_insensitive() {
        let score = title_overlap_confidence("DEEP learning", "deep LEARNING methods");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap_partial() {
        // 2 of 4 query words present in the result
        let score = title_overlap_confidence("a survey of things", "a review of stuff");
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap_is_word_level_not_substring() {
        // "learn" is a substring of "learning" but not a word match
        let score = title_overlap_confidence("learn", "learning");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_overlap_empty_query() {
        assert_eq!(title_overlap_confidence("", "anything"), 0.0);
    }
}
