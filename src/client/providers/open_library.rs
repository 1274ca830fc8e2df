use super::crossref::map_reqwest_error;
use super::traits::{BibProvider, LookupContext, LookupQuery, ProviderError};
use crate::client::{BibRecord, MetadataSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Fixed confidence for Open Library ISBN hits. ISBN lookups are exact-key
/// lookups, so the value reflects catalog quality rather than match quality.
const OPEN_LIBRARY_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<NamedEntity>,
    #[serde(default)]
    publishers: Vec<NamedEntity>,
    #[serde(default)]
    publish_date: String,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    #[serde(default)]
    name: String,
}

/// Open Library books API provider for ISBN lookups
pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
}

impl OpenLibraryProvider {
    pub fn new(user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(user_agent, "https://openlibrary.org")
    }

    /// Create a provider against a non-default endpoint (used in tests)
    pub fn with_base_url(user_agent: &str, base_url: &str) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn convert_book(book: OpenLibraryBook) -> BibRecord {
        // publish_date varies wildly ("2004", "May 1, 2004", non-Latin
        // dates); the year is reliably the last four characters when present
        let date_chars = book.publish_date.chars().count();
        let year: String = if date_chars >= 4 {
            book.publish_date.chars().skip(date_chars - 4).collect()
        } else {
            String::new()
        };

        BibRecord {
            title: book.title,
            authors: book
                .authors
                .into_iter()
                .map(|a| a.name)
                .filter(|name| !name.is_empty())
                .collect(),
            year,
            journal: String::new(),
            publisher: book
                .publishers
                .into_iter()
                .next()
                .map(|p| p.name)
                .unwrap_or_default(),
            doi: String::new(),
            source: MetadataSource::OpenLibrary,
            confidence: OPEN_LIBRARY_CONFIDENCE,
            zotero_key: None,
        }
    }
}

#[async_trait]
impl BibProvider for OpenLibraryProvider {
    fn name(&self) -> &str {
        "open_library"
    }

    fn supports(&self, query: &LookupQuery) -> bool {
        matches!(query, LookupQuery::Isbn(_))
    }

    async fn lookup(
        &self,
        query: &LookupQuery,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError> {
        let LookupQuery::Isbn(isbn) = query else {
            return Ok(None);
        };

        let bibkey = format!("ISBN:{isbn}");
        let url = format!("{}/api/books", self.base_url);
        debug!("Open Library ISBN lookup: {}", bibkey);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .timeout(context.timeout)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Open Library returned HTTP {}",
                response.status()
            )));
        }

        // The response is a map keyed by the requested bibkey; an unknown
        // ISBN yields an empty object rather than a 404
        let mut body: HashMap<String, OpenLibraryBook> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse Open Library JSON: {e}")))?;

        Ok(body.remove(&bibkey).map(Self::convert_book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_book() {
        let json = r#"{
            "ISBN:9780262046305": {
                "title": "Introduction to Algorithms",
                "authors": [{"name": "Thomas H. Cormen"}, {"name": "Charles E. Leiserson"}],
                "publishers": [{"name": "MIT Press"}],
                "publish_date": "April 5, 2022"
            }
        }"#;
        let mut parsed: HashMap<String, OpenLibraryBook> = serde_json::from_str(json).unwrap();
        let record =
            OpenLibraryProvider::convert_book(parsed.remove("ISBN:9780262046305").unwrap());

        assert_eq!(record.title, "Introduction to Algorithms");
        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.year, "2022");
        assert_eq!(record.publisher, "MIT Press");
        assert_eq!(record.source, MetadataSource::OpenLibrary);
        assert_eq!(record.confidence, OPEN_LIBRARY_CONFIDENCE);
    }

    #[test]
    fn test_multibyte_publish_date() {
        // Non-Latin catalog dates must not split a character mid-way
        let json = r#"{"title": "T", "publish_date": "20日本"}"#;
        let book: OpenLibraryBook = serde_json::from_str(json).unwrap();
        let record = OpenLibraryProvider::convert_book(book);
        assert_eq!(record.year, "20日本");

        let json = r#"{"title": "T", "publish_date": "平成16年3月"}"#;
        let book: OpenLibraryBook = serde_json::from_str(json).unwrap();
        let record = OpenLibraryProvider::convert_book(book);
        assert_eq!(record.year, "6年3月");
    }

    #[test]
    fn test_short_publish_date() {
        let json = r#"{"title": "T", "publish_date": "99"}"#;
        let book: OpenLibraryBook = serde_json::from_str(json).unwrap();
        let record = OpenLibraryProvider::convert_book(book);
        assert_eq!(record.year, "");
    }

    #[test]
    fn test_unknown_isbn_is_empty_map() {
        let parsed: HashMap<String, OpenLibraryBook> = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
