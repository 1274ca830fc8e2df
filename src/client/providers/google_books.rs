use super::crossref::map_reqwest_error;
use super::traits::{BibProvider, LookupContext, LookupQuery, ProviderError};
use crate::client::{BibRecord, MetadataSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Fixed confidence for Google Books ISBN hits, slightly below Open Library
/// since it is the second stage of the ISBN chain.
const GOOGLE_BOOKS_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize, Default)]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(rename = "publishedDate", default)]
    published_date: String,
    #[serde(default)]
    publisher: String,
}

/// Google Books volumes API provider, second stage of the ISBN chain
pub struct GoogleBooksProvider {
    client: Client,
    base_url: String,
}

impl GoogleBooksProvider {
    pub fn new(user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(user_agent, "https://www.googleapis.com/books/v1")
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

    fn convert_volume(info: VolumeInfo) -> BibRecord {
        // publishedDate is "YYYY" or "YYYY-MM-DD"
        let year = info.published_date.chars().take(4).collect::<String>();
        let year = if year.chars().all(|c| c.is_ascii_digit()) && year.len() == 4 {
            year
        } else {
            String::new()
        };

        BibRecord {
            title: info.title,
            authors: info.authors,
            year,
            journal: String::new(),
            publisher: info.publisher,
            doi: String::new(),
            source: MetadataSource::GoogleBooks,
            confidence: GOOGLE_BOOKS_CONFIDENCE,
            zotero_key: None,
        }
    }
}

#[async_trait]
impl BibProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "google_books"
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

        let url = format!("{}/volumes", self.base_url);
        debug!("Google Books ISBN lookup: {}", isbn);

        let response = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{isbn}"))])
            .timeout(context.timeout)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Google Books returned HTTP {}",
                response.status()
            )));
        }

        let body: VolumesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse Google Books JSON: {e}")))?;

        Ok(body
            .items
            .into_iter()
            .next()
            .and_then(|v| v.volume_info)
            .map(Self::convert_volume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_volume() {
        let json = r#"{
            "items": [{
                "volumeInfo": {
                    "title": "The Rust Programming Language",
                    "authors": ["Steve Klabnik", "Carol Nichols"],
                    "publishedDate": "2019-08-12",
                    "publisher": "No Starch Press"
                }
            }]
        }"#;
        let parsed: VolumesResponse = serde_json::from_str(json).unwrap();
        let info = parsed.items.into_iter().next().unwrap().volume_info.unwrap();
        let record = GoogleBooksProvider::convert_volume(info);

        assert_eq!(record.title, "The Rust Programming Language");
        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.year, "2019");
        assert_eq!(record.publisher, "No Starch Press");
        assert_eq!(record.source, MetadataSource::GoogleBooks);
        assert_eq!(record.confidence, GOOGLE_BOOKS_CONFIDENCE);
    }

    #[test]
    fn test_garbled_published_date() {
        let info = VolumeInfo {
            published_date: "n.d.".to_string(),
            ..VolumeInfo::default()
        };
        let record = GoogleBooksProvider::convert_volume(info);
        assert_eq!(record.year, "");
    }

    #[test]
    fn test_no_items() {
        let parsed: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert!(parsed.items.is_empty());
    }
}
