use super::traits::{
    title_overlap_confidence, BibProvider, LookupContext, LookupQuery, ProviderError,
};
use crate::client::{BibRecord, Doi, MetadataSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// CrossRef works API response for a single DOI
#[derive(Debug, Deserialize)]
struct CrossrefWorkResponse {
    message: CrossrefWork,
}

/// CrossRef works API response for a free-text search
#[derive(Debug, Deserialize)]
struct CrossrefSearchResponse {
    message: CrossrefSearchMessage,
}

#[derive(Debug, Deserialize)]
struct CrossrefSearchMessage {
    #[serde(default)]
    items: Vec<CrossrefWork>,
}

/// A CrossRef work item
#[derive(Debug, Deserialize, Default)]
struct CrossrefWork {
    #[serde(default)]
    author: Vec<CrossrefAuthor>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossrefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossrefDate>,
    created: Option<CrossrefDate>,
    #[serde(rename = "short-container-title", default)]
    short_container_title: Vec<String>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(default)]
    publisher: String,
    #[serde(rename = "DOI", default)]
    doi: String,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    #[serde(default)]
    family: String,
    #[serde(default)]
    given: String,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossrefDate {
    fn year(&self) -> Option<i64> {
        self.date_parts.first().and_then(|parts| parts.first()).copied().flatten()
    }
}

/// CrossRef provider: authoritative DOI lookups plus free-text title search
pub struct CrossrefProvider {
    client: Client,
    base_url: String,
}

impl CrossrefProvider {
    /// Create a new CrossRef provider
    pub fn new(user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(user_agent, "https://api.crossref.org")
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

    /// Convert a CrossRef work item into a `BibRecord`
    fn convert_work(work: CrossrefWork, confidence: f64) -> BibRecord {
        let authors: Vec<String> = work
            .author
            .into_iter()
            .filter(|a| !a.family.is_empty())
            .map(|a| {
                if a.given.is_empty() {
                    a.family
                } else {
                    format!("{}, {}", a.family, a.given)
                }
            })
            .collect();

        // CrossRef reports several publication dates; prefer print, then
        // online, then the record creation date
        let year = work
            .published_print
            .as_ref()
            .and_then(CrossrefDate::year)
            .or_else(|| work.published_online.as_ref().and_then(CrossrefDate::year))
            .or_else(|| work.created.as_ref().and_then(CrossrefDate::year))
            .map(|y| y.to_string())
            .unwrap_or_default();

        let journal = work
            .short_container_title
            .into_iter()
            .next()
            .or_else(|| work.container_title.into_iter().next())
            .unwrap_or_default();

        BibRecord {
            title: work.title.into_iter().next().unwrap_or_default(),
            authors,
            year,
            journal,
            publisher: work.publisher,
            doi: work.doi,
            source: MetadataSource::Crossref,
            confidence,
            zotero_key: None,
        }
    }

    async fn lookup_doi(
        &self,
        doi: &str,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError> {
        let doi = Doi::new(doi).map_err(|e| ProviderError::Other(e.to_string()))?;
        let url = format!("{}/works/{}", self.base_url, doi.url_encoded());
        debug!("CrossRef DOI lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(context.timeout)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().as_u16() == 404 {
            debug!("DOI not found in CrossRef: {}", doi);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "CrossRef returned HTTP {}",
                response.status()
            )));
        }

        let body: CrossrefWorkResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse CrossRef JSON: {e}")))?;

        Ok(Some(Self::convert_work(body.message, 1.0)))
    }

    async fn search_title(
        &self,
        title: &str,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError> {
        let url = format!("{}/works", self.base_url);
        debug!("CrossRef title search: {}", title);

        let response = self
            .client
            .get(&url)
            .query(&[("query.title", title), ("rows", "3")])
            .timeout(context.timeout)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "CrossRef returned HTTP {}",
                response.status()
            )));
        }

        let body: CrossrefSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse CrossRef JSON: {e}")))?;

        let Some(best) = body.message.items.into_iter().next() else {
            debug!("CrossRef title search returned no items");
            return Ok(None);
        };

        let mut record = Self::convert_work(best, 0.0);
        record.confidence = title_overlap_confidence(title, &record.title);
        debug!(
            "CrossRef best match '{}' with confidence {}",
            record.title, record.confidence
        );
        Ok(Some(record))
    }
}

pub(super) fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        warn!("Connection failed: {}", e);
        ProviderError::Network(format!("Connection failed: {e}"))
    } else {
        ProviderError::Network(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl BibProvider for CrossrefProvider {
    fn name(&self) -> &str {
        "crossref"
    }

    fn supports(&self, query: &LookupQuery) -> bool {
        matches!(query, LookupQuery::Doi(_) | LookupQuery::Title(_))
    }

    async fn lookup(
        &self,
        query: &LookupQuery,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError> {
        match query {
            LookupQuery::Doi(doi) => self.lookup_doi(doi, context).await,
            LookupQuery::Title(title) => self.search_title(title, context).await,
            LookupQuery::Isbn(_) => Ok(None),
        }
    }
}
