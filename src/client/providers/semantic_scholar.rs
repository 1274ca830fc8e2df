use super::crossref::map_reqwest_error;
use super::traits::{BibProvider, LookupContext, LookupQuery, ProviderError};
use crate::client::{BibRecord, MetadataSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Fixed confidence for Semantic Scholar results: a lower-precision catalog
/// consulted only after higher-precision providers are exhausted.
const SEMANTIC_SCHOLAR_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<Author>,
    year: Option<i64>,
    #[serde(default)]
    venue: String,
    #[serde(rename = "externalIds")]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI", default)]
    doi: String,
}

/// Semantic Scholar graph API provider for free-text title search
pub struct SemanticScholarProvider {
    client: Client,
    base_url: String,
}

impl SemanticScholarProvider {
    pub fn new(user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(user_agent, "https://api.semanticscholar.org/graph/v1")
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

    fn convert_paper(paper: Paper) -> BibRecord {
        let authors: Vec<String> = paper
            .authors
            .into_iter()
            .map(|a| a.name)
            .filter(|name| !name.is_empty())
            .collect();

        BibRecord {
            title: paper.title,
            authors,
            year: paper.year.map(|y| y.to_string()).unwrap_or_default(),
            journal: paper.venue,
            publisher: String::new(),
            doi: paper.external_ids.map(|ids| ids.doi).unwrap_or_default(),
            source: MetadataSource::SemanticScholar,
            confidence: SEMANTIC_SCHOLAR_CONFIDENCE,
            zotero_key: None,
        }
    }
}

#[async_trait]
impl BibProvider for SemanticScholarProvider {
    fn name(&self) -> &str {
        "semantic_scholar"
    }

    fn supports(&self, query: &LookupQuery) -> bool {
        matches!(query, LookupQuery::Title(_))
    }

    async fn lookup(
        &self,
        query: &LookupQuery,
        context: &LookupContext,
    ) -> Result<Option<BibRecord>, ProviderError> {
        let LookupQuery::Title(title) = query else {
            return Ok(None);
        };

        let url = format!("{}/paper/search", self.base_url);
        debug!("Semantic Scholar search: {}", title);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", title.as_str()),
                ("limit", "3"),
                ("fields", "title,authors,year,venue,externalIds"),
            ])
            .timeout(context.timeout)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Semantic Scholar returned HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            ProviderError::Parse(format!("Failed to parse Semantic Scholar JSON: {e}"))
        })?;

        Ok(body.data.into_iter().next().map(Self::convert_paper))
    }
}
