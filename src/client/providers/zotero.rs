use super::crossref::map_reqwest_error;
use super::traits::{BibProvider, LookupContext, LookupQuery, ProviderError};
use crate::client::{BibRecord, MetadataSource};
use crate::config::ZoteroConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed confidence for Zotero matches: results come from the user's own
/// curated collection, so a hit is very likely the right item.
const ZOTERO_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Deserialize)]
struct ZoteroItem {
    #[serde(default)]
    key: String,
    #[serde(default)]
    version: u64,
    data: ZoteroItemData,
}

#[derive(Debug, Deserialize, Default)]
struct ZoteroItemData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    creators: Vec<ZoteroCreator>,
    #[serde(default)]
    date: String,
    #[serde(rename = "publicationTitle", default)]
    publication_title: String,
    #[serde(rename = "journalAbbreviation", default)]
    journal_abbreviation: String,
    #[serde(default)]
    publisher: String,
    #[serde(rename = "DOI", default)]
    doi: String,
    #[serde(rename = "itemType", default)]
    item_type: String,
    #[serde(rename = "contentType", default)]
    content_type: String,
}

#[derive(Debug, Deserialize)]
struct ZoteroCreator {
    #[serde(rename = "lastName", default)]
    last_name: String,
    #[serde(rename = "firstName", default)]
    first_name: String,
}

/// Zotero web API provider for searching a personal library.
///
/// Requires an API key and library id; without them every lookup is an
/// immediate no-match and no network call is made.
pub struct ZoteroProvider {
    client: Client,
    base_url: String,
    credentials: ZoteroConfig,
}

impl ZoteroProvider {
    pub fn new(credentials: ZoteroConfig, user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(credentials, user_agent, "https://api.zotero.org")
    }

    /// Create a provider against a non-default endpoint (used in tests)
    pub fn with_base_url(
        credentials: ZoteroConfig,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn library_url(&self) -> String {
        format!(
            "{}/{}s/{}",
            self.base_url, self.credentials.library_type, self.credentials.library_id
        )
    }

    fn convert_item(item: ZoteroItem) -> BibRecord {
        let authors: Vec<String> = item
            .data
            .creators
            .into_iter()
            .filter(|c| !c.last_name.is_empty())
            .map(|c| {
                if c.first_name.is_empty() {
                    c.last_name
                } else {
                    format!("{}, {}", c.last_name, c.first_name)
                }
            })
            .collect();

        let journal = if item.data.publication_title.is_empty() {
            item.data.journal_abbreviation
        } else {
            item.data.publication_title
        };

        BibRecord {
            title: item.data.title,
            authors,
            year: item.data.date.chars().take(4).collect(),
            journal,
            publisher: item.data.publisher,
            doi: item.data.doi,
            source: MetadataSource::Zotero,
            confidence: ZOTERO_CONFIDENCE,
            zotero_key: Some(item.key),
        }
    }

    /// Rename the PDF attachment of a library item to match the new local
    /// filename. Best effort: the caller records the boolean outcome and
    /// never fails the local rename over it.
    pub async fn update_attachment(
        &self,
        item_key: &str,
        new_filename: &str,
        context: &LookupContext,
    ) -> Result<bool, ProviderError> {
        if !self.credentials.configured() {
            return Ok(false);
        }

        let children_url = format!("{}/items/{}/children", self.library_url(), item_key);
        let response = self
            .client
            .get(&children_url)
            .timeout(context.timeout)
            .header("Zotero-API-Key", &self.credentials.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Zotero returned HTTP {}",
                response.status()
            )));
        }

        let children: Vec<ZoteroItem> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse Zotero JSON: {e}")))?;

        for child in children {
            if child.data.item_type != "attachment" || child.data.content_type != "application/pdf"
            {
                continue;
            }

            debug!("Updating Zotero attachment {} -> {}", child.key, new_filename);
            let patch_url = format!("{}/items/{}", self.library_url(), child.key);
            let patch = self
                .client
                .patch(&patch_url)
                .timeout(context.timeout)
                .header("Zotero-API-Key", &self.credentials.api_key)
                .header("If-Unmodified-Since-Version", child.version.to_string())
                .json(&json!({ "title": new_filename, "filename": new_filename }))
                .send()
                .await
                .map_err(map_reqwest_error)?;

            return Ok(patch.status().is_success());
        }

        debug!("No PDF attachment found under Zotero item {}", item_key);
        Ok(false)
    }
}

#[async_trait]
impl BibProvider for ZoteroProvider {
    fn name(&self) -> &str {
        "zotero"
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

        // Absent credentials mean "feature unavailable", not an error
        if !self.credentials.configured() {
            debug!("Zotero credentials not configured, skipping lookup");
            return Ok(None);
        }

        let url = format!("{}/items", self.library_url());
        debug!("Zotero library search: {}", title);

        let response = self
            .client
            .get(&url)
            .query(&[("q", title.as_str()), ("limit", "3"), ("format", "json")])
            .timeout(context.timeout)
            .header("Zotero-API-Key", &self.credentials.api_key)
            .header("User-Agent", &context.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().as_u16() == 403 {
            warn!("Zotero rejected the configured API key");
            return Err(ProviderError::Auth("Zotero API key rejected".to_string()));
        }
        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Zotero returned HTTP {}",
                response.status()
            )));
        }

        let items: Vec<ZoteroItem> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse Zotero JSON: {e}")))?;

        Ok(items.into_iter().next().map(Self::convert_item))
    }
}
