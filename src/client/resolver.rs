use crate::client::providers::{
    BibProvider, CrossrefProvider, GoogleBooksProvider, LookupContext, LookupQuery,
    OpenLibraryProvider, ProviderError, SemanticScholarProvider, ZoteroProvider,
};
use crate::client::BibRecord;
use crate::config::Config;
use crate::extract::DocumentInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Which identifier from the document a waterfall step consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Doi,
    Isbn,
    Title,
}

/// One step of the resolution waterfall
pub struct WaterfallStep {
    pub kind: QueryKind,
    pub provider: Arc<dyn BibProvider>,
    /// Minimum confidence required to accept this step's result; results
    /// below the bar fall through to the next step
    pub min_confidence: f64,
}

/// Tuning knobs for the waterfall
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Hard bound on each provider call; a timeout is a no-match
    pub provider_timeout: Duration,
    /// Acceptance threshold for the primary free-text title search
    pub title_min_confidence: f64,
    /// User agent sent with every lookup
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            title_min_confidence: 0.5,
            user_agent: LookupContext::default().user_agent,
        }
    }
}

/// The metadata resolution waterfall.
///
/// Runs an ordered sequence of provider lookups against the identifiers
/// extracted from one document and produces exactly one `BibRecord` - a
/// provider hit or, when every step misses, a `manual_review` record.
/// The step order is fixed by design (cheapest and most authoritative
/// first); provider failures and timeouts are absorbed as no-matches so the
/// waterfall always completes.
pub struct Resolver {
    steps: Vec<WaterfallStep>,
    config: ResolverConfig,
}

impl Resolver {
    /// Build the standard waterfall from application configuration:
    /// CrossRef by DOI, Open Library then Google Books by ISBN, CrossRef by
    /// title (thresholded), Semantic Scholar, and finally Zotero.
    pub fn new(app_config: &Config) -> Result<Self, ProviderError> {
        let user_agent = app_config.providers.user_agent.clone();
        let crossref = Arc::new(CrossrefProvider::new(&user_agent)?);

        let resolver_config = ResolverConfig {
            provider_timeout: app_config.provider_timeout(),
            user_agent,
            ..ResolverConfig::default()
        };

        let steps = vec![
            WaterfallStep {
                kind: QueryKind::Doi,
                provider: crossref.clone(),
                min_confidence: 0.0,
            },
            WaterfallStep {
                kind: QueryKind::Isbn,
                provider: Arc::new(OpenLibraryProvider::new(
                    &resolver_config.user_agent,
                )?),
                min_confidence: 0.0,
            },
            WaterfallStep {
                kind: QueryKind::Isbn,
                provider: Arc::new(GoogleBooksProvider::new(
                    &resolver_config.user_agent,
                )?),
                min_confidence: 0.0,
            },
            WaterfallStep {
                kind: QueryKind::Title,
                provider: crossref,
                min_confidence: resolver_config.title_min_confidence,
            },
            WaterfallStep {
                kind: QueryKind::Title,
                provider: Arc::new(SemanticScholarProvider::new(
                    &resolver_config.user_agent,
                )?),
                min_confidence: 0.0,
            },
            WaterfallStep {
                kind: QueryKind::Title,
                provider: Arc::new(ZoteroProvider::new(
                    app_config.zotero.clone(),
                    &resolver_config.user_agent,
                )?),
                min_confidence: 0.0,
            },
        ];

        Ok(Self::with_steps(steps, resolver_config))
    }

    /// Build a waterfall from an explicit step list (used in tests)
    pub fn with_steps(steps: Vec<WaterfallStep>, config: ResolverConfig) -> Self {
        Self { steps, config }
    }

    /// Resolve one document's extracted identifiers to a metadata record.
    ///
    /// `fallback_title` is the document's base filename without extension,
    /// used for the `manual_review` record when no title was extracted.
    /// Never fails and never returns "no result".
    pub async fn resolve(&self, document: &DocumentInfo, fallback_title: &str) -> BibRecord {
        let context = LookupContext {
            timeout: self.config.provider_timeout,
            user_agent: self.config.user_agent.clone(),
        };

        for step in &self.steps {
            let query = match step.kind {
                QueryKind::Doi => document.doi.clone().map(LookupQuery::Doi),
                QueryKind::Isbn => document.isbn.clone().map(LookupQuery::Isbn),
                QueryKind::Title => document.title_guess.clone().map(LookupQuery::Title),
            };
            // A step whose identifier was not extracted is skipped, not failed
            let Some(query) = query else {
                continue;
            };

            match timeout(context.timeout, step.provider.lookup(&query, &context)).await {
                Ok(Ok(Some(mut record))) => {
                    // An exact-identifier match is authoritative no matter
                    // what the provider reported
                    if step.kind == QueryKind::Doi {
                        record.confidence = 1.0;
                    }
                    if record.confidence >= step.min_confidence {
                        info!(
                            provider = step.provider.name(),
                            confidence = record.confidence,
                            "Resolved '{}'",
                            record.title
                        );
                        return record;
                    }
                    debug!(
                        provider = step.provider.name(),
                        confidence = record.confidence,
                        threshold = step.min_confidence,
                        "Match below confidence threshold, continuing"
                    );
                }
                Ok(Ok(None)) => {
                    debug!(provider = step.provider.name(), "No match");
                }
                Ok(Err(e)) => {
                    // Transport and parse failures are indistinguishable
                    // from a no-match as far as the waterfall is concerned
                    warn!(provider = step.provider.name(), "Lookup failed: {}", e);
                }
                Err(_) => {
                    warn!(
                        provider = step.provider.name(),
                        "Lookup timed out after {:?}", context.timeout
                    );
                }
            }
        }

        let title = document
            .title_guess
            .clone()
            .unwrap_or_else(|| fallback_title.to_string());
        info!("No provider matched, producing manual_review record for '{title}'");
        BibRecord::manual_review(title, document.doi.clone().unwrap_or_default())
    }
}
