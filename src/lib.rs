pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod reader;
pub mod rename;
pub mod scan;

pub use client::{BibRecord, Doi, MetadataSource, Resolver, ResolverConfig};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{DocumentInfo, IdentifierExtractor};
pub use reader::{DocumentReader, PdfReader};
pub use rename::{
    BatchOutcome, Journal, JournalEntry, RenameExecutor, RenameRequest, SessionUndoItem,
};
pub use scan::{ScanItem, ScanReport};

use client::providers::{LookupContext, ZoteroProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Facade wiring the reader, extractor, waterfall, executor, and journal
/// together behind the operations a front end needs.
pub struct PdfShelf {
    config: Config,
    reader: Arc<dyn DocumentReader>,
    extractor: IdentifierExtractor,
    resolver: Resolver,
    journal: Arc<Journal>,
    executor: RenameExecutor,
}

impl PdfShelf {
    /// Build against the default `lopdf`-backed reader
    pub fn new(config: Config) -> Result<Self> {
        Self::with_reader(config, Arc::new(PdfReader::new()))
    }

    /// Build with a custom document reader (used in tests)
    pub fn with_reader(config: Config, reader: Arc<dyn DocumentReader>) -> Result<Self> {
        let resolver = Resolver::new(&config)?;
        let journal = Arc::new(Journal::new(config.journal_path()));

        let context = LookupContext {
            timeout: config.provider_timeout(),
            user_agent: config.providers.user_agent.clone(),
        };
        let zotero = if config.zotero.configured() {
            Some(Arc::new(ZoteroProvider::new(
                config.zotero.clone(),
                &config.providers.user_agent,
            )?))
        } else {
            None
        };
        let executor = RenameExecutor::new(journal.clone(), zotero, context);

        Ok(Self {
            extractor: IdentifierExtractor::new(),
            config,
            reader,
            resolver,
            journal,
            executor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve one document to a metadata record. Always produces a record;
    /// an unidentifiable document yields `manual_review`.
    pub async fn resolve(&self, path: &Path) -> BibRecord {
        scan::resolve_document(self.reader.as_ref(), &self.extractor, &self.resolver, path).await
    }

    /// Render a record into a sanitized filename. `template` may be a
    /// preset name or a literal template string; `None` uses the configured
    /// template.
    pub fn synthesize_name(&self, record: &BibRecord, template: Option<&str>) -> String {
        rename::filename::render(record, &self.config.resolve_template(template))
    }

    /// Scan a directory and propose a rename for every PDF in it
    pub async fn scan_directory(
        &self,
        directory: &Path,
        template: Option<&str>,
    ) -> Result<ScanReport> {
        scan::scan_directory(
            self.reader.as_ref(),
            &self.extractor,
            &self.resolver,
            directory,
            &self.config.resolve_template(template),
            self.config.scan.max_concurrent,
        )
        .await
    }

    /// Execute a batch of renames, journaling each success
    pub async fn execute(
        &self,
        batch: Vec<RenameRequest>,
        session_id: Option<String>,
    ) -> BatchOutcome {
        self.executor.execute(batch, session_id).await
    }

    /// Undo one rename by journal index
    pub fn undo_single(&self, index: usize) -> Result<PathBuf> {
        self.journal.undo_single(index)
    }

    /// Undo every non-undone rename in a session
    pub fn undo_session(&self, session_id: &str) -> Result<Vec<SessionUndoItem>> {
        self.journal.undo_session(session_id)
    }

    /// The full ordered rename history
    pub fn history(&self) -> Result<Vec<JournalEntry>> {
        self.journal.history()
    }
}
