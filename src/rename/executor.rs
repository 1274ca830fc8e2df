use crate::client::providers::{LookupContext, ZoteroProvider};
use crate::client::BibRecord;
use crate::rename::journal::{Journal, JournalEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One requested rename: where the file is and what it should be called
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub original_path: PathBuf,
    /// Proposed filename (no directory component)
    pub new_name: String,
    pub metadata: BibRecord,
}

/// Per-item result of a batch execution
#[derive(Debug, Serialize)]
pub struct ItemOutcome {
    pub original_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the Zotero attachment rename succeeded; absent when no sync
    /// was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zotero_synced: Option<bool>,
}

impl ItemOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of executing one batch
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub session_id: String,
    pub results: Vec<ItemOutcome>,
}

/// Performs filesystem moves for a batch of rename requests, resolving name
/// collisions deterministically and journaling every successful move.
///
/// Items are processed strictly in batch order so that collision numbering
/// is deterministic relative to earlier items in the same batch. One item's
/// failure never aborts the rest.
pub struct RenameExecutor {
    journal: Arc<Journal>,
    zotero: Option<Arc<ZoteroProvider>>,
    context: LookupContext,
}

impl RenameExecutor {
    pub fn new(
        journal: Arc<Journal>,
        zotero: Option<Arc<ZoteroProvider>>,
        context: LookupContext,
    ) -> Self {
        Self {
            journal,
            zotero,
            context,
        }
    }

    /// Execute a batch of renames under one session id. A missing session id
    /// is generated as a UTC timestamp string.
    pub async fn execute(
        &self,
        batch: Vec<RenameRequest>,
        session_id: Option<String>,
    ) -> BatchOutcome {
        let session_id = session_id
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string());
        info!("Executing {} renames in session {}", batch.len(), session_id);

        let mut results = Vec::with_capacity(batch.len());
        for request in batch {
            results.push(self.execute_one(request, &session_id).await);
        }

        BatchOutcome {
            session_id,
            results,
        }
    }

    async fn execute_one(&self, request: RenameRequest, session_id: &str) -> ItemOutcome {
        if !request.original_path.exists() {
            return ItemOutcome {
                original_path: request.original_path,
                new_path: None,
                error: Some("File not found".to_string()),
                zotero_synced: None,
            };
        }

        // Normalize so journal entries carry absolute paths
        let original = std::fs::canonicalize(&request.original_path)
            .unwrap_or_else(|_| request.original_path.clone());
        let parent = original.parent().map(Path::to_path_buf).unwrap_or_default();
        let target = resolve_collision(&parent.join(&request.new_name), &original);

        if let Err(err) = std::fs::rename(&original, &target) {
            warn!("Rename of {} failed: {err}", original.display());
            return ItemOutcome {
                original_path: original,
                new_path: None,
                error: Some(err.to_string()),
                zotero_synced: None,
            };
        }

        let entry = JournalEntry {
            original_path: original.clone(),
            new_path: target.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata_source: request.metadata.source,
            session_id: session_id.to_string(),
            metadata: request.metadata.clone(),
            undone: false,
        };
        if let Err(err) = self.journal.append(entry) {
            // An unjournaled rename cannot be undone later; move the file
            // back and report the item as failed
            warn!("Journal append failed, rolling back move: {err}");
            if let Err(rollback) = std::fs::rename(&target, &original) {
                warn!("Rollback of {} also failed: {rollback}", target.display());
            }
            return ItemOutcome {
                original_path: original,
                new_path: None,
                error: Some(format!("Journal write failed: {err}")),
                zotero_synced: None,
            };
        }

        let zotero_synced = self.sync_zotero(&request.metadata, &target).await;
        debug!("Renamed {} -> {}", original.display(), target.display());

        ItemOutcome {
            original_path: original,
            new_path: Some(target),
            error: None,
            zotero_synced,
        }
    }

    /// Best-effort remote attachment rename. Failure is a flag on the item
    /// result, never a rename failure.
    async fn sync_zotero(&self, metadata: &BibRecord, target: &Path) -> Option<bool> {
        let key = metadata.zotero_key.as_deref()?;
        let zotero = self.zotero.as_ref()?;
        let filename = target.file_name()?.to_string_lossy();

        match zotero.update_attachment(key, &filename, &self.context).await {
            Ok(synced) => Some(synced),
            Err(err) => {
                warn!("Zotero attachment sync failed: {err}");
                Some(false)
            }
        }
    }
}

/// Append a numeric disambiguator in parentheses before the extension,
/// incrementing until the name is free. A target equal to the original file
/// itself is not a collision.
fn resolve_collision(proposed: &Path, original: &Path) -> PathBuf {
    if !proposed.exists() || proposed == original {
        return proposed.to_path_buf();
    }

    let stem = proposed
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = proposed
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = proposed.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{stem} ({counter}){extension}"));
        if !candidate.exists() && candidate != original {
            return candidate;
        }
        counter += 1;
    }
}
