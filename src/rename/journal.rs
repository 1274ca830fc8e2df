use crate::client::{BibRecord, MetadataSource};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// One executed rename. Entries are append-only and never deleted; `undone`
/// is the only field mutated after creation, flipped false to true exactly
/// once by an undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    /// UTC, ISO-8601
    pub timestamp: String,
    pub metadata_source: MetadataSource,
    pub session_id: String,
    pub metadata: BibRecord,
    pub undone: bool,
}

/// Per-entry outcome of a session undo
#[derive(Debug)]
pub struct SessionUndoItem {
    /// Journal index of the entry
    pub index: usize,
    pub outcome: Result<PathBuf>,
}

/// Append-only journal of executed renames backed by a JSON file.
///
/// Every mutation is a full read-modify-write of the whole sequence, guarded
/// by a mutex so concurrent batches serialize on a single writer. Entry
/// indices are stable forever because entries are never removed.
pub struct Journal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Journal {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full ordered journal; a missing file is an empty journal
    pub fn history(&self) -> Result<Vec<JournalEntry>> {
        self.load()
    }

    fn load(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &[JournalEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    /// Append an entry for a rename that has already been performed on disk.
    /// Returns the entry's stable index.
    pub fn append(&self, entry: JournalEntry) -> Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.push(entry);
        self.save(&entries)?;
        debug!("Journal entry {} appended", entries.len() - 1);
        Ok(entries.len() - 1)
    }

    /// Undo one rename by its journal index, moving the file back to its
    /// original path and flipping the entry's `undone` flag.
    ///
    /// The journal is re-read under the lock before any check so the
    /// decision is made against current state, not a stale snapshot.
    pub fn undo_single(&self, index: usize) -> Result<PathBuf> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;

        let entry = entries
            .get(index)
            .ok_or(Error::InvalidIndex { index })?;
        if entry.undone {
            return Err(Error::AlreadyUndone { index });
        }
        if !entry.new_path.exists() {
            return Err(Error::TargetMissing {
                path: entry.new_path.clone(),
            });
        }
        if entry.original_path.exists() {
            return Err(Error::SourceOccupied {
                path: entry.original_path.clone(),
            });
        }

        std::fs::rename(&entry.new_path, &entry.original_path)?;
        let restored = entry.original_path.clone();
        entries[index].undone = true;
        self.save(&entries)?;

        info!("Restored {}", restored.display());
        Ok(restored)
    }

    /// Undo every non-undone entry of a session, in journal order. Each
    /// entry's outcome is collected independently; one failure does not halt
    /// the rest of the session.
    pub fn undo_session(&self, session_id: &str) -> Result<Vec<SessionUndoItem>> {
        let candidates: Vec<usize> = self
            .load()?
            .iter()
            .enumerate()
            .filter(|(_, e)| e.session_id == session_id && !e.undone)
            .map(|(i, _)| i)
            .collect();

        // undo_single re-reads the journal before each mutation, so entries
        // undone or touched by another writer in the meantime are judged
        // against current state
        let mut results = Vec::with_capacity(candidates.len());
        for index in candidates {
            results.push(SessionUndoItem {
                index,
                outcome: self.undo_single(index),
            });
        }
        Ok(results)
    }
}
