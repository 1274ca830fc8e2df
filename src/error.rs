use std::path::PathBuf;
use thiserror::Error;

/// Crate-level error taxonomy.
///
/// Provider lookup failures never appear here: they are absorbed inside the
/// resolution waterfall as `ProviderError` and coalesced with "no match".
/// Everything below is either a per-item filesystem outcome or a journal
/// refusal, reported in batch results rather than aborting an operation.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (journal file, settings)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Client errors (permanent - caller mistake)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // Rename executor
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // Undo journal refusals
    #[error("Invalid journal index: {index}")]
    InvalidIndex { index: usize },

    #[error("Entry {index} already undone")]
    AlreadyUndone { index: usize },

    #[error("File not found: {path}")]
    TargetMissing { path: PathBuf },

    #[error("Original path already occupied: {path}")]
    SourceOccupied { path: PathBuf },

    // Provider construction problems (bad HTTP client config and the like);
    // lookup-time provider failures stay inside the waterfall
    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<crate::client::providers::ProviderError> for Error {
    fn from(err: crate::client::providers::ProviderError) -> Self {
        Error::Provider(err.to_string())
    }
}

impl Error {
    /// Whether the error is a per-item outcome that a batch or session
    /// operation should record and move past, as opposed to a caller
    /// mistake worth surfacing immediately.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound { .. }
                | Error::AlreadyUndone { .. }
                | Error::TargetMissing { .. }
                | Error::SourceOccupied { .. }
                | Error::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
