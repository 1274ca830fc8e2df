pub mod executor;
pub mod filename;
pub mod journal;

pub use executor::{BatchOutcome, ItemOutcome, RenameExecutor, RenameRequest};
pub use journal::{Journal, JournalEntry, SessionUndoItem};
