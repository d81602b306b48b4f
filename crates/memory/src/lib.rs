//! Persistence for shellmate: memory notes and chat history.

pub mod history;
pub mod notes;

pub use history::HistoryFile;
pub use notes::{DEFAULT_BUDGET_CHARS, NoteStore, evict_to_budget};
