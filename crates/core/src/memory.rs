//! Memory trait: the persisted list of free-text notes.
//!
//! Notes are distinct from chat history: the model adds them with
//! `save_memory`, removes them by index with `remove_memory`, and sees the
//! whole list in its system prompt on every turn.

use async_trait::async_trait;

use crate::error::MemoryError;

/// The core MemoryBackend trait.
///
/// Implementations: the JSON-file note store, and scripted doubles in tests.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// The backend name (e.g., "json").
    fn name(&self) -> &str;

    /// Append a note, evicting the oldest ones if the budget is exceeded.
    /// Returns the number of notes evicted.
    async fn add(&self, content: &str) -> std::result::Result<usize, MemoryError>;

    /// Remove the note at `index`. Out-of-range indices are a no-op and
    /// return `false`.
    async fn remove(&self, index: usize) -> std::result::Result<bool, MemoryError>;

    /// All notes, oldest first.
    async fn list(&self) -> std::result::Result<Vec<String>, MemoryError>;
}

/// Render notes as an indexed list for the system prompt.
pub fn render_notes(notes: &[String]) -> String {
    notes
        .iter()
        .enumerate()
        .map(|(i, note)| format!("{i}: {note}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_render_with_indices() {
        let notes = vec!["prefers fish shell".to_string(), "uses macOS".to_string()];
        assert_eq!(render_notes(&notes), "0: prefers fish shell\n1: uses macOS");
        assert_eq!(render_notes(&[]), "");
    }
}
