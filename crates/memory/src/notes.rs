//! JSON-file note store with a character budget.
//!
//! The file holds a flat JSON array of strings, oldest first. It is read in
//! full on creation and rewritten in full after every mutation.
//!
//! Storage location: `~/.shellmate/memory.json` unless configured otherwise.

use async_trait::async_trait;
use shellmate_core::error::MemoryError;
use shellmate_core::memory::MemoryBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default total size of all notes, in characters.
pub const DEFAULT_BUDGET_CHARS: usize = 4096;

/// A budgeted list of free-text notes.
///
/// Adding a note that pushes the total over budget evicts the oldest notes
/// until it fits. The newest note is never evicted, even if it alone is
/// larger than the budget.
pub struct NoteStore {
    path: Option<PathBuf>,
    budget_chars: usize,
    notes: Arc<RwLock<Vec<String>>>,
}

impl NoteStore {
    /// Open the note store at `path`.
    ///
    /// If the file exists, notes are loaded from it. If it does not, the
    /// store starts empty and the file is created on first write.
    pub fn open(path: PathBuf, budget_chars: usize) -> Self {
        let notes = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = notes.len(), "Note store loaded");
        Self {
            path: Some(path),
            budget_chars,
            notes: Arc::new(RwLock::new(notes)),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(budget_chars: usize) -> Self {
        Self {
            path: None,
            budget_chars,
            notes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    fn load_from_disk(path: &Path) -> Vec<String> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // Not written yet
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(notes) => notes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable note file");
                Vec::new()
            }
        }
    }

    /// Rewrite the whole file.
    fn flush(&self, notes: &[String]) -> Result<(), MemoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(notes)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))
    }
}

/// Total size of `notes` in characters.
fn total_chars(notes: &[String]) -> usize {
    notes.iter().map(|n| n.chars().count()).sum()
}

/// Drop the oldest notes until the total fits `budget`, keeping the last one.
/// Returns how many were dropped.
pub fn evict_to_budget(notes: &mut Vec<String>, budget: usize) -> usize {
    let mut total = total_chars(notes);
    let mut evicted = 0;
    while total > budget && notes.len() > 1 {
        total -= notes[0].chars().count();
        notes.remove(0);
        evicted += 1;
    }
    evicted
}

#[async_trait]
impl MemoryBackend for NoteStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn add(&self, content: &str) -> Result<usize, MemoryError> {
        let mut notes = self.notes.write().await;
        let mut updated = notes.clone();
        updated.push(content.to_string());
        let evicted = evict_to_budget(&mut updated, self.budget_chars);

        // The list only changes once the file does
        self.flush(&updated)?;
        *notes = updated;
        if evicted > 0 {
            debug!(evicted, budget = self.budget_chars, "Evicted oldest notes");
        }
        Ok(evicted)
    }

    async fn remove(&self, index: usize) -> Result<bool, MemoryError> {
        let mut notes = self.notes.write().await;
        if index >= notes.len() {
            return Ok(false);
        }
        let mut updated = notes.clone();
        updated.remove(index);
        self.flush(&updated)?;
        *notes = updated;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<String>, MemoryError> {
        Ok(self.notes.read().await.clone())
    }
}
