//! Chat history persisted between sessions.
//!
//! A flat JSON array of role-tagged messages, rewritten in full after every
//! turn. The saved list is trimmed to the conversation window, so it always
//! opens with a user message.

use shellmate_core::error::MemoryError;
use shellmate_core::message::{Message, trim_window};
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the saved prefix. A missing or unreadable file yields nothing.
    pub fn load(&self) -> Vec<Message> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str::<Vec<Message>>(&content) {
            Ok(messages) => {
                debug!(path = %self.path.display(), count = messages.len(), "History loaded");
                messages
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable history file");
                Vec::new()
            }
        }
    }

    /// Save the last `max_window` messages.
    pub fn save(&self, messages: &[Message], max_window: usize) -> Result<(), MemoryError> {
        let window = trim_window(messages, max_window);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(window)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        std::fs::write(&self.path, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write history file: {e}")))?;

        debug!(path = %self.path.display(), count = window.len(), "History saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellmate_core::message::Role;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(dir.path().join("history.json"));

        let messages = vec![Message::user("list files"), Message::assistant("Use `ls`.")];
        history.save(&messages, 24).unwrap();

        let loaded = history.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].role, Role::User);
        assert_eq!(loaded[1].content, "Use `ls`.");
    }

    #[test]
    fn save_trims_to_window() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(dir.path().join("history.json"));

        let messages = vec![
            Message::user("q1"),
            Message::assistant("a1"),
            Message::tool_result("c1", "r", false),
            Message::user("q2"),
            Message::assistant("a2"),
        ];
        history.save(&messages, 3).unwrap();

        let loaded = history.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].content, "q2");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(dir.path().join("none.json"));
        assert!(history.load().is_empty());
    }

    #[test]
    fn corrupted_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[{\"role\": ").unwrap();
        assert!(HistoryFile::new(path).load().is_empty());
    }
}
