//! Memory tools: let the agent edit its own note list.
//!
//! `save_memory` appends a note (the store evicts the oldest notes when the
//! budget is exceeded); `remove_memory` deletes one by the index shown in
//! the system prompt.

use async_trait::async_trait;
use shellmate_core::error::ToolError;
use shellmate_core::memory::MemoryBackend;
use shellmate_core::tool::{Tool, ToolResult};
use std::sync::Arc;
use tracing::debug;

use crate::{index_arg, str_arg};

pub struct SaveMemoryTool {
    backend: Arc<dyn MemoryBackend>,
}

impl SaveMemoryTool {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Saves a short note to long-term memory. Use this for facts about the user or their \
         environment that will be useful in future conversations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The note to remember."
                }
            },
            "required": ["content"]
        })
    }

    fn describe(&self, arguments: &serde_json::Value) -> String {
        format!(
            "The assistant wants to save this to memory:\n\n{}",
            arguments["content"].as_str().unwrap_or_default()
        )
    }

    fn status(&self, _arguments: &serde_json::Value) -> String {
        "Saving to memory...".into()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let content = str_arg(&arguments, "content")?;

        let evicted = self
            .backend
            .add(content)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "save_memory".into(),
                reason: e.to_string(),
            })?;
        debug!(backend = self.backend.name(), evicted, "Memory note saved");

        Ok(ToolResult::ok(format!("Stored in memory: {content}")))
    }
}

pub struct RemoveMemoryTool {
    backend: Arc<dyn MemoryBackend>,
}

impl RemoveMemoryTool {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for RemoveMemoryTool {
    fn name(&self) -> &str {
        "remove_memory"
    }

    fn description(&self) -> &str {
        "Removes the memory note at the given index (as listed in the system prompt)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "index": {
                    "type": "integer",
                    "description": "Index of the note to remove."
                }
            },
            "required": ["index"]
        })
    }

    fn describe(&self, arguments: &serde_json::Value) -> String {
        format!(
            "The assistant wants to remove the memory item at index {}",
            arguments["index"]
        )
    }

    fn status(&self, arguments: &serde_json::Value) -> String {
        format!("Removing memory item at index {}...", arguments["index"])
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let index = index_arg(&arguments, "index")?;

        // Negative or out-of-range indices leave the store untouched
        let removed = match usize::try_from(index) {
            Ok(i) => self
                .backend
                .remove(i)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "remove_memory".into(),
                    reason: e.to_string(),
                })?,
            Err(_) => false,
        };
        debug!(index, removed, "Memory removal requested");

        Ok(ToolResult::ok(format!("Removed memory item at index {index}.")))
    }
}
