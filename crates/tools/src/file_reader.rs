//! File reader tool: read a whole file as text.

use async_trait::async_trait;
use shellmate_core::error::ToolError;
use shellmate_core::tool::{Tool, ToolResult};
use std::path::PathBuf;
use tracing::debug;

use crate::str_arg;

pub struct FileReaderTool {
    /// Relative paths resolve against this directory.
    root: PathBuf,
}

impl FileReaderTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for FileReaderTool {
    fn name(&self) -> &str {
        "file_reader"
    }

    fn description(&self) -> &str {
        "Reads the content of a file at the specified path relative to the current working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path of the file to read (relative to the current working directory)."
                }
            },
            "required": ["file_path"]
        })
    }

    fn describe(&self, arguments: &serde_json::Value) -> String {
        format!(
            "The assistant wants to open and read '{}'",
            arguments["file_path"].as_str().unwrap_or_default()
        )
    }

    fn status(&self, arguments: &serde_json::Value) -> String {
        format!(
            "Reading file '{}'...",
            arguments["file_path"].as_str().unwrap_or_default()
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let file_path = str_arg(&arguments, "file_path")?;
        let path = self.root.join(file_path);
        debug!(path = %path.display(), "Reading file");

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(ToolResult::ok(format!(
                "Content of file '{}':\n\n{content}",
                path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolResult::error(format!(
                "Error: File '{}' not found.",
                path.display()
            ))),
            Err(e) => Ok(ToolResult::error(format!(
                "Error: Could not read file '{}': {e}",
                path.display()
            ))),
        }
    }
}
