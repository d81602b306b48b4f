//! File writer tool: create, overwrite, or append to a file.

use async_trait::async_trait;
use shellmate_core::error::ToolError;
use shellmate_core::tool::{Tool, ToolResult};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::{bool_arg, str_arg};

pub struct FileWriterTool {
    /// Relative paths resolve against this directory.
    root: PathBuf,
}

impl FileWriterTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn write(path: &std::path::Path, content: &str, append: bool) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        } else {
            tokio::fs::write(path, content).await
        }
    }
}

#[async_trait]
impl Tool for FileWriterTool {
    fn name(&self) -> &str {
        "file_writer"
    }

    fn description(&self) -> &str {
        "Writes content to a file at the specified path relative to the current working directory, \
         creating directories if necessary. Set append to true to add to the end of an existing file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path of the file to write (relative to the current working directory)."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                },
                "append": {
                    "type": "boolean",
                    "description": "Append to the file instead of overwriting it."
                }
            },
            "required": ["file_path", "content", "append"]
        })
    }

    fn describe(&self, arguments: &serde_json::Value) -> String {
        let path = arguments["file_path"].as_str().unwrap_or_default();
        let content = arguments["content"].as_str().unwrap_or_default();
        let verb = if arguments["append"].as_bool() == Some(true) {
            "append to"
        } else {
            "write"
        };
        format!("The assistant wants to {verb} the file '{path}' with this content:\n\n{content}")
    }

    fn status(&self, arguments: &serde_json::Value) -> String {
        format!(
            "Writing to file '{}'...",
            arguments["file_path"].as_str().unwrap_or_default()
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let file_path = str_arg(&arguments, "file_path")?;
        let content = str_arg(&arguments, "content")?;
        let append = bool_arg(&arguments, "append")?;

        let path = self.root.join(file_path);
        debug!(path = %path.display(), append, bytes = content.len(), "Writing file");

        match Self::write(&path, content, append).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "File '{}' written successfully.",
                path.display()
            ))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "File write failed");
                Ok(ToolResult::error(format!(
                    "Error writing to file '{}'.",
                    path.display()
                )))
            }
        }
    }
}
