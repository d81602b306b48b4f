//! Built-in tool implementations for shellmate.
//!
//! Tools give the agent the ability to act on the user's machine:
//! write and read files, run Python, and edit its memory notes.

pub mod file_reader;
pub mod file_writer;
pub mod memory_tools;
pub mod python_executor;

use shellmate_core::error::ToolError;
use shellmate_core::memory::MemoryBackend;
use shellmate_core::tool::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;

pub use file_reader::FileReaderTool;
pub use file_writer::FileWriterTool;
pub use memory_tools::{RemoveMemoryTool, SaveMemoryTool};
pub use python_executor::PythonExecutorTool;

/// Create the registry of all five built-in tools.
///
/// `root` is the directory relative file paths resolve against (the
/// working directory captured at startup).
pub fn default_registry(
    root: impl Into<PathBuf>,
    notes: Arc<dyn MemoryBackend>,
    interpreter: impl Into<String>,
) -> ToolRegistry {
    let root = root.into();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FileWriterTool::new(root.clone())));
    registry.register(Box::new(FileReaderTool::new(root.clone())));
    registry.register(Box::new(PythonExecutorTool::new(interpreter, root)));
    registry.register(Box::new(SaveMemoryTool::new(notes.clone())));
    registry.register(Box::new(RemoveMemoryTool::new(notes)));
    registry
}

pub(crate) fn str_arg<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be a string")))
}

pub(crate) fn bool_arg(arguments: &serde_json::Value, key: &str) -> Result<bool, ToolError> {
    match &arguments[key] {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::Null => Ok(false),
        _ => Err(ToolError::InvalidArguments(format!("'{key}' must be a boolean"))),
    }
}

/// Integer argument; numeric strings are accepted as well.
pub(crate) fn index_arg(arguments: &serde_json::Value, key: &str) -> Result<i64, ToolError> {
    let value = &arguments[key];
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be an integer")))
}
