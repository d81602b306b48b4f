//! Tool trait: the abstraction over local capabilities.
//!
//! Tools are what give the agent the ability to act on the user's machine:
//! write and read files, run Python, and edit its own memory notes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Arguments payload of a tool call, in whichever shape the provider sent it.
///
/// The chat-completions protocol streams arguments as JSON text that still
/// has to be decoded; the messages protocol hands over a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    /// Raw JSON text, possibly malformed
    Raw(String),
    /// Already-decoded JSON
    Structured(serde_json::Value),
}

impl ToolArguments {
    /// Decode into a JSON object.
    ///
    /// An empty raw payload decodes to an empty object so that a call with no
    /// arguments is reported as missing arguments rather than malformed JSON.
    pub fn parse(&self) -> Result<serde_json::Map<String, serde_json::Value>, String> {
        let value = match self {
            Self::Raw(text) if text.trim().is_empty() => {
                return Ok(serde_json::Map::new());
            }
            Self::Raw(text) => {
                serde_json::from_str::<serde_json::Value>(text).map_err(|e| e.to_string())?
            }
            Self::Structured(value) => value.clone(),
        };
        match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(format!("expected a JSON object, got {other}")),
        }
    }

    /// Render as JSON text (the chat-completions wire form).
    pub fn to_json_string(&self) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }

    /// Render as a JSON object (the messages wire form). Undecodable payloads
    /// become an empty object.
    pub fn to_object(&self) -> serde_json::Value {
        self.parse()
            .map(serde_json::Value::Object)
            .unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

/// A request to execute a tool, reassembled from a provider stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID issued by the provider
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments payload
    pub arguments: ToolArguments,
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The text fed back to the model
    pub output: String,

    /// Whether the tool reported a failure
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            output: output.into(),
            is_error: true,
        }
    }

    /// Attach the call ID of the tool call this result answers.
    pub fn for_call(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }
}

/// The core Tool trait.
///
/// Each executor (file_writer, file_reader, python_executor, save_memory,
/// remove_memory) implements this trait and is registered in the
/// [`ToolRegistry`]. `arguments` is always a JSON object whose required keys
/// have already been checked.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "file_writer").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Names of the arguments that must be present, read from the schema's
    /// `required` list.
    fn required_arguments(&self) -> Vec<String> {
        self.parameters_schema()["required"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Human-readable description of the intended action, shown before the
    /// user is asked to confirm.
    fn describe(&self, arguments: &serde_json::Value) -> String;

    /// Status line printed right before the tool runs.
    fn status(&self, arguments: &serde_json::Value) -> String {
        let _ = arguments;
        format!("Running {}...", self.name())
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The catalogue of available tools, in registration order.
///
/// The agent uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Validate and look up tools when the LLM requests them
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
