//! Tool-call validation.
//!
//! Checks run in a fixed order: the arguments must decode to a JSON object,
//! the tool must be registered, and every required argument must be present.
//! Extra arguments are tolerated.

use serde_json::Value;
use shellmate_core::error::ToolCallError;
use shellmate_core::tool::{ToolCall, ToolRegistry};

/// Validate `call` against `registry` and return its decoded arguments.
pub fn validate(call: &ToolCall, registry: &ToolRegistry) -> Result<Value, ToolCallError> {
    let arguments = call
        .arguments
        .parse()
        .map_err(|reason| ToolCallError::ArgumentDecode {
            tool_name: call.name.clone(),
            reason,
        })?;

    let tool = registry
        .get(&call.name)
        .ok_or_else(|| ToolCallError::UnknownTool {
            tool_name: call.name.clone(),
            available: registry.names().join(", "),
        })?;

    let missing: Vec<String> = tool
        .required_arguments()
        .into_iter()
        .filter(|key| arguments.get(key).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(ToolCallError::MissingArgument {
            tool_name: call.name.clone(),
            missing: missing.join(", "),
        });
    }

    Ok(Value::Object(arguments))
}
