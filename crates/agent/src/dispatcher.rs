//! Confirmation gate and tool dispatch for validated calls.

use serde_json::Value;
use shellmate_core::tool::{Tool, ToolResult};
use tracing::{debug, info, warn};

use crate::console::{Confirmation, Console};

pub const CANCELLED_BY_USER: &str = "User cancelled the tool execution.";

/// Outcome of dispatching one validated call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub result: ToolResult,
    /// Free text the user typed when declining, for the model to read next
    pub follow_up: Option<String>,
}

/// Ask for confirmation (unless `always_allow`), then execute.
pub async fn confirm_and_execute(
    tool: &dyn Tool,
    call_id: &str,
    arguments: Value,
    always_allow: bool,
    console: &dyn Console,
) -> Dispatched {
    if !always_allow {
        if let Confirmation::Cancelled { message } = console.confirm(&tool.describe(&arguments)).await
        {
            info!(tool = tool.name(), call_id, "Tool call cancelled by user");
            console.warn(&format!("Cancelled {}.", tool.name()));
            return Dispatched {
                result: ToolResult::ok(CANCELLED_BY_USER).for_call(call_id),
                follow_up: message,
            };
        }
    }

    Dispatched {
        result: execute(tool, call_id, arguments, console).await,
        follow_up: None,
    }
}

/// Print the tool's status line and run it. Executor failures become
/// error results; they never abort the turn.
pub async fn execute(
    tool: &dyn Tool,
    call_id: &str,
    arguments: Value,
    console: &dyn Console,
) -> ToolResult {
    console.status(&tool.status(&arguments));
    debug!(tool = tool.name(), call_id, "Executing tool");

    let result = match tool.execute(arguments).await {
        Ok(result) => result,
        Err(e) => {
            warn!(tool = tool.name(), error = %e, "Tool execution failed");
            ToolResult::error(format!("Error executing tool: {e}"))
        }
    };

    if result.is_error {
        let first_line = result.output.lines().next().unwrap_or_default();
        console.warn(first_line);
    }

    result.for_call(call_id)
}
