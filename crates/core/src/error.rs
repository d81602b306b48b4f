//! Error types for the shellmate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// Transport-level failures. These are the only errors the retry policy retries.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures raised while running an executor.
///
/// The dispatcher turns these into `Error executing tool: ...` tool results,
/// so they never abort a turn.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// A tool call the model issued that cannot be executed as-is.
///
/// The `Display` text is fed back to the model verbatim, so each variant
/// tells it how to fix the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolCallError {
    #[error(
        "Error: The arguments for tool '{tool_name}' are not valid JSON ({reason}). \
         Send the arguments as a single JSON object and try again."
    )]
    ArgumentDecode { tool_name: String, reason: String },

    #[error(
        "Error: Unknown tool '{tool_name}'. Use one of the available tools: {available}."
    )]
    UnknownTool { tool_name: String, available: String },

    #[error(
        "Error: Missing required argument(s) for tool '{tool_name}': {missing}. \
         Provide every required argument and try again."
    )]
    MissingArgument { tool_name: String, missing: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_call_errors_carry_remediation() {
        let err = ToolCallError::MissingArgument {
            tool_name: "file_writer".into(),
            missing: "content".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Error:"));
        assert!(text.contains("file_writer"));
        assert!(text.contains("content"));
        assert!(text.contains("try again"));

        let err = ToolCallError::UnknownTool {
            tool_name: "delete_everything".into(),
            available: "file_reader".into(),
        };
        assert!(err.to_string().contains("delete_everything"));
        assert!(err.to_string().contains("file_reader"));
    }
}
