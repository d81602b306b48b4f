//! Python executor tool: run a snippet in an isolated interpreter.
//!
//! The interpreter is started with `-I` (isolated mode: no user site
//! packages, no `PYTHON*` environment variables) and stdout and stderr are
//! captured together.

use async_trait::async_trait;
use shellmate_core::error::ToolError;
use shellmate_core::tool::{Tool, ToolResult};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::str_arg;

pub struct PythonExecutorTool {
    interpreter: String,
    /// Working directory for the subprocess
    root: PathBuf,
}

impl PythonExecutorTool {
    pub fn new(interpreter: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            root: root.into(),
        }
    }
}

#[async_trait]
impl Tool for PythonExecutorTool {
    fn name(&self) -> &str {
        "python_executor"
    }

    fn description(&self) -> &str {
        "Executes Python code in an isolated interpreter and returns everything it prints \
         to stdout and stderr."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code to execute."
                }
            },
            "required": ["code"]
        })
    }

    fn describe(&self, arguments: &serde_json::Value) -> String {
        format!(
            "The assistant wants to run this Python code:\n\n{}",
            arguments["code"].as_str().unwrap_or_default()
        )
    }

    fn status(&self, _arguments: &serde_json::Value) -> String {
        "Executing Python code...".into()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let code = str_arg(&arguments, "code")?;

        debug!(interpreter = %self.interpreter, bytes = code.len(), "Executing Python code");

        let output = Command::new(&self.interpreter)
            .args(["-I", "-c", code])
            .current_dir(&self.root)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "python_executor".into(),
                reason: format!("could not start '{}': {e}", self.interpreter),
            })?;

        let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            if captured.trim().is_empty() {
                Ok(ToolResult::ok("Python code executed successfully with no output."))
            } else {
                Ok(ToolResult::ok(captured))
            }
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(exit_code = code, "Python code failed");
            Ok(ToolResult::error(format!(
                "Error executing Python code:\n{captured}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn tool_definition() {
        let tool = PythonExecutorTool::new("python3", ".");
        assert_eq!(tool.name(), "python_executor");
        assert_eq!(tool.required_arguments(), vec!["code"]);
    }

    #[tokio::test]
    async fn captures_stdout() {
        if !python_available() {
            return;
        }
        let tool = PythonExecutorTool::new("python3", std::env::temp_dir());
        let result = tool
            .execute(serde_json::json!({ "code": "print(6 * 7)" }))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output.trim(), "42");
    }

    #[tokio::test]
    async fn empty_output_reports_success() {
        if !python_available() {
            return;
        }
        let tool = PythonExecutorTool::new("python3", std::env::temp_dir());
        let result = tool
            .execute(serde_json::json!({ "code": "x = 1" }))
            .await
            .unwrap();
        assert_eq!(result.output, "Python code executed successfully with no output.");
    }

    #[tokio::test]
    async fn nonzero_exit_is_error_result() {
        if !python_available() {
            return;
        }
        let tool = PythonExecutorTool::new("python3", std::env::temp_dir());
        let result = tool
            .execute(serde_json::json!({ "code": "raise ValueError('boom')" }))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.starts_with("Error executing Python code:\n"));
        assert!(result.output.contains("ValueError: boom"));
    }

    #[tokio::test]
    async fn missing_interpreter_is_tool_error() {
        let tool = PythonExecutorTool::new("shellmate-no-such-python", std::env::temp_dir());
        let result = tool
            .execute(serde_json::json!({ "code": "print(1)" }))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
