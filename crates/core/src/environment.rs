//! One-time snapshot of the user's platform, shell, and working directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Captured once at startup and injected into the agent as a read-only value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Target OS (e.g., "linux", "macos", "windows")
    pub platform: String,

    /// Shell from `SHELL`, or `COMSPEC` on Windows
    pub shell: String,

    /// Working directory; relative tool paths resolve against it
    pub cwd: PathBuf,
}

impl EnvironmentSnapshot {
    /// Probe the current process environment.
    pub fn capture() -> std::io::Result<Self> {
        let shell_var = if cfg!(windows) { "COMSPEC" } else { "SHELL" };
        let shell = std::env::var(shell_var).unwrap_or_else(|_| "unknown".to_string());
        Ok(Self {
            platform: std::env::consts::OS.to_string(),
            shell,
            cwd: std::env::current_dir()?,
        })
    }

    /// Render the block included in the system prompt.
    pub fn render(&self) -> String {
        format!(
            "User's Information:\n- Platform: {}\n- Environment: {}\n- Current Working Directory: {}\n",
            self.platform,
            self.shell,
            self.cwd.display()
        )
    }
}
