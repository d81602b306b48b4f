//! Agent feature flags.

use serde::{Deserialize, Serialize};

/// Per-session switches chosen on the command line or in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFlags {
    /// Persist chat history between sessions
    #[serde(default)]
    pub use_memory: bool,

    /// Include a listing of the working directory in the system prompt
    #[serde(default)]
    pub list_directory: bool,

    /// Skip the confirmation prompt before running tools
    #[serde(default)]
    pub always_allow: bool,
}
