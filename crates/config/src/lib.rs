//! Configuration loading, validation, and management for shellmate.
//!
//! Loads configuration from `~/.shellmate/config.toml` with `.env` and
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use shellmate_core::AgentFlags;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.shellmate/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default model; names starting with `claude` use the Anthropic protocol
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    /// Override for OpenAI-compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_base_url: Option<String>,

    /// Agent behavior
    #[serde(default)]
    pub agent: AgentConfig,

    /// Note store and chat history files
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Backoff for opening provider streams
    #[serde(default)]
    pub retry: RetryConfig,

    /// Code execution
    #[serde(default)]
    pub python: PythonConfig,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("retry", &self.retry)
            .field("python", &self.python)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Persist chat history between sessions
    #[serde(default)]
    pub use_memory: bool,

    /// Show the model the working directory tree
    #[serde(default)]
    pub list_directory: bool,

    /// Run tools without asking first
    #[serde(default)]
    pub always_allow: bool,

    /// Maximum number of messages sent per request
    #[serde(default = "default_max_window")]
    pub max_window: usize,

    /// Consecutive invalid tool calls tolerated before the model is told to stop
    #[serde(default = "default_max_failed_tool_calls")]
    pub max_failed_tool_calls: u32,
}

fn default_max_window() -> usize {
    24
}
fn default_max_failed_tool_calls() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            use_memory: false,
            list_directory: false,
            always_allow: false,
            max_window: default_max_window(),
            max_failed_tool_calls: default_max_failed_tool_calls(),
        }
    }
}

impl AgentConfig {
    pub fn flags(&self) -> AgentFlags {
        AgentFlags {
            use_memory: self.use_memory,
            list_directory: self.list_directory,
            always_allow: self.always_allow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Note list, relative paths resolve against the config directory
    #[serde(default = "default_notes_path")]
    pub notes_path: PathBuf,

    /// Chat history used with `--memory`
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    /// Total characters the note list may hold
    #[serde(default = "default_budget_chars")]
    pub budget_chars: usize,
}

fn default_notes_path() -> PathBuf {
    PathBuf::from("memory.json")
}
fn default_history_path() -> PathBuf {
    PathBuf::from("history.json")
}
fn default_budget_chars() -> usize {
    4096
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            notes_path: default_notes_path(),
            history_path: default_history_path(),
            budget_chars: default_budget_chars(),
        }
    }
}

impl MemoryConfig {
    /// Note file location, anchored at `base` when relative.
    pub fn notes_file(&self, base: &Path) -> PathBuf {
        base.join(&self.notes_path)
    }

    /// History file location, anchored at `base` when relative.
    pub fn history_file(&self, base: &Path) -> PathBuf {
        base.join(&self.history_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_secs() -> u64 {
    2
}
fn default_max_delay_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

fn default_interpreter() -> String {
    "python3".into()
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.shellmate/config.toml).
    ///
    /// A `.env` file in the working directory is read first. Environment
    /// variables then take priority over the file:
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`
    /// - `SHELLMATE_MODEL`
    /// - `SHELLMATE_OPENAI_BASE_URL`, `SHELLMATE_ANTHROPIC_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(model) = lookup("SHELLMATE_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("SHELLMATE_OPENAI_BASE_URL") {
            self.openai_base_url = Some(url);
        }
        if let Some(url) = lookup("SHELLMATE_ANTHROPIC_BASE_URL") {
            self.anthropic_base_url = Some(url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".shellmate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.agent.max_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_window must be > 0".into(),
            ));
        }

        if self.memory.budget_chars == 0 {
            return Err(ConfigError::ValidationError(
                "memory.budget_chars must be > 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }

        if self.retry.base_delay_secs > self.retry.max_delay_secs {
            return Err(ConfigError::ValidationError(
                "retry.base_delay_secs must not exceed retry.max_delay_secs".into(),
            ));
        }

        Ok(())
    }

    /// Whether the key for the configured model's protocol is present.
    pub fn has_api_key(&self) -> bool {
        if self.model.starts_with("claude") {
            self.anthropic_api_key.is_some()
        } else {
            self.openai_api_key.is_some()
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: None,
            anthropic_base_url: None,
            agent: AgentConfig::default(),
            memory: MemoryConfig::default(),
            retry: RetryConfig::default(),
            python: PythonConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
