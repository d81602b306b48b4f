//! # shellmate core
//!
//! Domain types, traits, and error definitions for the shellmate terminal agent.
//! This crate carries no transport or runtime code; it defines the model that
//! the provider, memory, tool, and agent crates implement against.
//!
//! Every seam is a trait here:
//! - [`Provider`] for the two remote streaming protocols
//! - [`Tool`] for local side-effecting capabilities
//! - [`MemoryBackend`] for the persisted note list

pub mod agent;
pub mod environment;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::AgentFlags;
pub use environment::EnvironmentSnapshot;
pub use error::{MemoryError, ProviderError, ToolCallError, ToolError};
pub use memory::MemoryBackend;
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{
    ChunkReceiver, Provider, ProviderRequest, StreamChunk, ToolCallFragment, ToolDefinition,
};
pub use tool::{Tool, ToolArguments, ToolCall, ToolRegistry, ToolResult};
