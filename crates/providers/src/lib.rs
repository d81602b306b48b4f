//! LLM Provider implementations for shellmate.
//!
//! All providers implement the `shellmate_core::Provider` trait.
//! The router selects the protocol from the model name.

pub mod anthropic;
pub mod openai_compat;
pub mod router;
pub mod sse;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderKind, build_for_model};
