//! Provider router: picks the wire protocol for a model name.
//!
//! Model names starting with `claude` speak the Anthropic messages protocol;
//! everything else goes to the OpenAI-compatible chat-completions endpoint.

use std::sync::Arc;

use shellmate_config::AppConfig;
use shellmate_core::error::ProviderError;
use shellmate_core::provider::Provider;
use tracing::debug;

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// The two protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// Route a model name by prefix.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Self::Anthropic
        } else {
            Self::OpenAi
        }
    }
}

/// Build the provider serving `model`, using keys and endpoints from config.
pub fn build_for_model(
    config: &AppConfig,
    model: &str,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let kind = ProviderKind::for_model(model);
    debug!(model, ?kind, "Routing model to provider");

    match kind {
        ProviderKind::Anthropic => {
            let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "ANTHROPIC_API_KEY is not set (needed for claude models)".into(),
                )
            })?;
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(url) = &config.anthropic_base_url {
                provider = provider.with_base_url(url);
            }
            Ok(Arc::new(provider))
        }
        ProviderKind::OpenAi => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured("OPENAI_API_KEY is not set".into())
            })?;
            let provider = match &config.openai_base_url {
                Some(url) => OpenAiCompatProvider::new("openai", url, api_key),
                None => OpenAiCompatProvider::openai(api_key),
            };
            Ok(Arc::new(provider))
        }
    }
}
