//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly (not OpenAI-compatible proxy).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Streaming via SSE with `content_block_delta` events
//!
//! Text is forwarded as it streams. Tool-use blocks are held until
//! `message_stop` and then emitted as one structured fragment each, so the
//! agent sees complete arguments through the same fragment shape the
//! chat-completions adapter uses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellmate_core::error::ProviderError;
use shellmate_core::message::{Message, Role};
use shellmate_core::provider::*;
use shellmate_core::tool::ToolArguments;
use tracing::{debug, trace};

use crate::sse::{StreamDecoder, check_status, spawn_pump};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert messages to Anthropic API format with content blocks.
    ///
    /// Tool results travel as `tool_result` blocks inside user messages, and
    /// consecutive user-side messages are merged so roles keep alternating.
    fn to_api_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();

        for msg in messages {
            let (role, blocks) = match msg.role {
                Role::User => (
                    "user",
                    vec![ContentBlock::Text {
                        text: msg.content.clone(),
                    }],
                ),
                Role::Assistant => {
                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.arguments.to_object(),
                        });
                    }
                    if blocks.is_empty() {
                        continue;
                    }
                    ("assistant", blocks)
                }
                Role::Tool => (
                    "user",
                    vec![ContentBlock::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                        is_error: msg.is_error,
                    }],
                ),
            };

            match result.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => result.push(AnthropicMessage {
                    role: role.into(),
                    content: blocks,
                }),
            }
        }

        result
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    fn build_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens,
            "stream": true,
        });

        if !request.system.is_empty() {
            body["system"] = serde_json::json!(request.system);
        }

        if !request.tools.is_empty() {
            body["tools"] = self.format_tools(&request.tools);
        }

        body
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn format_tools(&self, tools: &[ToolDefinition]) -> serde_json::Value {
        serde_json::json!(Self::to_api_tools(tools))
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = check_status(&self.name, response).await?;
        Ok(spawn_pump(response, AnthropicDecoder::default()))
    }
}

/// A `tool_use` block being accumulated.
#[derive(Debug)]
struct PendingToolUse {
    index: u32,
    id: String,
    name: String,
    /// `input` from `content_block_start`, used when no deltas follow
    initial_input: serde_json::Value,
    partial_json: String,
}

impl PendingToolUse {
    fn into_fragment(self) -> ToolCallFragment {
        let arguments = if self.partial_json.trim().is_empty() {
            ToolArguments::Structured(self.initial_input)
        } else {
            match serde_json::from_str::<serde_json::Value>(&self.partial_json) {
                Ok(value) => ToolArguments::Structured(value),
                // Let the validator report the decode failure to the model
                Err(_) => ToolArguments::Raw(self.partial_json),
            }
        };
        ToolCallFragment {
            index: self.index,
            id: Some(self.id),
            name: Some(self.name),
            arguments,
        }
    }
}

/// Translates Messages API SSE payloads into [`StreamChunk`]s.
#[derive(Debug, Default)]
pub struct AnthropicDecoder {
    tool_uses: Vec<PendingToolUse>,
}

impl AnthropicDecoder {
    /// Emit every accumulated tool-use block, then the terminal chunk.
    fn flush(&mut self) -> Vec<StreamChunk> {
        let mut chunks: Vec<StreamChunk> = self
            .tool_uses
            .drain(..)
            .map(|t| StreamChunk::fragment(t.into_fragment()))
            .collect();
        chunks.push(StreamChunk::done());
        chunks
    }
}

impl StreamDecoder for AnthropicDecoder {
    fn decode(&mut self, data: &str) -> Result<Vec<StreamChunk>, ProviderError> {
        let event: StreamEvent = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
                return Ok(Vec::new());
            }
        };

        match event {
            StreamEvent::ContentBlockStart {
                index,
                content_block: StartBlock::ToolUse { id, name, input },
            } => {
                self.tool_uses.push(PendingToolUse {
                    index,
                    id,
                    name,
                    initial_input: input,
                    partial_json: String::new(),
                });
                Ok(Vec::new())
            }
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } if !text.is_empty() => {
                    Ok(vec![StreamChunk::text(text)])
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(pending) = self.tool_uses.iter_mut().find(|t| t.index == index) {
                        pending.partial_json.push_str(&partial_json);
                    }
                    Ok(Vec::new())
                }
                _ => Ok(Vec::new()),
            },
            StreamEvent::MessageStop => Ok(self.flush()),
            StreamEvent::Error { error } => Err(ProviderError::StreamInterrupted(format!(
                "{}: {}",
                error.r#type, error.message
            ))),
            _ => Ok(Vec::new()),
        }
    }

    fn finish(&mut self) -> Vec<StreamChunk> {
        self.flush()
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

// --- Streaming SSE types ---

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockStart {
        index: u32,
        content_block: StartBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    MessageStop,
    Error {
        error: StreamErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    r#type: String,
    message: String,
}
