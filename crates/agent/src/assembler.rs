//! Streaming response assembler.
//!
//! Consumes the uniform chunk stream of either provider, printing text as it
//! arrives and reassembling tool-call fragments per stream index. Nothing
//! here knows which wire protocol produced the chunks.

use std::collections::BTreeMap;

use shellmate_core::error::ProviderError;
use shellmate_core::provider::{ChunkReceiver, ToolCallFragment};
use shellmate_core::tool::{ToolArguments, ToolCall};
use tracing::{debug, trace};

use crate::console::Console;

pub const BUILDING_TOOL_CALL: &str = "Building tool call...";

/// Everything one model response produced.
#[derive(Debug, Default)]
pub struct AssembledResponse {
    /// Display text, first delta left-trimmed
    pub text: String,

    /// Reassembled tool calls keyed by stream index
    pub tool_calls: BTreeMap<u32, ToolCall>,
}

impl AssembledResponse {
    pub fn tool_call_detected(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: Option<String>,
    arguments: ToolArguments,
}

/// Incremental accumulator behind [`assemble`].
#[derive(Debug, Default)]
pub struct StreamAssembler {
    text: String,
    calls: BTreeMap<u32, PartialCall>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a text delta and return the part to display.
    ///
    /// Until some text has been kept, leading whitespace is stripped.
    pub fn push_text<'a>(&mut self, delta: &'a str) -> Option<&'a str> {
        let delta = if self.text.is_empty() {
            delta.trim_start()
        } else {
            delta
        };
        if delta.is_empty() {
            return None;
        }
        self.text.push_str(delta);
        Some(delta)
    }

    /// Accumulate a tool-call fragment. Returns `true` if it opened a new index.
    pub fn push_fragment(&mut self, fragment: ToolCallFragment) -> bool {
        let is_new = !self.calls.contains_key(&fragment.index);
        let call = self.calls.entry(fragment.index).or_default();

        // Only the opening fragment names the call
        if call.id.is_none() {
            call.id = fragment.id.filter(|id| !id.is_empty());
        }
        if call.name.is_none() {
            call.name = fragment.name.filter(|name| !name.is_empty());
        }

        let current = std::mem::take(&mut call.arguments);
        call.arguments = merge_arguments(current, fragment.arguments);
        is_new
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn finish(self) -> AssembledResponse {
        let tool_calls = self
            .calls
            .into_iter()
            .map(|(index, call)| {
                let tool_call = ToolCall {
                    id: call.id.unwrap_or_else(|| format!("call_{index}")),
                    name: call.name.unwrap_or_default(),
                    arguments: call.arguments,
                };
                (index, tool_call)
            })
            .collect();

        AssembledResponse {
            text: self.text,
            tool_calls,
        }
    }
}

/// Raw pieces concatenate; a structured piece replaces whatever came before
/// unless raw text has already started.
fn merge_arguments(current: ToolArguments, piece: ToolArguments) -> ToolArguments {
    match (current, piece) {
        (ToolArguments::Raw(mut text), ToolArguments::Raw(more)) => {
            text.push_str(&more);
            ToolArguments::Raw(text)
        }
        (ToolArguments::Raw(text), ToolArguments::Structured(value)) if text.is_empty() => {
            ToolArguments::Structured(value)
        }
        (ToolArguments::Raw(mut text), ToolArguments::Structured(value)) => {
            text.push_str(&value.to_string());
            ToolArguments::Raw(text)
        }
        (ToolArguments::Structured(value), ToolArguments::Raw(more)) => {
            ToolArguments::Raw(format!("{value}{more}"))
        }
        (ToolArguments::Structured(_), ToolArguments::Structured(value)) => {
            ToolArguments::Structured(value)
        }
    }
}

/// Drain a provider stream, echoing text to the console as it arrives.
///
/// An error received mid-stream ends assembly and is returned as-is.
pub async fn assemble(
    rx: &mut ChunkReceiver,
    console: &dyn Console,
) -> Result<AssembledResponse, ProviderError> {
    let mut assembler = StreamAssembler::new();
    let mut line_open = false;

    while let Some(item) = rx.recv().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                if line_open {
                    console.text("\n");
                }
                return Err(e);
            }
        };

        if let Some(delta) = chunk.content.as_deref() {
            if let Some(shown) = assembler.push_text(delta) {
                console.text(shown);
                line_open = !shown.ends_with('\n');
            }
        }

        if let Some(fragment) = chunk.tool_call {
            trace!(index = fragment.index, "Tool call fragment");
            if assembler.push_fragment(fragment) {
                if line_open {
                    console.text("\n");
                    line_open = false;
                }
                console.status(BUILDING_TOOL_CALL);
            }
        }

        if chunk.done {
            break;
        }
    }

    if line_open {
        console.text("\n");
    }

    let response = assembler.finish();
    debug!(
        text_len = response.text.len(),
        tool_calls = response.tool_calls.len(),
        "Response assembled"
    );
    Ok(response)
}
