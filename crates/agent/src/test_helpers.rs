//! Shared test doubles for the agent tests.

use shellmate_core::error::ProviderError;
use shellmate_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, StreamChunk, ToolCallFragment, ToolDefinition,
};
use shellmate_core::tool::ToolArguments;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::console::{Confirmation, Console};

/// One scripted reply: either the chunks of a stream, or an error from
/// opening it.
pub type Script = Result<Vec<StreamChunk>, ProviderError>;

/// A provider that replays scripted streams, one per `stream()` call.
///
/// Panics if more calls are made than scripts provided.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn format_tools(&self, tools: &[ToolDefinition]) -> serde_json::Value {
        serde_json::to_value(tools).unwrap()
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more scripts");
        let chunks = script?;

        let (tx, rx) = tokio::sync::mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            tx.try_send(Ok(chunk)).unwrap();
        }
        Ok(rx)
    }
}

/// Text reply followed by the end marker.
pub fn text_reply(text: &str) -> Script {
    Ok(vec![StreamChunk::text(text), StreamChunk::done()])
}

/// A single tool call whose raw JSON arguments arrive in one fragment.
pub fn tool_reply(id: &str, name: &str, arguments: &str) -> Script {
    Ok(vec![
        StreamChunk::fragment(ToolCallFragment {
            index: 0,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: ToolArguments::Raw(arguments.into()),
        }),
        StreamChunk::done(),
    ])
}

/// A console that records everything and answers confirmations from a queue.
///
/// An exhausted queue answers "n".
#[derive(Default)]
pub struct RecordingConsole {
    replies: Mutex<VecDeque<String>>,
    lines: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Everything printed through `text()`, joined.
    pub fn transcript(&self) -> String {
        self.lines()
            .iter()
            .filter_map(|l| l.strip_prefix("text:"))
            .collect()
    }

    fn record(&self, kind: &str, line: &str) {
        self.lines.lock().unwrap().push(format!("{kind}:{line}"));
    }
}

#[async_trait::async_trait]
impl Console for RecordingConsole {
    fn text(&self, delta: &str) {
        self.record("text", delta);
    }

    fn status(&self, line: &str) {
        self.record("status", line);
    }

    fn warn(&self, line: &str) {
        self.record("warn", line);
    }

    fn error(&self, line: &str) {
        self.record("error", line);
    }

    async fn confirm(&self, description: &str) -> Confirmation {
        self.record("confirm", description);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "n".into());
        Confirmation::from_reply(&reply)
    }
}
