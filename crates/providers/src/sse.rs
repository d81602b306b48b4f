//! Server-sent-events plumbing shared by both protocol adapters.
//!
//! Each adapter supplies a [`StreamDecoder`] that turns one `data:` payload
//! into zero or more [`StreamChunk`]s; [`spawn_pump`] drives it over the
//! HTTP byte stream and forwards chunks to the agent.

use futures::StreamExt;
use shellmate_core::error::ProviderError;
use shellmate_core::provider::{ChunkReceiver, StreamChunk};
use tracing::{trace, warn};

/// Splits an incoming byte stream into SSE `data:` payloads.
///
/// Bytes may arrive split anywhere, including inside a multi-byte character,
/// so undecoded bytes are held until a full line is available.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every complete `data:` payload.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=line_end).collect();
            if let Some(data) = Self::data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        Self::data_payload(&line)
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);

        // Blank separators, comments, and `event:` lines carry nothing we
        // need; every payload repeats its event type in the JSON.
        let data = line.strip_prefix("data:")?.trim();
        if data.is_empty() {
            None
        } else {
            Some(data.to_string())
        }
    }
}

/// Protocol-specific translation from SSE payloads to uniform chunks.
pub trait StreamDecoder: Send + 'static {
    /// Translate one payload. A chunk with `done` set ends the stream.
    fn decode(&mut self, data: &str) -> Result<Vec<StreamChunk>, ProviderError>;

    /// Called when the connection closes without a terminal event.
    fn finish(&mut self) -> Vec<StreamChunk>;
}

/// Map a non-success HTTP status to the matching provider error.
pub async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(format!(
            "Invalid {provider} API key or insufficient permissions"
        )));
    }

    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "Provider streaming error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

/// Spawn a task that reads `response` as SSE and forwards decoded chunks.
///
/// The task stops after the first `done` chunk, on the first error, or when
/// the receiver is dropped.
pub fn spawn_pump<D: StreamDecoder>(response: reqwest::Response, mut decoder: D) -> ChunkReceiver {
    let (tx, rx) = tokio::sync::mpsc::channel(64);

    tokio::spawn(async move {
        let mut byte_stream = response.bytes_stream();
        let mut lines = SseLineBuffer::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    let _ = tx
                        .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                        .await;
                    return;
                }
            };

            for data in lines.push(&bytes) {
                trace!(data = %data, "SSE payload");
                match decoder.decode(&data) {
                    Ok(chunks) => {
                        for chunk in chunks {
                            let done = chunk.done;
                            if tx.send(Ok(chunk)).await.is_err() {
                                return; // receiver dropped
                            }
                            if done {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }

        // Stream ended without a terminal event
        let mut tail = Vec::new();
        if let Some(data) = lines.finish() {
            match decoder.decode(&data) {
                Ok(chunks) => tail.extend(chunks),
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
        if !tail.iter().any(|c| c.done) {
            tail.extend(decoder.finish());
        }
        for chunk in tail {
            let done = chunk.done;
            if tx.send(Ok(chunk)).await.is_err() || done {
                return;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut buf = SseLineBuffer::new();
        let out = buf.push(b"data: {\"a\":1}\n\ndata: [DONE]\n\n");
        assert_eq!(out, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn holds_partial_lines_until_complete() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.push(b"data: {\"te").is_empty());
        let out = buf.push(b"xt\":\"hi\"}\r\n");
        assert_eq!(out, vec!["{\"text\":\"hi\"}".to_string()]);
    }

    #[test]
    fn skips_comments_and_event_lines() {
        let mut buf = SseLineBuffer::new();
        let out = buf.push(b": ping\nevent: message_stop\ndata: {\"type\":\"message_stop\"}\n");
        assert_eq!(out, vec!["{\"type\":\"message_stop\"}".to_string()]);
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let mut buf = SseLineBuffer::new();
        let text = "data: \"héllo\"\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(buf.push(&text[..split]).is_empty());
        assert_eq!(buf.push(&text[split..]), vec!["\"héllo\"".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.push(b"data: [DONE]").is_empty());
        assert_eq!(buf.finish().as_deref(), Some("[DONE]"));
        assert!(buf.finish().is_none());
    }
}
