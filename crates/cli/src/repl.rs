//! The read-eval-print loop.

use std::io::Write;

use shellmate_agent::Agent;
use tokio::io::AsyncBufRead;
use tracing::{debug, info};

use crate::terminal::TerminalConsole;

const PROMPT: &str = "> ";

/// Empty input, `exit`, or `quit` ends the session.
pub fn is_exit(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Run queries until the user leaves. `initial` is echoed and run first.
///
/// Ctrl+C at the prompt ends the session; during a turn it abandons that
/// turn and returns to the prompt.
pub async fn run<R, W>(
    agent: &mut Agent,
    console: &TerminalConsole<R, W>,
    initial: Option<String>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let mut pending = initial;

    loop {
        let query = match pending.take() {
            Some(query) => {
                console.echo_query(&query);
                query
            }
            None => {
                let line = tokio::select! {
                    line = console.read_line(PROMPT) => line?,
                    _ = tokio::signal::ctrl_c() => None,
                };
                match line {
                    Some(line) if !is_exit(&line) => line.trim().to_string(),
                    _ => break,
                }
            }
        };

        tokio::select! {
            result = agent.run(&query, console) => {
                if let Err(e) = result {
                    debug!(error = %e, "Turn ended early");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Turn interrupted");
                console.interrupted();
            }
        }
    }

    info!("Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellmate_core::environment::EnvironmentSnapshot;
    use shellmate_core::error::ProviderError;
    use shellmate_core::provider::{ChunkReceiver, Provider, ProviderRequest, StreamChunk, ToolDefinition};
    use shellmate_memory::NoteStore;
    use std::sync::{Arc, Mutex};

    /// Answers every request with "ok" and records the last user message.
    struct EchoProvider {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn format_tools(&self, _tools: &[ToolDefinition]) -> serde_json::Value {
            serde_json::Value::Null
        }

        async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.queries.lock().unwrap().push(last);
            let (tx, rx) = tokio::sync::mpsc::channel(2);
            tx.try_send(Ok(StreamChunk::text("ok"))).unwrap();
            tx.try_send(Ok(StreamChunk::done())).unwrap();
            Ok(rx)
        }
    }

    fn agent(provider: Arc<EchoProvider>) -> Agent {
        let notes = Arc::new(NoteStore::in_memory(4096));
        let tools = shellmate_tools::default_registry(".", notes.clone(), "python3");
        let environment = EnvironmentSnapshot {
            platform: "linux".into(),
            shell: "/bin/sh".into(),
            cwd: ".".into(),
        };
        Agent::new(provider, "gpt-4o", Arc::new(tools), notes, environment)
    }

    #[test]
    fn exit_words() {
        assert!(is_exit(""));
        assert!(is_exit("  \n"));
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit vim"));
    }

    #[tokio::test]
    async fn runs_initial_then_prompted_queries() {
        let provider = Arc::new(EchoProvider {
            queries: Mutex::new(Vec::new()),
        });
        let mut agent = agent(provider.clone());
        let console = TerminalConsole::new(&b"second\nquit\nnever\n"[..], Vec::new());

        run(&mut agent, &console, Some("first".into())).await.unwrap();

        assert_eq!(*provider.queries.lock().unwrap(), vec!["first", "second"]);
        let out = String::from_utf8(console.into_output()).unwrap();
        assert!(out.starts_with("> first\nok\n> "));
    }

    #[tokio::test]
    async fn end_of_input_ends_the_session() {
        let provider = Arc::new(EchoProvider {
            queries: Mutex::new(Vec::new()),
        });
        let mut agent = agent(provider.clone());
        let console = TerminalConsole::new(&b"only\n"[..], Vec::new());

        run(&mut agent, &console, None).await.unwrap();
        assert_eq!(*provider.queries.lock().unwrap(), vec!["only"]);
    }
}
