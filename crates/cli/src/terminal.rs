//! Line-oriented terminal console.
//!
//! Reads user input through one shared async line reader, so the REPL prompt
//! and tool confirmations never race for stdin.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use shellmate_agent::{Confirmation, Console};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub const CONFIRM_PROMPT: &str = "Allow? (y/[n], or type a message for the assistant): ";

pub struct TerminalConsole<R, W> {
    input: tokio::sync::Mutex<Lines<R>>,
    output: Mutex<W>,
}

impl TerminalConsole<BufReader<Stdin>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> TerminalConsole<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: tokio::sync::Mutex::new(input.lines()),
            output: Mutex::new(output),
        }
    }

    /// Print `prompt` and read one line. `None` on end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        self.write(prompt);
        self.input.lock().await.next_line().await
    }

    /// Echo a query that did not come from the prompt.
    pub fn echo_query(&self, query: &str) {
        self.write(&format!("> {query}\n"));
    }

    pub fn interrupted(&self) {
        self.write("\nInterrupted.\n");
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = match self.output.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Nothing useful to do if the terminal is gone
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

#[async_trait]
impl<R, W> Console for TerminalConsole<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    fn text(&self, delta: &str) {
        self.write(delta);
    }

    fn status(&self, line: &str) {
        self.write(&format!("{line}\n"));
    }

    fn warn(&self, line: &str) {
        self.write(&format!("Warning: {line}\n"));
    }

    fn error(&self, line: &str) {
        self.write(&format!("{line}\n"));
    }

    async fn confirm(&self, description: &str) -> Confirmation {
        self.write(&format!("{description}\n"));
        match self.read_line(CONFIRM_PROMPT).await {
            Ok(Some(reply)) => Confirmation::from_reply(&reply),
            // Closed or broken input never approves anything
            _ => Confirmation::Cancelled { message: None },
        }
    }
}
