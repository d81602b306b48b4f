//! The console seam.
//!
//! Everything the user sees during a turn (streamed text, status lines,
//! warnings, confirmation prompts) goes through [`Console`]. The binary
//! implements it over stdin/stdout; tests script it.

use async_trait::async_trait;

/// The user's answer to a confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    /// Declined, optionally with a message for the model
    Cancelled { message: Option<String> },
}

impl Confirmation {
    /// Interpret a reply typed at the confirmation prompt.
    ///
    /// `y` or `yes` (any case) approves. An empty reply, `n`, or `no` cancels
    /// silently. Any other text cancels and is passed on to the model.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        match reply.to_lowercase().as_str() {
            "y" | "yes" => Self::Approved,
            "" | "n" | "no" => Self::Cancelled { message: None },
            _ => Self::Cancelled {
                message: Some(reply.to_string()),
            },
        }
    }
}

#[async_trait]
pub trait Console: Send + Sync {
    /// Print a piece of streamed model text, without a trailing newline.
    fn text(&self, delta: &str);

    /// Print a status line (e.g. "Building tool call...").
    fn status(&self, line: &str);

    /// Print a short, recoverable warning.
    fn warn(&self, line: &str);

    /// Print an error that ended the turn.
    fn error(&self, line: &str);

    /// Show what a tool is about to do and wait for the user's decision.
    async fn confirm(&self, description: &str) -> Confirmation;
}
