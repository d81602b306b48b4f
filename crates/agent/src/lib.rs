//! The turn controller, the heart of shellmate.
//!
//! Each user query runs one **turn**:
//!
//! 1. **Build the prompt** (system text, memory notes, optional directory tree, trimmed window)
//! 2. **Request** a stream from the provider, retrying with backoff
//! 3. **Assemble** the streamed text and tool-call fragments
//! 4. **If tool calls**: validate, confirm, execute, append results, go back to step 1
//! 5. **If text only**: the turn is done
//!
//! Invalid tool calls are answered with a diagnostic and counted; after three
//! in a row the model is told to stop retrying.

pub mod assembler;
pub mod console;
pub mod dispatcher;
pub mod loop_runner;
pub mod prompt;
pub mod retry;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{AssembledResponse, StreamAssembler};
pub use console::{Confirmation, Console};
pub use loop_runner::{Agent, MAX_ATTEMPTS_REACHED, TurnSummary};
pub use prompt::WorkspaceLister;
pub use retry::RetryPolicy;
