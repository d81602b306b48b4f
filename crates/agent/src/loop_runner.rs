//! The turn controller.
//!
//! One call to [`Agent::run`] is one user turn: build the prompt, open a
//! stream with bounded retry, assemble the reply, validate and dispatch any
//! tool calls, and go around again until a reply carries no tool calls.

use std::sync::Arc;

use shellmate_core::agent::AgentFlags;
use shellmate_core::environment::EnvironmentSnapshot;
use shellmate_core::error::{ProviderError, ToolCallError, ToolError};
use shellmate_core::memory::MemoryBackend;
use shellmate_core::message::{Conversation, Message, MessageToolCall, trim_window};
use shellmate_core::provider::{Provider, ProviderRequest};
use shellmate_core::tool::{ToolCall, ToolRegistry, ToolResult};
use shellmate_memory::HistoryFile;
use tracing::{debug, info, warn};

use crate::assembler::{AssembledResponse, assemble};
use crate::console::Console;
use crate::dispatcher::confirm_and_execute;
use crate::prompt::{WorkspaceLister, build_system_prompt};
use crate::retry::RetryPolicy;
use crate::validator::validate;

pub const MAX_ATTEMPTS_REACHED: &str =
    "Tool use failed again. Maximum attempts reached. Do not retry.";

/// What a finished turn did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Streams opened (retries of the same request count once)
    pub model_calls: usize,
    /// Tool calls received, valid or not
    pub tool_calls: usize,
}

/// The agent: a provider, a tool set, and the conversation they share.
pub struct Agent {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Max tokens per response
    max_tokens: u32,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Memory notes listed in every system prompt
    notes: Arc<dyn MemoryBackend>,

    /// Platform, shell, and working directory captured at startup
    environment: EnvironmentSnapshot,

    flags: AgentFlags,

    retry: RetryPolicy,

    /// Messages sent per request
    max_window: usize,

    /// Consecutive invalid tool calls tolerated before the model is told to stop
    max_failed_tool_calls: u32,

    lister: Option<Arc<dyn WorkspaceLister>>,

    /// Chat history file and the prefix loaded from it
    history: Option<HistoryFile>,
    prefix: Vec<Message>,

    conversation: Conversation,

    /// Consecutive invalid tool calls, across turns
    failed_tool_calls: u32,
}

impl Agent {
    /// Create a new agent.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        notes: Arc<dyn MemoryBackend>,
        environment: EnvironmentSnapshot,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 4096,
            tools,
            notes,
            environment,
            flags: AgentFlags::default(),
            retry: RetryPolicy::default(),
            max_window: 24,
            max_failed_tool_calls: 3,
            lister: None,
            history: None,
            prefix: Vec::new(),
            conversation: Conversation::new(),
            failed_tool_calls: 0,
        }
    }

    pub fn with_flags(mut self, flags: AgentFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_max_window(mut self, max: usize) -> Self {
        self.max_window = max;
        self
    }

    pub fn with_max_failed_tool_calls(mut self, max: u32) -> Self {
        self.max_failed_tool_calls = max;
        self
    }

    /// Supply the directory tree used when `list_directory` is on.
    pub fn with_lister(mut self, lister: Arc<dyn WorkspaceLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    /// Attach a history file. Its contents become the conversation prefix
    /// when `use_memory` is on, and the merged list is saved after every turn.
    pub fn with_history(mut self, history: HistoryFile) -> Self {
        if self.flags.use_memory {
            self.prefix = history.load();
            info!(count = self.prefix.len(), "Loaded chat history");
        }
        self.history = Some(history);
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn failed_tool_calls(&self) -> u32 {
        self.failed_tool_calls
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The message window sent with the next request.
    ///
    /// A single query whose tool steps outgrow `max_window` pushes its own
    /// user message out of the window, which then comes back empty. Most
    /// providers reject a request without messages.
    pub fn window(&self) -> Vec<Message> {
        let merged: Vec<Message> = self
            .prefix
            .iter()
            .chain(self.conversation.messages.iter())
            .cloned()
            .collect();
        let window = trim_window(&merged, self.max_window);
        if window.is_empty() && !merged.is_empty() {
            warn!(
                messages = merged.len(),
                max_window = self.max_window,
                "Window has no user message left; request will carry no messages"
            );
        }
        window.to_vec()
    }

    /// Run one user turn to completion.
    ///
    /// A provider failure that survives the retry policy is reported on the
    /// console and returned; the agent stays usable for the next query.
    pub async fn run(
        &mut self,
        query: &str,
        console: &dyn Console,
    ) -> Result<TurnSummary, ProviderError> {
        info!(model = %self.model, "Processing query");
        self.conversation.push(Message::user(query));

        let result = self.drive(console).await;
        self.persist();
        result
    }

    async fn drive(&mut self, console: &dyn Console) -> Result<TurnSummary, ProviderError> {
        let mut summary = TurnSummary::default();

        loop {
            let request = self.build_request().await;
            summary.model_calls += 1;
            debug!(
                messages = request.messages.len(),
                iteration = summary.model_calls,
                "Sending request"
            );

            let response = match self.request(request, console).await {
                Ok(response) => response,
                Err(e) => {
                    console.error(&format!("Error: {e}"));
                    return Err(e);
                }
            };

            if !response.tool_call_detected() {
                if !response.text.is_empty() {
                    self.conversation.push(Message::assistant(response.text));
                }
                info!(
                    model_calls = summary.model_calls,
                    tool_calls = summary.tool_calls,
                    "Turn complete"
                );
                return Ok(summary);
            }

            summary.tool_calls += response.tool_calls.len();
            if !self.dispatch_tools(response, console).await {
                return Ok(summary);
            }
        }
    }

    async fn build_request(&self) -> ProviderRequest {
        let notes = match self.notes.list().await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(error = %e, "Could not read memory notes");
                Vec::new()
            }
        };

        let listing = if self.flags.list_directory {
            self.lister.as_ref().map(|lister| lister.list())
        } else {
            None
        };

        ProviderRequest {
            model: self.model.clone(),
            system: build_system_prompt(&self.environment, &notes, listing.as_deref()),
            messages: self.window(),
            tools: self.tools.definitions(),
            max_tokens: self.max_tokens,
        }
    }

    /// Open the stream under the retry policy and assemble the reply.
    async fn request(
        &self,
        request: ProviderRequest,
        console: &dyn Console,
    ) -> Result<AssembledResponse, ProviderError> {
        let provider = Arc::clone(&self.provider);
        let mut rx = self
            .retry
            .run(
                || {
                    let provider = Arc::clone(&provider);
                    let request = request.clone();
                    async move { provider.stream(request).await }
                },
                |attempt, max_attempts, delay, err| {
                    console.warn(&format!(
                        "Request failed ({err}). Retrying in {}s (attempt {attempt}/{max_attempts})...",
                        delay.as_secs()
                    ));
                },
            )
            .await?;

        assemble(&mut rx, console).await
    }

    /// Validate and run each tool call in stream order, then record the
    /// assistant message and its results together.
    ///
    /// Returns `false` when the turn should end instead of asking the model
    /// again.
    async fn dispatch_tools(&mut self, response: AssembledResponse, console: &dyn Console) -> bool {
        let AssembledResponse { text, tool_calls } = response;
        let tools = Arc::clone(&self.tools);
        let exhausted = self.failed_tool_calls >= self.max_failed_tool_calls;
        let mut any_valid = false;

        let mut requested = Vec::with_capacity(tool_calls.len());
        let mut results = Vec::with_capacity(tool_calls.len());
        let mut follow_ups = Vec::new();

        for call in tool_calls.into_values() {
            requested.push(MessageToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });

            let result = match validate(&call, &tools) {
                Err(err) => self.reject(&call, err, console),
                Ok(arguments) => {
                    any_valid = true;
                    self.failed_tool_calls = 0;
                    match tools.get(&call.name) {
                        Some(tool) => {
                            let dispatched = confirm_and_execute(
                                tool,
                                &call.id,
                                arguments,
                                self.flags.always_allow,
                                console,
                            )
                            .await;
                            follow_ups.extend(dispatched.follow_up);
                            dispatched.result
                        }
                        None => ToolResult::error(ToolError::NotFound(call.name.clone()).to_string())
                            .for_call(&call.id),
                    }
                }
            };
            results.push(Message::tool_result(
                result.call_id,
                result.output,
                result.is_error,
            ));
        }

        self.conversation
            .push(Message::assistant_with_tools(text, requested));
        for message in results {
            self.conversation.push(message);
        }
        for follow_up in follow_ups {
            self.conversation.push(Message::user(follow_up));
        }

        if exhausted && !any_valid {
            warn!(
                failed = self.failed_tool_calls,
                "Model kept issuing invalid tool calls after being told to stop"
            );
            console.error("The assistant kept issuing invalid tool calls. Ending this turn.");
            return false;
        }
        true
    }

    /// Count an invalid call and build the result fed back to the model.
    fn reject(&mut self, call: &ToolCall, err: ToolCallError, console: &dyn Console) -> ToolResult {
        if self.failed_tool_calls < self.max_failed_tool_calls {
            self.failed_tool_calls += 1;
        }
        warn!(
            tool = %call.name,
            failed = self.failed_tool_calls,
            error = %err,
            "Invalid tool call"
        );

        let output = if self.failed_tool_calls >= self.max_failed_tool_calls {
            MAX_ATTEMPTS_REACHED.to_string()
        } else {
            err.to_string()
        };
        console.warn(&format!("Invalid tool call to '{}'.", call.name));
        ToolResult::error(output).for_call(&call.id)
    }

    fn persist(&self) {
        if !self.flags.use_memory {
            return;
        }
        let Some(history) = &self.history else {
            return;
        };

        let merged: Vec<Message> = self
            .prefix
            .iter()
            .chain(self.conversation.messages.iter())
            .cloned()
            .collect();
        if let Err(e) = history.save(&merged, self.max_window) {
            warn!(error = %e, "Failed to save chat history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        RecordingConsole, ScriptedProvider, Script, text_reply, tool_reply,
    };
    use shellmate_core::message::Role;
    use shellmate_core::provider::{StreamChunk, ToolCallFragment};
    use shellmate_core::tool::ToolArguments;
    use shellmate_memory::NoteStore;
    use std::path::Path;

    struct Fixture {
        provider: Arc<ScriptedProvider>,
        notes: Arc<NoteStore>,
        agent: Agent,
    }

    fn fixture(root: &Path, scripts: Vec<Script>, flags: AgentFlags) -> Fixture {
        let provider = Arc::new(ScriptedProvider::new(scripts));
        let notes = Arc::new(NoteStore::in_memory(4096));
        let tools = shellmate_tools::default_registry(root, notes.clone(), "python3");
        let environment = EnvironmentSnapshot {
            platform: "linux".into(),
            shell: "/bin/bash".into(),
            cwd: root.to_path_buf(),
        };
        let agent = Agent::new(
            provider.clone(),
            "gpt-4o",
            Arc::new(tools),
            notes.clone(),
            environment,
        )
        .with_flags(flags);
        Fixture {
            provider,
            notes,
            agent,
        }
    }

    fn tool_messages(agent: &Agent) -> Vec<&Message> {
        agent
            .conversation()
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect()
    }

    #[tokio::test]
    async fn simple_text_response() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(dir.path(), vec![text_reply("Use `ls -la`.")], AgentFlags::default());
        let console = RecordingConsole::default();

        let summary = fx.agent.run("how do I list files?", &console).await.unwrap();

        assert_eq!(summary, TurnSummary { model_calls: 1, tool_calls: 0 });
        let messages = &fx.agent.conversation().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Use `ls -la`.");
        assert_eq!(console.transcript(), "Use `ls -la`.\n");

        let request = &fx.provider.requests()[0];
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.tools.len(), 5);
        assert!(request.system.contains("- Environment: /bin/bash"));
    }

    #[tokio::test]
    async fn approved_tool_call_runs_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply(
                    "call_1",
                    "file_writer",
                    r#"{"file_path": "notes.txt", "content": "hi", "append": false}"#,
                ),
                text_reply("Done."),
            ],
            AgentFlags::default(),
        );
        let console = RecordingConsole::with_replies(&["y"]);

        let summary = fx.agent.run("write hi to notes.txt", &console).await.unwrap();

        assert_eq!(summary, TurnSummary { model_calls: 2, tool_calls: 1 });
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "hi");

        // The follow-up request carries the call and its result, and no empty user message
        let second = &fx.provider.requests()[1];
        let roles: Vec<Role> = second.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
        assert_eq!(second.messages[1].tool_calls[0].name, "file_writer");
        assert_eq!(second.messages[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(second.messages[2].content.ends_with("written successfully."));
    }

    #[tokio::test]
    async fn cancelled_call_queues_follow_up_after_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("call_1", "save_memory", r#"{"content": "likes vim"}"#),
                text_reply("Okay, I won't."),
            ],
            AgentFlags::default(),
        );
        let console = RecordingConsole::with_replies(&["don't store that"]);

        fx.agent.run("remember I like vim", &console).await.unwrap();

        assert!(fx.notes.list().await.unwrap().is_empty());
        let second = &fx.provider.requests()[1];
        let roles: Vec<Role> = second.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::User]);
        assert_eq!(second.messages[2].content, "User cancelled the tool execution.");
        assert_eq!(second.messages[3].content, "don't store that");
    }

    #[tokio::test]
    async fn always_allow_skips_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let flags = AgentFlags {
            always_allow: true,
            ..AgentFlags::default()
        };
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("call_1", "save_memory", r#"{"content": "likes vim"}"#),
                text_reply("Saved."),
            ],
            flags,
        );
        let console = RecordingConsole::default();

        fx.agent.run("remember I like vim", &console).await.unwrap();

        assert_eq!(fx.notes.list().await.unwrap(), vec!["likes vim"]);
        assert!(!console.lines().iter().any(|l| l.starts_with("confirm:")));
        // The saved note shows up in the next system prompt
        assert!(fx.provider.requests()[1].system.contains("0: likes vim"));
    }

    #[tokio::test]
    async fn invalid_calls_count_up_to_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let missing_content = r#"{"file_path": "a.txt", "append": false}"#;
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("c1", "file_writer", missing_content),
                tool_reply("c2", "file_writer", missing_content),
                tool_reply("c3", "file_writer", missing_content),
                text_reply("Sorry, I can't do that."),
            ],
            AgentFlags::default(),
        );
        let console = RecordingConsole::default();

        let summary = fx.agent.run("write a.txt", &console).await.unwrap();

        assert_eq!(summary.model_calls, 4);
        assert_eq!(fx.agent.failed_tool_calls(), 3);
        let results = tool_messages(&fx.agent);
        assert!(results[0].content.contains("Missing required argument"));
        assert!(results[1].content.contains("Missing required argument"));
        assert_eq!(results[2].content, MAX_ATTEMPTS_REACHED);
        assert!(results.iter().all(|m| m.is_error));
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn invalid_call_after_the_limit_ends_the_turn() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("c1", "nope", "{}"),
                tool_reply("c2", "nope", "{}"),
                tool_reply("c3", "nope", "{}"),
                tool_reply("c4", "nope", "{}"),
            ],
            AgentFlags::default(),
        );
        let console = RecordingConsole::default();

        let summary = fx.agent.run("do it", &console).await.unwrap();

        assert_eq!(summary.model_calls, 4);
        assert_eq!(fx.agent.failed_tool_calls(), 3);
        let results = tool_messages(&fx.agent);
        assert_eq!(results.len(), 4);
        assert_eq!(results[3].content, MAX_ATTEMPTS_REACHED);
        assert!(console.lines().iter().any(|l| l.starts_with("error:")));
    }

    #[tokio::test]
    async fn valid_call_resets_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("c1", "nope", "{}"),
                tool_reply("c2", "nope", "{}"),
                tool_reply("c3", "save_memory", r#"{"content": "x"}"#),
                tool_reply("c4", "nope", "{}"),
                text_reply("ok"),
            ],
            AgentFlags {
                always_allow: true,
                ..AgentFlags::default()
            },
        );
        let console = RecordingConsole::default();

        fx.agent.run("go", &console).await.unwrap();

        assert_eq!(fx.agent.failed_tool_calls(), 1);
        let results = tool_messages(&fx.agent);
        assert!(results[3].content.starts_with("Error: Unknown tool 'nope'"));
    }

    #[tokio::test]
    async fn tool_calls_run_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let frag = |index: u32, id: &str, content: &str| {
            StreamChunk::fragment(ToolCallFragment {
                index,
                id: Some(id.into()),
                name: Some("save_memory".into()),
                arguments: ToolArguments::Raw(format!(r#"{{"content": "{content}"}}"#)),
            })
        };
        let mut fx = fixture(
            dir.path(),
            vec![
                Ok(vec![frag(0, "a", "first"), frag(1, "b", "second"), StreamChunk::done()]),
                text_reply("Both saved."),
            ],
            AgentFlags {
                always_allow: true,
                ..AgentFlags::default()
            },
        );
        let console = RecordingConsole::default();

        fx.agent.run("remember two things", &console).await.unwrap();

        assert_eq!(fx.notes.list().await.unwrap(), vec!["first", "second"]);
        let ids: Vec<_> = tool_messages(&fx.agent)
            .iter()
            .map(|m| m.tool_call_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_ends_the_turn_but_not_the_agent() {
        let dir = tempfile::tempdir().unwrap();
        let down = || Err(ProviderError::Network("connection refused".into()));
        let mut fx = fixture(
            dir.path(),
            vec![down(), down(), down(), text_reply("Back online.")],
            AgentFlags::default(),
        );
        let console = RecordingConsole::default();

        let err = fx.agent.run("hello?", &console).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(fx.provider.call_count(), 3);

        let lines = console.lines();
        assert!(lines.iter().any(|l| l.starts_with("warn:") && l.contains("(attempt 1/3)")));
        assert!(lines.iter().any(|l| l.starts_with("warn:") && l.contains("(attempt 2/3)")));
        assert!(lines.iter().any(|l| l.starts_with("error:Error: Network error")));

        // Next query works and still sees the first one
        fx.agent.run("are you there?", &console).await.unwrap();
        let last = fx.provider.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 2);
    }

    #[tokio::test]
    async fn history_is_saved_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let flags = AgentFlags {
            use_memory: true,
            ..AgentFlags::default()
        };

        let mut fx = fixture(dir.path(), vec![text_reply("Hi Sam.")], flags);
        fx.agent = fx.agent.with_history(HistoryFile::new(path.clone()));
        fx.agent.run("I'm Sam", &RecordingConsole::default()).await.unwrap();
        assert!(path.exists());

        let mut next = fixture(dir.path(), vec![text_reply("You're Sam.")], flags);
        next.agent = next.agent.with_history(HistoryFile::new(path.clone()));
        next.agent.run("who am I?", &RecordingConsole::default()).await.unwrap();

        let contents: Vec<String> = next.provider.requests()[0]
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(contents, vec!["I'm Sam", "Hi Sam.", "who am I?"]);
        assert_eq!(HistoryFile::new(path).load().len(), 4);
    }

    #[tokio::test]
    async fn history_untouched_without_memory_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut fx = fixture(dir.path(), vec![text_reply("ok")], AgentFlags::default());
        fx.agent = fx.agent.with_history(HistoryFile::new(path.clone()));

        fx.agent.run("hi", &RecordingConsole::default()).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn window_is_trimmed_to_open_with_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut fx = fixture(
            dir.path(),
            vec![
                text_reply("a1"),
                text_reply("a2"),
                text_reply("a3"),
            ],
            AgentFlags::default(),
        );
        fx.agent = fx.agent.with_max_window(2);
        let console = RecordingConsole::default();
        for query in ["q1", "q2", "q3"] {
            fx.agent.run(query, &console).await.unwrap();
        }

        let last = fx.provider.requests().pop().unwrap();
        // Cut to two, the window would open with a2, which is dropped
        let contents: Vec<_> = last.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q3"]);
    }

    #[tokio::test]
    async fn long_tool_step_can_empty_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let flags = AgentFlags {
            always_allow: true,
            ..AgentFlags::default()
        };
        let mut fx = fixture(
            dir.path(),
            vec![
                tool_reply("c1", "file_reader", r#"{"file_path": "missing.txt"}"#),
                text_reply("done"),
            ],
            flags,
        );
        fx.agent = fx.agent.with_max_window(2);

        fx.agent.run("read it", &RecordingConsole::default()).await.unwrap();

        // [user, assistant, tool] cut to two opens on the assistant message
        let requests = fx.provider.requests();
        assert_eq!(requests[0].messages.len(), 1);
        assert!(requests[1].messages.is_empty());
        assert!(fx.agent.window().is_empty());
    }

    struct FixedLister;

    impl WorkspaceLister for FixedLister {
        fn list(&self) -> String {
            "Cargo.toml\nsrc/\n  main.rs".into()
        }
    }

    #[tokio::test]
    async fn listing_only_with_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut off = fixture(dir.path(), vec![text_reply("ok")], AgentFlags::default());
        off.agent = off.agent.with_lister(Arc::new(FixedLister));
        off.agent.run("hi", &RecordingConsole::default()).await.unwrap();
        assert!(!off.provider.requests()[0].system.contains("Cargo.toml"));

        let flags = AgentFlags {
            list_directory: true,
            ..AgentFlags::default()
        };
        let mut on = fixture(dir.path(), vec![text_reply("ok")], flags);
        on.agent = on.agent.with_lister(Arc::new(FixedLister));
        on.agent.run("hi", &RecordingConsole::default()).await.unwrap();
        assert!(on.provider.requests()[0].system.contains("src/\n  main.rs"));
    }
}
