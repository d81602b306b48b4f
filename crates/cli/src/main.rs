//! shellmate, a terminal assistant.
//!
//! Usage: `shellmate [OPTIONS] [QUERY]...`
//!
//! A query given on the command line runs first; after that queries are read
//! from the prompt until empty input, `exit`, `quit`, or end of input.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shellmate_agent::{Agent, RetryPolicy};
use shellmate_config::AppConfig;
use shellmate_core::environment::EnvironmentSnapshot;
use shellmate_memory::{HistoryFile, NoteStore};
use tracing::info;

mod listing;
mod repl;
mod terminal;

use listing::DirectoryLister;
use terminal::TerminalConsole;

#[derive(Parser)]
#[command(
    name = "shellmate",
    about = "Help with terminal commands, code, and other questions",
    version
)]
struct Cli {
    /// Use chat history to improve responses
    #[arg(short = 'm', long)]
    memory: bool,

    /// Include a listing of the working directory in the prompt
    #[arg(short = 'l', long = "ls")]
    list_directory: bool,

    /// Run tools without asking for confirmation
    #[arg(short = 'a', long)]
    always_allow: bool,

    /// Model to use; names starting with "claude" use the Anthropic API
    #[arg(long)]
    model: Option<String>,

    /// Log to stderr at debug level instead of to debug.log
    #[arg(short, long)]
    verbose: bool,

    /// Initial query
    query: Vec<String>,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    // Keep log lines out of the transcript
    let dir = AppConfig::config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("debug.log"))
        .context("Failed to open debug.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = AppConfig::load().context("Failed to load config")?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    let mut flags = config.agent.flags();
    flags.use_memory |= cli.memory;
    flags.list_directory |= cli.list_directory;
    flags.always_allow |= cli.always_allow;

    let environment =
        EnvironmentSnapshot::capture().context("Failed to read the working directory")?;

    let provider = shellmate_providers::build_for_model(&config, &config.model).with_context(|| {
        format!(
            "Set the API key in the environment or in {}",
            AppConfig::config_dir().join("config.toml").display()
        )
    })?;

    let base = AppConfig::config_dir();
    let notes = Arc::new(NoteStore::open(
        config.memory.notes_file(&base),
        config.memory.budget_chars,
    ));
    let tools = Arc::new(shellmate_tools::default_registry(
        environment.cwd.clone(),
        notes.clone(),
        config.python.interpreter.clone(),
    ));

    info!(
        model = %config.model,
        provider = provider.name(),
        use_memory = flags.use_memory,
        list_directory = flags.list_directory,
        always_allow = flags.always_allow,
        "Starting shellmate"
    );

    let mut agent = Agent::new(provider, config.model.clone(), tools, notes, environment.clone())
        .with_flags(flags)
        .with_max_tokens(config.max_tokens)
        .with_max_window(config.agent.max_window)
        .with_max_failed_tool_calls(config.agent.max_failed_tool_calls)
        .with_retry(RetryPolicy {
            max_attempts: config.retry.max_attempts,
            base_delay: config.retry.base_delay(),
            max_delay: config.retry.max_delay(),
        })
        .with_lister(Arc::new(DirectoryLister::new(environment.cwd)))
        .with_history(HistoryFile::new(config.memory.history_file(&base)));

    let console = TerminalConsole::stdio();
    let initial = (!cli.query.is_empty()).then(|| cli.query.join(" "));
    repl::run(&mut agent, &console, initial).await
}
