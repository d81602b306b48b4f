//! System prompt assembly.
//!
//! The base text and environment block are fixed for the agent's lifetime.
//! The memory notes and the optional directory listing are re-read every
//! turn, since tools may have changed them.

use shellmate_core::environment::EnvironmentSnapshot;
use shellmate_core::memory::render_notes;

const BASE_PROMPT: &str = "Your primary function is to assist the user with tasks related to \
terminal commands in their respective platform. You can also help with code and other queries. \
Information about the user's platform, environment, and current working directory is provided below.";

/// Produces the directory tree appended to the prompt in `--ls` mode.
pub trait WorkspaceLister: Send + Sync {
    fn list(&self) -> String;
}

pub fn build_system_prompt(
    environment: &EnvironmentSnapshot,
    notes: &[String],
    listing: Option<&str>,
) -> String {
    let mut prompt = format!("{BASE_PROMPT}\n\n{}", environment.render());

    if notes.is_empty() {
        prompt.push_str("\n\nYou have no memory notes yet. Use save_memory to keep facts about the user.");
    } else {
        prompt.push_str(
            "\n\nYour memory notes (remove one with remove_memory and its index):\n\n",
        );
        prompt.push_str(&render_notes(notes));
    }

    if let Some(tree) = listing {
        prompt.push_str(
            "\n\nHere's a list of files and directories in the current working directory:\n\n",
        );
        prompt.push_str(tree);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn env() -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            platform: "linux".into(),
            shell: "/bin/zsh".into(),
            cwd: PathBuf::from("/home/dev/project"),
        }
    }

    #[test]
    fn prompt_includes_environment() {
        let prompt = build_system_prompt(&env(), &[], None);
        assert!(prompt.starts_with("Your primary function"));
        assert!(prompt.contains("- Platform: linux"));
        assert!(prompt.contains("- Environment: /bin/zsh"));
        assert!(prompt.contains("- Current Working Directory: /home/dev/project"));
        assert!(prompt.contains("no memory notes"));
        assert!(!prompt.contains("list of files"));
    }

    #[test]
    fn notes_are_indexed() {
        let notes = vec!["uses fish".to_string(), "prefers rg over grep".to_string()];
        let prompt = build_system_prompt(&env(), &notes, None);
        assert!(prompt.contains("0: uses fish\n1: prefers rg over grep"));
    }

    #[test]
    fn listing_goes_last() {
        let prompt = build_system_prompt(&env(), &[], Some("src/\n  main.rs"));
        assert!(prompt.ends_with("working directory:\n\nsrc/\n  main.rs"));
    }
}
