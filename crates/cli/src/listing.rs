//! Directory tree for `--ls` mode.
//!
//! Entries are listed by path relative to the root, children indented two
//! spaces under their directory. Names starting with `.git` are skipped, and
//! `.gitignore` rules are honored whether or not the root is a repository.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use shellmate_agent::WorkspaceLister;
use tracing::debug;

pub struct DirectoryLister {
    root: PathBuf,
}

impl DirectoryLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WorkspaceLister for DirectoryLister {
    fn list(&self) -> String {
        let mut builder = WalkBuilder::new(&self.root);
        builder.hidden(false);
        builder.follow_links(false);
        builder.parents(false);
        builder.git_ignore(true);
        builder.git_global(false);
        builder.git_exclude(false);
        builder.require_git(false);
        builder.sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with(".git")
        });

        let mut lines = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let indent = "  ".repeat(entry.depth() - 1);
            let relative = relative_path(&self.root, entry.path());
            if entry.file_type().is_some_and(|t| t.is_dir()) {
                lines.push(format!("{indent}{relative}/"));
            } else {
                lines.push(format!("{indent}{relative}"));
            }
        }
        lines.join("\n")
    }
}

/// `path` relative to `root`, with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
