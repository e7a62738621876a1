//! Diff acquisition from various sources.

use crate::infra::shell;
use anyhow::{Context, Result};
use std::io::{IsTerminal, Read};

/// Source of diff input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    /// Diff already read (e.g. from stdin)
    Text(String),

    /// Diff between git refs
    GitDiff { from: String, to: String },

    /// Current working directory uncommitted changes against HEAD
    GitStatus,

    /// A git stash entry
    Stash { index: usize },
}

impl DiffSource {
    pub fn describe(&self) -> String {
        match self {
            DiffSource::Text(_) => "stdin".to_string(),
            DiffSource::GitDiff { from, to } => format!("git diff {from}..{to}"),
            DiffSource::GitStatus => "uncommitted changes".to_string(),
            DiffSource::Stash { index } => format!("stash@{{{index}}}"),
        }
    }
}

/// Read the whole diff from stdin. Fails when stdin is an interactive terminal.
pub fn read_stdin_diff() -> Result<String> {
    if std::io::stdin().is_terminal() {
        anyhow::bail!("No diff on stdin. Try `git diff | leakwatch stdin`.");
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

/// Acquire diff text from a source. An empty diff is returned as-is.
pub async fn acquire_diff(source: &DiffSource) -> Result<String> {
    let args: Vec<String> = match source {
        DiffSource::Text(diff) => return Ok(diff.clone()),
        DiffSource::GitDiff { from, to } => {
            vec!["diff".into(), from.clone(), to.clone()]
        }
        DiffSource::GitStatus => vec!["diff".into(), "HEAD".into()],
        DiffSource::Stash { index } => vec![
            "stash".into(),
            "show".into(),
            "-p".into(),
            format!("stash@{{{index}}}"),
        ],
    };

    let diff = shell::run("git", &args, None).await.map_err(|err| {
        let message = err.to_string();
        if message.contains("unknown revision") {
            anyhow::anyhow!(
                "Could not resolve {}. Run `git branch -a` to see available refs.",
                source.describe()
            )
        } else {
            err
        }
    })?;

    if diff.trim().is_empty() {
        log::info!("No changes found for {}", source.describe());
    }
    Ok(diff)
}
