use crate::domain::{Comment, Conclusion};
use crate::infra::cli::diff::{DiffSource, acquire_diff};
use crate::infra::config::{Config, load_config};
use crate::infra::vcs::traits::ReviewHost;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;

/// The working copy: diff from git or stdin, comments printed to stdout.
pub struct LocalHost {
    source: DiffSource,
    config_path: Option<PathBuf>,
}

impl LocalHost {
    pub fn new(source: DiffSource) -> Self {
        Self {
            source,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn source(&self) -> &DiffSource {
        &self.source
    }
}

/// One comment as a single `path:line: title – body` line.
pub fn render_line(comment: &Comment) -> String {
    let body = comment
        .body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}:{}: {} – {}",
        comment.path, comment.line, comment.title, body
    )
}

#[async_trait]
impl ReviewHost for LocalHost {
    fn id(&self) -> &str {
        "local"
    }

    fn name(&self) -> &str {
        "Local"
    }

    fn load_config(&self) -> Result<Config> {
        load_config(self.config_path.as_deref())
    }

    async fn get_diff(&self) -> Result<String> {
        log::info!("Reading diff from {}", self.source.describe());
        acquire_diff(&self.source).await
    }

    async fn write_comments(&self, comments: &[Comment], _config: &Config) -> Result<Conclusion> {
        let mut stdout = std::io::stdout().lock();
        for comment in comments {
            writeln!(stdout, "{}", render_line(comment))?;
        }

        Ok(if comments.is_empty() {
            Conclusion::Success
        } else {
            Conclusion::Failure
        })
    }
}
