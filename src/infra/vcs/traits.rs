use crate::domain::{Annotation, Comment, Conclusion, RunStatus};
use crate::infra::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The commit a check run reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunTarget {
    pub owner: String,
    pub repo: String,
    pub head_sha: String,
    pub name: String,
}

/// Reference to a created check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunHandle {
    pub id: u64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunImage {
    pub alt: String,
    pub image_url: String,
}

/// One update to a check run: a batch of annotations and optionally a new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunUpdate {
    pub status: Option<RunStatus>,
    pub conclusion: Option<Conclusion>,
    pub title: String,
    pub summary: String,
    pub annotations: Vec<Annotation>,
    pub images: Vec<CheckRunImage>,
}

impl CheckRunUpdate {
    /// GitHub check-runs API body for this update.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut output = serde_json::json!({
            "title": self.title,
            "summary": self.summary,
            "annotations": self.annotations,
        });
        if !self.images.is_empty() {
            output["images"] = serde_json::json!(self.images);
        }

        let mut payload = serde_json::json!({ "output": output });
        if let Some(status) = self.status {
            payload["status"] = serde_json::json!(status);
        }
        if let Some(conclusion) = self.conclusion {
            payload["conclusion"] = serde_json::json!(conclusion);
        }
        payload
    }
}

/// Host-side CI status objects that carry file/line annotations.
#[async_trait]
pub trait CheckRuns: Send + Sync {
    /// Opens an in-progress run against the target commit.
    async fn create(&self, target: &CheckRunTarget) -> Result<CheckRunHandle>;

    async fn update(
        &self,
        target: &CheckRunTarget,
        run: &CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<()>;
}

/// The capabilities a code-review host offers the pipeline.
#[async_trait]
pub trait ReviewHost: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn load_config(&self) -> Result<Config>;
    async fn get_diff(&self) -> Result<String>;
    /// Publishes the comments and reports the resulting verdict.
    async fn write_comments(&self, comments: &[Comment], config: &Config) -> Result<Conclusion>;
}
