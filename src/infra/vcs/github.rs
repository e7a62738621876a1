use crate::application::review::annotate::AnnotationPoster;
use crate::domain::{Comment, Conclusion};
use crate::infra::config::{Config, load_config};
use crate::infra::shell;
use crate::infra::vcs::traits::{
    CheckRunHandle, CheckRunTarget, CheckRunUpdate, CheckRuns, ReviewHost,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubPrRef {
    pub owner: String,
    pub repo: String,
    pub number: u32,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct GitHubPrMetadata {
    pub title: String,
    pub url: String,
    pub head_sha: Option<String>,
}

lazy_static! {
    static ref GH_PR_URL_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?github\.com/([^/]+)/([^/]+)/pull/(\d+)")
            .expect("github pr url regex");
    static ref GH_OWNER_REPO_NUM_RE: Regex =
        Regex::new(r"^([^/\s]+)/([^#\s]+)#(\d+)$").expect("github owner/repo#num regex");
}

pub fn parse_pr_ref(input: &str) -> Option<GitHubPrRef> {
    let trimmed = input.trim();
    let caps = GH_PR_URL_RE
        .captures(trimmed)
        .or_else(|| GH_OWNER_REPO_NUM_RE.captures(trimmed))?;

    let owner = caps.get(1)?.as_str().to_string();
    let repo = caps.get(2)?.as_str().to_string();
    let number: u32 = caps.get(3)?.as_str().parse().ok()?;
    let url = format!("https://github.com/{owner}/{repo}/pull/{number}");
    Some(GitHubPrRef {
        owner,
        repo,
        number,
        url,
    })
}

#[derive(Debug, Deserialize)]
struct GhPrViewJson {
    title: String,
    url: String,
    #[serde(rename = "headRefOid")]
    head_ref_oid: Option<String>,
}

pub async fn fetch_pr_metadata(pr: &GitHubPrRef) -> Result<GitHubPrMetadata> {
    let args = [
        "pr".to_string(),
        "view".to_string(),
        pr.url.clone(),
        "--json".to_string(),
        "title,url,headRefOid".to_string(),
    ];
    let json = shell::run("gh", &args, None).await?;
    let parsed: GhPrViewJson = serde_json::from_str(&json).context("parse `gh pr view` json")?;

    Ok(GitHubPrMetadata {
        title: parsed.title,
        url: parsed.url,
        head_sha: parsed.head_ref_oid,
    })
}

pub async fn fetch_pr_diff(pr: &GitHubPrRef) -> Result<String> {
    let args = ["pr".to_string(), "diff".to_string(), pr.url.clone()];
    shell::run("gh", &args, None).await
}

/// `gh api` call with a JSON body on stdin.
async fn gh_api(
    method: &str,
    endpoint: &str,
    payload: &serde_json::Value,
) -> Result<serde_json::Value> {
    let args = [
        "api".to_string(),
        endpoint.to_string(),
        "--method".to_string(),
        method.to_string(),
        "-H".to_string(),
        "Accept: application/vnd.github+json".to_string(),
        "--input".to_string(),
        "-".to_string(),
    ];
    let body = payload.to_string();
    let json = shell::run("gh", &args, Some(body.as_bytes())).await?;
    if json.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&json).context("parse `gh api` response json")
}

fn parse_check_run(json: &serde_json::Value) -> Result<CheckRunHandle> {
    let id = json
        .get("id")
        .and_then(|v| v.as_u64())
        .context("Missing check run id in GitHub response")?;
    let url = json
        .get("html_url")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Ok(CheckRunHandle { id, url })
}

/// Check runs backed by the GitHub REST API through the `gh` CLI.
#[derive(Debug, Default)]
pub struct GhCheckRuns;

#[async_trait]
impl CheckRuns for GhCheckRuns {
    async fn create(&self, target: &CheckRunTarget) -> Result<CheckRunHandle> {
        let payload = serde_json::json!({
            "name": target.name,
            "head_sha": target.head_sha,
            "status": "in_progress",
        });
        let endpoint = format!("repos/{}/{}/check-runs", target.owner, target.repo);
        let response = gh_api("POST", &endpoint, &payload)
            .await
            .context("create check run")?;
        parse_check_run(&response)
    }

    async fn update(
        &self,
        target: &CheckRunTarget,
        run: &CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<()> {
        let endpoint = format!(
            "repos/{}/{}/check-runs/{}",
            target.owner, target.repo, run.id
        );
        gh_api("PATCH", &endpoint, &update.to_payload())
            .await
            .with_context(|| format!("update check run {}", run.id))?;
        Ok(())
    }
}

/// A GitHub pull request: diff from `gh pr diff`, results as a check run.
pub struct GitHubHost {
    pr: GitHubPrRef,
    config_path: Option<PathBuf>,
    head_sha: Option<String>,
}

impl GitHubHost {
    pub fn new(pr: GitHubPrRef) -> Self {
        Self {
            pr,
            config_path: None,
            head_sha: None,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Reports on `sha` instead of the pull request's current head.
    pub fn with_head_sha(mut self, sha: Option<String>) -> Self {
        self.head_sha = sha;
        self
    }

    pub fn pr(&self) -> &GitHubPrRef {
        &self.pr
    }

    async fn resolve_head_sha(&self) -> Result<String> {
        if let Some(sha) = &self.head_sha {
            return Ok(sha.clone());
        }
        let metadata = fetch_pr_metadata(&self.pr).await?;
        log::debug!("Resolved head of \"{}\" ({})", metadata.title, metadata.url);
        metadata
            .head_sha
            .with_context(|| format!("no head commit for {}", self.pr.url))
    }
}

#[async_trait]
impl ReviewHost for GitHubHost {
    fn id(&self) -> &str {
        "github"
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn load_config(&self) -> Result<Config> {
        load_config(self.config_path.as_deref())
    }

    async fn get_diff(&self) -> Result<String> {
        fetch_pr_diff(&self.pr).await
    }

    async fn write_comments(&self, comments: &[Comment], config: &Config) -> Result<Conclusion> {
        let target = CheckRunTarget {
            owner: self.pr.owner.clone(),
            repo: self.pr.repo.clone(),
            head_sha: self.resolve_head_sha().await?,
            name: config.check_name.clone(),
        };

        let checks = GhCheckRuns;
        let outcome = AnnotationPoster::new(&checks, target)
            .with_batch_size(config.annotation_batch_size)
            .post(comments)
            .await?;
        if outcome.failed_batches > 0 {
            log::warn!(
                "{} of {} annotation batches were rejected",
                outcome.failed_batches,
                outcome.batches
            );
        }
        if let Some(url) = &outcome.run.url {
            log::info!("Check run: {url}");
        }

        outcome.conclusion().context("check run was not completed")
    }
}
