//! Google Cloud DLP inspector.
//!
//! All items of one request are joined with `\n` into a single content value.
//! DLP reports byte ranges against that joined value, which are mapped back to
//! the owning item through an [`IntervalIndex`].

use super::traits::Inspector;
use crate::domain::{DetectorId, Finding, Likelihood};
use crate::infra::interval::IntervalIndex;
use crate::infra::shell;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::ops::Range;
use std::str::FromStr;
use tokio::sync::OnceCell;

pub const DEFAULT_ENDPOINT: &str = "https://dlp.googleapis.com";

const ITEM_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlpSettings {
    /// Google Cloud project the inspection is billed to.
    pub project: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl DlpSettings {
    pub fn inspect_url(&self) -> String {
        let endpoint = self
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/');
        format!("{endpoint}/v2/projects/{}/content:inspect", self.project)
    }
}

/// Items joined into one payload, with the byte span of each item.
#[derive(Debug)]
pub struct JoinedContent {
    pub value: String,
    spans: IntervalIndex<usize>,
    bounds: Vec<Range<usize>>,
}

impl JoinedContent {
    pub fn new(items: &[String]) -> Self {
        let mut value = String::new();
        let mut spans = IntervalIndex::new();
        let mut bounds = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                value.push_str(ITEM_SEPARATOR);
            }
            let start = value.len();
            value.push_str(item);
            bounds.push(start..value.len());
            if !item.is_empty()
                && let Err(err) = spans.add_range(start, value.len() - 1, idx)
            {
                log::warn!("Skipping item {idx} in joined content: {err}");
            }
        }

        Self {
            value,
            spans,
            bounds,
        }
    }

    /// Maps a byte range of the joined value to (item index, item-relative range).
    pub fn resolve(&self, start: usize, end: usize) -> Option<(usize, Range<usize>)> {
        let idx = *self.spans.get(start)?;
        let item = &self.bounds[idx];
        let end = end.clamp(start, item.end);
        Some((idx, start - item.start..end - item.start))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResponse {
    #[serde(default)]
    result: InspectResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResult {
    #[serde(default)]
    findings: Vec<DlpFinding>,
    #[serde(default)]
    findings_truncated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DlpFinding {
    #[serde(default)]
    quote: String,
    info_type: InfoType,
    #[serde(default)]
    likelihood: String,
    #[serde(default)]
    location: Option<DlpLocation>,
}

#[derive(Debug, Deserialize)]
struct InfoType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DlpLocation {
    #[serde(default)]
    byte_range: Option<DlpRange>,
}

#[derive(Debug, Deserialize)]
struct DlpRange {
    #[serde(default, deserialize_with = "int64_string")]
    start: usize,
    #[serde(default, deserialize_with = "int64_string")]
    end: usize,
}

/// Proto3 JSON encodes int64 fields as strings.
fn int64_string<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

pub fn build_request(detectors: &[DetectorId], content: &JoinedContent) -> serde_json::Value {
    let info_types: Vec<serde_json::Value> = detectors
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();

    serde_json::json!({
        "item": { "value": content.value },
        "inspectConfig": {
            "infoTypes": info_types,
            "minLikelihood": Likelihood::VeryUnlikely.as_str(),
            "includeQuote": true,
        },
    })
}

/// Splits a DLP response into per-item findings.
pub fn map_response(
    response_json: &str,
    content: &JoinedContent,
    item_count: usize,
) -> Result<Vec<Vec<Finding>>> {
    let parsed: InspectResponse =
        serde_json::from_str(response_json).context("parse DLP inspect response")?;
    if parsed.result.findings_truncated {
        log::warn!("DLP truncated findings; some items may be under-reported");
    }

    let mut per_item = vec![Vec::new(); item_count];
    for finding in parsed.result.findings {
        let Ok(likelihood) = Likelihood::from_str(&finding.likelihood) else {
            log::debug!(
                "Ignoring {} finding with likelihood {:?}",
                finding.info_type.name,
                finding.likelihood
            );
            continue;
        };
        let Some(range) = finding.location.and_then(|location| location.byte_range) else {
            log::warn!(
                "Ignoring {} finding without a byte range",
                finding.info_type.name
            );
            continue;
        };
        let Some((idx, byte_range)) = content.resolve(range.start, range.end) else {
            log::warn!(
                "Ignoring {} finding at bytes {}..{} outside any item",
                finding.info_type.name,
                range.start,
                range.end
            );
            continue;
        };

        per_item[idx].push(Finding {
            detector: finding.info_type.name,
            quote: finding.quote,
            likelihood,
            byte_range: Some(byte_range),
        });
    }

    Ok(per_item)
}

pub struct DlpInspector {
    settings: DlpSettings,
    token: OnceCell<String>,
}

impl DlpInspector {
    pub fn new(settings: DlpSettings) -> Self {
        Self {
            settings,
            token: OnceCell::new(),
        }
    }

    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let out = shell::run(
                    "gcloud",
                    &["auth".to_string(), "print-access-token".to_string()],
                    None,
                )
                .await?;
                Ok::<_, anyhow::Error>(out.trim().to_string())
            })
            .await?;
        Ok(token.as_str())
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<String> {
        let token = self.access_token().await?;

        let mut body = tempfile::NamedTempFile::new().context("create DLP request file")?;
        body.write_all(payload.to_string().as_bytes())
            .context("write DLP request file")?;
        body.flush().context("flush DLP request file")?;

        let args = vec![
            "-sS".to_string(),
            "--fail-with-body".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            "-H".to_string(),
            "@-".to_string(),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "--data-binary".to_string(),
            format!("@{}", body.path().display()),
            self.settings.inspect_url(),
        ];
        // The bearer header goes through stdin so the token never shows up in argv.
        let headers = format!("Authorization: Bearer {token}\n");
        shell::run("curl", &args, Some(headers.as_bytes())).await
    }
}

#[async_trait]
impl Inspector for DlpInspector {
    fn id(&self) -> &str {
        "dlp"
    }

    async fn inspect(
        &self,
        detectors: &[DetectorId],
        items: &[String],
    ) -> Result<Vec<Vec<Finding>>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let content = JoinedContent::new(items);
        let payload = build_request(detectors, &content);
        let response = self.post(&payload).await?;
        map_response(&response, &content, items.len())
    }
}
