//! End-to-end wiring: diff text to comments to published annotations.

use super::classify::{ExclusionSet, FindingClassifier};
use super::comments::render_comments;
use crate::domain::{Comment, Conclusion, DetectorPolicy, FileDiff, PipelineError};
use crate::infra::config::Config;
use crate::infra::diff::{parse_diff, retain_added_lines};
use crate::infra::scan::{BatchScanner, Inspector, segment_files};
use crate::infra::vcs::traits::ReviewHost;

/// Everything the scan-and-classify stage needs.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub chunk_size: usize,
    pub batch_size: usize,
    pub concurrency: usize,
    pub policy: DetectorPolicy,
    pub exclusions: ExclusionSet,
}

impl ScanSettings {
    pub fn from_config(config: &Config) -> Result<Self, regex::Error> {
        Ok(Self {
            chunk_size: config.chunk_size,
            batch_size: config.scan_batch_size,
            concurrency: config.scan_concurrency,
            policy: config.detectors.clone(),
            exclusions: ExclusionSet::compile(&config.exclusions)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Files with at least one added line.
    pub files_scanned: usize,
    pub comments: Vec<Comment>,
    pub conclusion: Conclusion,
}

/// Scans added content and returns comments in discovery order.
///
/// Nothing is returned unless every batch succeeds.
pub async fn scan_diff(
    mut files: Vec<FileDiff>,
    inspector: &dyn Inspector,
    settings: &ScanSettings,
) -> Result<Vec<Comment>, PipelineError> {
    retain_added_lines(&mut files);
    scan_added_lines(&files, inspector, settings).await
}

/// Like [`scan_diff`] for files already reduced by [`retain_added_lines`].
pub async fn scan_added_lines(
    files: &[FileDiff],
    inspector: &dyn Inspector,
    settings: &ScanSettings,
) -> Result<Vec<Comment>, PipelineError> {
    if settings.policy.is_empty() {
        log::warn!("No detectors configured; nothing can be reported");
        return Ok(Vec::new());
    }

    let units = segment_files(files, settings.chunk_size)?;
    log::info!(
        "Scanning {} units from {} files with {}",
        units.len(),
        files.len(),
        inspector.id()
    );

    let scanned = BatchScanner::new(inspector)
        .with_batch_size(settings.batch_size)
        .with_concurrency(settings.concurrency)
        .scan(&settings.policy.detectors(), units)
        .await?;

    let classifier = FindingClassifier::new(&settings.policy, &settings.exclusions);
    let confirmed = classifier.classify(scanned);
    log::info!("{} findings confirmed", confirmed.len());
    Ok(render_comments(&confirmed))
}

/// Fetches the host's diff, scans it and hands the comments back to the host.
pub async fn run(
    host: &dyn ReviewHost,
    inspector: &dyn Inspector,
    config: &Config,
) -> Result<RunReport, PipelineError> {
    let settings = ScanSettings::from_config(config)?;

    let diff_text = host.get_diff().await?;
    let mut files = parse_diff(&diff_text)?;
    retain_added_lines(&mut files);
    let files_scanned = files.len();

    let comments = scan_added_lines(&files, inspector, &settings).await?;
    let conclusion = host.write_comments(&comments, config).await?;
    log::info!(
        "{} reported {} comments ({conclusion})",
        host.name(),
        comments.len()
    );

    Ok(RunReport {
        files_scanned,
        comments,
        conclusion,
    })
}
