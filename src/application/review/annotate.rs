//! Publishes review comments as check-run annotations.
//!
//! A run is created in progress, fed annotations in batches no larger than
//! the host's cap, and closed by the last batch. Intermediate batches are
//! best-effort; the closing update must succeed.

use crate::domain::{Annotation, AnnotationError, Comment, Conclusion, RunStatus};
use crate::infra::vcs::traits::{
    CheckRunHandle, CheckRunImage, CheckRunTarget, CheckRunUpdate, CheckRuns,
};

/// Maximum annotations GitHub accepts per check-run update.
pub const DEFAULT_BATCH_SIZE: usize = 50;

pub const RUN_TITLE: &str = "Sensitive data scan";
pub const BRANDING_IMAGE_ALT: &str = "leakwatch";
pub const BRANDING_IMAGE_URL: &str =
    "https://raw.githubusercontent.com/leakwatch/leakwatch/main/assets/leakwatch.png";

/// Where a check run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    InProgress { posted: usize },
    Completed(Conclusion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run: CheckRunHandle,
    pub state: RunState,
    /// Updates sent, including the closing one.
    pub batches: usize,
    /// Intermediate updates the host rejected.
    pub failed_batches: usize,
}

impl RunOutcome {
    pub fn conclusion(&self) -> Option<Conclusion> {
        match self.state {
            RunState::Completed(conclusion) => Some(conclusion),
            _ => None,
        }
    }
}

pub fn render_summary(count: usize) -> String {
    match count {
        0 => "No potentially sensitive items found".to_string(),
        1 => "1 potentially sensitive item".to_string(),
        n => format!("{n} potentially sensitive items"),
    }
}

pub struct AnnotationPoster<'a> {
    checks: &'a dyn CheckRuns,
    target: CheckRunTarget,
    batch_size: usize,
}

impl<'a> AnnotationPoster<'a> {
    pub fn new(checks: &'a dyn CheckRuns, target: CheckRunTarget) -> Self {
        Self {
            checks,
            target,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub async fn post(&self, comments: &[Comment]) -> Result<RunOutcome, AnnotationError> {
        if self.batch_size == 0 {
            return Err(AnnotationError::ZeroBatchSize);
        }

        let run = self
            .checks
            .create(&self.target)
            .await
            .map_err(AnnotationError::Create)?;
        log::info!(
            "Created check run {} on {}/{}@{}",
            run.id,
            self.target.owner,
            self.target.repo,
            self.target.head_sha
        );

        let annotations: Vec<Annotation> = comments.iter().map(Annotation::from).collect();
        let mut batches = annotations.chunks(self.batch_size).collect::<Vec<_>>();
        let last = batches.pop().unwrap_or(&[]);

        let mut state = RunState::Created;
        let mut posted = 0;
        let mut failed_batches = 0;
        for (idx, batch) in batches.iter().enumerate() {
            let update = self.progress_update(batch);
            match self.checks.update(&self.target, &run, &update).await {
                Ok(()) => {
                    posted += batch.len();
                    state = RunState::InProgress { posted };
                }
                Err(err) => {
                    failed_batches += 1;
                    log::warn!(
                        "Annotation batch {}/{} for check run {} failed: {err:#}",
                        idx + 1,
                        batches.len() + 1,
                        run.id
                    );
                }
            }
        }
        log::debug!("Check run {} state before closing: {state:?}", run.id);

        let conclusion = if annotations.is_empty() {
            Conclusion::Success
        } else {
            Conclusion::Failure
        };
        let update = self.closing_update(last, annotations.len(), conclusion);
        self.checks
            .update(&self.target, &run, &update)
            .await
            .map_err(|source| AnnotationError::Complete {
                run_id: run.id,
                source,
            })?;
        log::info!("Completed check run {} with {conclusion}", run.id);

        Ok(RunOutcome {
            run,
            state: RunState::Completed(conclusion),
            batches: batches.len() + 1,
            failed_batches,
        })
    }

    fn progress_update(&self, batch: &[Annotation]) -> CheckRunUpdate {
        CheckRunUpdate {
            status: None,
            conclusion: None,
            title: RUN_TITLE.to_string(),
            summary: "Scan in progress".to_string(),
            annotations: batch.to_vec(),
            images: Vec::new(),
        }
    }

    fn closing_update(
        &self,
        batch: &[Annotation],
        total: usize,
        conclusion: Conclusion,
    ) -> CheckRunUpdate {
        let images = match conclusion {
            Conclusion::Failure => vec![CheckRunImage {
                alt: BRANDING_IMAGE_ALT.to_string(),
                image_url: BRANDING_IMAGE_URL.to_string(),
            }],
            _ => Vec::new(),
        };
        CheckRunUpdate {
            status: Some(RunStatus::Completed),
            conclusion: Some(conclusion),
            title: RUN_TITLE.to_string(),
            summary: render_summary(total),
            annotations: batch.to_vec(),
            images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summary() {
        assert_eq!(render_summary(0), "No potentially sensitive items found");
        assert_eq!(render_summary(1), "1 potentially sensitive item");
        assert_eq!(render_summary(120), "120 potentially sensitive items");
    }

    #[test]
    fn test_outcome_conclusion() {
        let outcome = RunOutcome {
            run: CheckRunHandle { id: 1, url: None },
            state: RunState::InProgress { posted: 3 },
            batches: 1,
            failed_batches: 0,
        };
        assert_eq!(outcome.conclusion(), None);
    }
}
