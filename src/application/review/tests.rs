use crate::application::review::annotate::*;
use crate::application::review::pipeline::*;
use crate::domain::*;
use crate::infra::config::Config;
use crate::infra::scan::regex_inspector::RegexInspector;
use crate::infra::vcs::traits::*;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every check-run call and fails the updates listed in `fail_updates`.
#[derive(Default)]
struct RecordingChecks {
    updates: Mutex<Vec<CheckRunUpdate>>,
    fail_updates: Vec<usize>,
    fail_create: bool,
}

impl RecordingChecks {
    fn failing(fail_updates: Vec<usize>) -> Self {
        Self {
            fail_updates,
            ..Default::default()
        }
    }

    fn updates(&self) -> Vec<CheckRunUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckRuns for RecordingChecks {
    async fn create(&self, _target: &CheckRunTarget) -> Result<CheckRunHandle> {
        if self.fail_create {
            anyhow::bail!("403 Resource not accessible by integration");
        }
        Ok(CheckRunHandle {
            id: 77,
            url: Some("https://github.com/o/r/runs/77".into()),
        })
    }

    async fn update(
        &self,
        _target: &CheckRunTarget,
        run: &CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<()> {
        assert_eq!(run.id, 77);
        let mut updates = self.updates.lock().unwrap();
        let idx = updates.len();
        updates.push(update.clone());
        if self.fail_updates.contains(&idx) {
            anyhow::bail!("502 Bad Gateway");
        }
        Ok(())
    }
}

fn target() -> CheckRunTarget {
    CheckRunTarget {
        owner: "o".into(),
        repo: "r".into(),
        head_sha: "abc123".into(),
        name: "leakwatch".into(),
    }
}

fn comments(n: usize) -> Vec<Comment> {
    (0..n)
        .map(|i| Comment {
            title: "Detected EMAIL_ADDRESS".into(),
            body: "Potentially sensitive data detected: `jo********`".into(),
            path: format!("src/file_{}.rs", i % 3),
            line: i as u32 + 1,
        })
        .collect()
}

#[tokio::test]
async fn test_poster_splits_into_capped_batches() {
    let checks = RecordingChecks::default();
    let outcome = AnnotationPoster::new(&checks, target())
        .with_batch_size(50)
        .post(&comments(120))
        .await
        .unwrap();

    let updates = checks.updates();
    let sizes: Vec<usize> = updates.iter().map(|u| u.annotations.len()).collect();
    assert_eq!(sizes, vec![50, 50, 20]);

    assert!(updates[0].status.is_none());
    assert!(updates[1].status.is_none());
    assert_eq!(updates[2].status, Some(RunStatus::Completed));
    assert_eq!(updates[2].conclusion, Some(Conclusion::Failure));
    assert_eq!(updates[2].summary, "120 potentially sensitive items");
    assert_eq!(updates[2].images.len(), 1);

    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.failed_batches, 0);
    assert_eq!(outcome.conclusion(), Some(Conclusion::Failure));
}

#[tokio::test]
async fn test_poster_without_comments_succeeds_in_one_update() {
    let checks = RecordingChecks::default();
    let outcome = AnnotationPoster::new(&checks, target())
        .post(&[])
        .await
        .unwrap();

    let updates = checks.updates();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].annotations.is_empty());
    assert!(updates[0].images.is_empty());
    assert_eq!(updates[0].conclusion, Some(Conclusion::Success));
    assert_eq!(updates[0].summary, "No potentially sensitive items found");
    assert_eq!(outcome.state, RunState::Completed(Conclusion::Success));
}

#[tokio::test]
async fn test_poster_exact_multiple_closes_with_full_batch() {
    let checks = RecordingChecks::default();
    AnnotationPoster::new(&checks, target())
        .with_batch_size(50)
        .post(&comments(100))
        .await
        .unwrap();

    let updates = checks.updates();
    let sizes: Vec<usize> = updates.iter().map(|u| u.annotations.len()).collect();
    assert_eq!(sizes, vec![50, 50]);
}

#[tokio::test]
async fn test_poster_intermediate_failure_is_not_fatal() {
    let checks = RecordingChecks::failing(vec![0]);
    let outcome = AnnotationPoster::new(&checks, target())
        .with_batch_size(50)
        .post(&comments(120))
        .await
        .unwrap();

    assert_eq!(checks.updates().len(), 3);
    assert_eq!(outcome.failed_batches, 1);
    assert_eq!(outcome.conclusion(), Some(Conclusion::Failure));
}

#[tokio::test]
async fn test_poster_terminal_failure_is_fatal() {
    let checks = RecordingChecks::failing(vec![2]);
    let err = AnnotationPoster::new(&checks, target())
        .with_batch_size(50)
        .post(&comments(120))
        .await
        .unwrap_err();

    assert!(matches!(err, AnnotationError::Complete { run_id: 77, .. }));
}

#[tokio::test]
async fn test_poster_create_failure() {
    let checks = RecordingChecks {
        fail_create: true,
        ..Default::default()
    };
    let err = AnnotationPoster::new(&checks, target())
        .post(&comments(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AnnotationError::Create(_)));
    assert!(checks.updates().is_empty());
}

#[tokio::test]
async fn test_poster_rejects_zero_batch_size() {
    let checks = RecordingChecks::default();
    let err = AnnotationPoster::new(&checks, target())
        .with_batch_size(0)
        .post(&comments(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::ZeroBatchSize));
}

const CARD_DIFF: &str = "\
diff --git a/notes.txt b/notes.txt
--- a/notes.txt
+++ b/notes.txt
@@ -1,2 +1,3 @@
 hello
-old line with 4111-1111-1111-1111
+4242-4242-4242-4242 is my card
+nothing to see here
";

fn card_policy() -> DetectorPolicy {
    DetectorPolicy::new().with("CREDIT_CARD_NUMBER", Likelihood::Possible)
}

fn card_settings(policy: DetectorPolicy) -> ScanSettings {
    let config = Config {
        detectors: policy,
        ..Config::default()
    };
    ScanSettings::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_scan_diff_reports_card_number() {
    let files = crate::infra::diff::parse_diff(CARD_DIFF).unwrap();
    let settings = card_settings(card_policy());

    let comments = scan_diff(files, &RegexInspector::new(), &settings)
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    let comment = &comments[0];
    assert_eq!(comment.title, "Detected CREDIT_CARD_NUMBER");
    assert!(comment.body.contains("42********"));
    assert!(!comment.body.contains("4242-4242-4242-4242"));
    assert_eq!(comment.path, "notes.txt");
    assert_eq!(comment.line, 2);
}

#[tokio::test]
async fn test_scan_diff_ignores_deleted_lines() {
    let files = crate::infra::diff::parse_diff(CARD_DIFF).unwrap();
    let settings = card_settings(card_policy());

    let comments = scan_diff(files, &RegexInspector::new(), &settings)
        .await
        .unwrap();
    assert!(comments.iter().all(|c| !c.body.contains("41")));
}

#[tokio::test]
async fn test_scan_diff_honours_exclusions() {
    let files = crate::infra::diff::parse_diff(CARD_DIFF).unwrap();
    let config = Config {
        detectors: card_policy(),
        exclusions: vec![ExclusionRule::Exact("4242-4242-4242-4242".into())],
        ..Config::default()
    };
    let settings = ScanSettings::from_config(&config).unwrap();

    let comments = scan_diff(files, &RegexInspector::new(), &settings)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_scan_diff_with_empty_policy_reports_nothing() {
    let files = crate::infra::diff::parse_diff(CARD_DIFF).unwrap();
    let settings = card_settings(DetectorPolicy::new());
    let comments = scan_diff(files, &RegexInspector::new(), &settings)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

struct StubHost {
    diff: String,
    written: Mutex<Vec<Comment>>,
}

#[async_trait]
impl ReviewHost for StubHost {
    fn id(&self) -> &str {
        "stub"
    }

    fn name(&self) -> &str {
        "Stub"
    }

    fn load_config(&self) -> Result<Config> {
        Ok(Config::default())
    }

    async fn get_diff(&self) -> Result<String> {
        Ok(self.diff.clone())
    }

    async fn write_comments(&self, comments: &[Comment], _config: &Config) -> Result<Conclusion> {
        self.written.lock().unwrap().extend_from_slice(comments);
        Ok(if comments.is_empty() {
            Conclusion::Success
        } else {
            Conclusion::Failure
        })
    }
}

#[tokio::test]
async fn test_run_hands_comments_to_host() {
    let host = StubHost {
        diff: CARD_DIFF.to_string(),
        written: Mutex::new(Vec::new()),
    };
    let config = Config {
        detectors: card_policy(),
        ..Config::default()
    };

    let report = run(&host, &RegexInspector::new(), &config).await.unwrap();
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.comments.len(), 1);
    assert_eq!(report.conclusion, Conclusion::Failure);
    assert_eq!(*host.written.lock().unwrap(), report.comments);
}

#[tokio::test]
async fn test_run_surfaces_parse_errors() {
    let host = StubHost {
        diff: "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n context\n".to_string(),
        written: Mutex::new(Vec::new()),
    };
    let err = run(&host, &RegexInspector::new(), &Config::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Diff(DiffError::TruncatedHunk { .. })
    ));
    assert!(host.written.lock().unwrap().is_empty());
}

const DELETIONS_ONLY_DIFF: &str = "\
--- a/old.txt
+++ b/old.txt
@@ -1,2 +1,1 @@
 keep
-gone
";

#[tokio::test]
async fn test_run_counts_only_files_with_added_lines() {
    let diff = format!("{CARD_DIFF}{DELETIONS_ONLY_DIFF}");
    let host = StubHost {
        diff,
        written: Mutex::new(Vec::new()),
    };
    let config = Config {
        detectors: card_policy(),
        ..Config::default()
    };

    let report = run(&host, &RegexInspector::new(), &config).await.unwrap();
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.comments.len(), 1);
    assert_eq!(report.comments[0].path, "notes.txt");
}

#[tokio::test]
async fn test_scan_added_lines_matches_scan_diff() {
    let mut files = crate::infra::diff::parse_diff(CARD_DIFF).unwrap();
    let settings = card_settings(card_policy());

    let expected = scan_diff(files.clone(), &RegexInspector::new(), &settings)
        .await
        .unwrap();
    crate::infra::diff::retain_added_lines(&mut files);
    let comments = scan_added_lines(&files, &RegexInspector::new(), &settings)
        .await
        .unwrap();
    assert_eq!(comments, expected);
}
