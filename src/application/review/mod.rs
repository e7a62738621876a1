pub mod annotate;
pub mod classify;
pub mod comments;
pub mod pipeline;

#[cfg(test)]
mod tests;

pub use annotate::{AnnotationPoster, RunOutcome, RunState};
pub use classify::{ExclusionSet, FindingClassifier};
pub use comments::{blur, render_comment, render_comments};
pub use pipeline::{RunReport, ScanSettings, run, scan_added_lines, scan_diff};
