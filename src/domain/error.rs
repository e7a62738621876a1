//! Domain error types for leakwatch.
//!
//! Each pipeline stage has its own error so callers can tell a malformed
//! diff from a failed remote call. `PipelineError` unifies them for the
//! end-to-end run.

use thiserror::Error;

/// Errors raised while parsing unified diff text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("Malformed hunk header at line {line}: {header}")]
    MalformedHunkHeader { line: usize, header: String },

    #[error("Invalid hunk count at line {line}: {value:?}")]
    InvalidHunkCount { line: usize, value: String },

    #[error("Hunk in {file} lacks {missing_old} old and {missing_new} new lines")]
    TruncatedHunk {
        file: String,
        missing_old: u32,
        missing_new: u32,
    },

    #[error("Unexpected line {line} in hunk body: {content:?}")]
    UnexpectedLine { line: usize, content: String },
}

/// Errors raised while splitting line content into scan units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("No char boundary within {chunk_size} bytes of {path}:{line}+{offset}")]
    NoBoundary {
        path: String,
        line: u32,
        offset: usize,
        chunk_size: usize,
    },
}

/// Errors raised by the remote classification stage.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Inspection request for batch {batch} failed: {source}")]
    Remote {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Batch {batch} returned {actual} results for {expected} items")]
    CardinalityMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Batch size must be greater than zero")]
    ZeroBatchSize,
}

/// A rejected interval insertion. The index is left unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range [{left}, {right}] overlaps an existing range")]
    Overlap { left: usize, right: usize },

    #[error("Range [{left}, {right}] has its left bound after its right bound")]
    Inverted { left: usize, right: usize },
}

/// Errors raised while publishing annotations to a check run.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Failed to create check run: {0}")]
    Create(#[source] anyhow::Error),

    #[error("Failed to complete check run {run_id}: {source}")]
    Complete {
        run_id: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("Annotation batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Unified error for a full pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("Segmentation error: {0}")]
    Segment(#[from] SegmentError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),

    #[error("Invalid exclusion pattern: {0}")]
    Exclusion(#[from] regex::Error),

    #[error("Host error: {0}")]
    Host(#[from] anyhow::Error),
}
