use serde::{Deserialize, Serialize};
use std::fmt;

/// A rendered, redaction-safe review comment for one confirmed finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub title: String,
    pub body: String,
    pub path: String,
    pub line: u32,
}

/// Severity of a check-run annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLevel {
    Notice,
    #[default]
    Warning,
    Failure,
}

/// A file/line-addressed note attached to a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(rename = "annotation_level")]
    pub level: AnnotationLevel,
    pub title: String,
    pub message: String,
}

impl From<&Comment> for Annotation {
    fn from(comment: &Comment) -> Self {
        Self {
            path: comment.path.clone(),
            start_line: comment.line,
            end_line: comment.line,
            level: AnnotationLevel::Warning,
            title: comment.title.clone(),
            message: comment.body.clone(),
        }
    }
}

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
}

/// Final verdict of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}
