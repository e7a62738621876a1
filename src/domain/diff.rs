use serde::{Deserialize, Serialize};
use std::fmt;

/// Path marker used by unified diffs for the missing side of a created or deleted file.
pub const DEV_NULL: &str = "/dev/null";

/// Kind of a hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Unchanged,
    Added,
    Deleted,
}

impl LineType {
    /// The leading marker a unified diff uses for this kind of line.
    pub fn marker(self) -> char {
        match self {
            LineType::Unchanged => ' ',
            LineType::Added => '+',
            LineType::Deleted => '-',
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            ' ' => Some(LineType::Unchanged),
            '+' => Some(LineType::Added),
            '-' => Some(LineType::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineType::Unchanged => "unchanged",
            LineType::Added => "added",
            LineType::Deleted => "deleted",
        };
        write!(f, "{s}")
    }
}

/// A single body line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineType,
    /// Line text with the diff marker stripped.
    pub content: String,
    /// Line number in the old file, 0 for added lines.
    pub lnum_old: u32,
    /// Line number in the new file, 0 for deleted lines.
    pub lnum_new: u32,
    /// 1-based position of the line among all body lines of its file.
    pub lnum_diff: u32,
}

/// One contiguous block of changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// Text following the closing `@@`, usually the enclosing function.
    pub section: Option<String>,
    pub lines: Vec<Line>,
}

/// All changes to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
    /// Header lines preceding the first hunk, verbatim: `diff --git`, `index`,
    /// mode and rename markers.
    pub extended: Vec<String>,
}

impl FileDiff {
    pub fn is_new_file(&self) -> bool {
        self.old_path == DEV_NULL
    }

    pub fn is_deleted_file(&self) -> bool {
        self.new_path == DEV_NULL
    }

    /// The path a reviewer would address this file by.
    pub fn path(&self) -> &str {
        if self.is_deleted_file() {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.hunks.iter().flat_map(|hunk| hunk.lines.iter())
    }

    /// Counts of (added, deleted) lines.
    pub fn stats(&self) -> (usize, usize) {
        self.lines().fold((0, 0), |(add, del), line| match line.kind {
            LineType::Added => (add + 1, del),
            LineType::Deleted => (add, del + 1),
            LineType::Unchanged => (add, del),
        })
    }
}
