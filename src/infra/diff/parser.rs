//! Unified diff parser.
//!
//! Turns raw multi-file `git diff` / `diff -u` output into an ordered list of
//! [`FileDiff`]s. Hunk bodies are consumed by the counts in their `@@` header,
//! so a deleted line that happens to start with `--` is never mistaken for a
//! file header.

use crate::domain::{DEV_NULL, DiffError, FileDiff, Hunk, Line, LineType};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HUNK_HEADER_RE: Regex =
        Regex::new(r"^@@ -([^ ,]+)(?:,([^ ]+))? \+([^ ,]+)(?:,([^ ]+))? @@(.*)$")
            .expect("hunk header regex");
}

pub fn normalize_repo_path(path: &str) -> String {
    let path = path.split('\t').next().unwrap_or(path).trim();
    if path == DEV_NULL {
        return path.to_string();
    }
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

/// Parses raw diff text. Empty input yields an empty list.
pub fn parse_diff(diff_text: &str) -> Result<Vec<FileDiff>, DiffError> {
    let mut parser = Parser::default();
    for (idx, raw) in diff_text.split_terminator('\n').enumerate() {
        parser.feed(idx + 1, raw)?;
    }
    parser.finish()
}

/// Remaining body lines of the hunk being read.
#[derive(Debug, Clone, Copy)]
struct BodyCursor {
    old_remaining: u32,
    new_remaining: u32,
    next_old: u32,
    next_new: u32,
}

impl BodyCursor {
    fn is_open(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }
}

#[derive(Default)]
struct Parser {
    files: Vec<FileDiff>,
    current: Option<FileDiff>,
    cursor: Option<BodyCursor>,
    position: u32,
}

impl Parser {
    fn feed(&mut self, line_no: usize, raw: &str) -> Result<(), DiffError> {
        if self.cursor.is_some_and(|cursor| cursor.is_open()) {
            return self.push_body_line(line_no, raw);
        }
        self.cursor = None;

        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.starts_with('\\') {
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("diff ") {
            self.start_file()?;
            let file = self.current_mut();
            if let Some((old, new)) = git_header_paths(rest) {
                file.old_path = old;
                file.new_path = new;
            }
            file.extended.push(line.to_string());
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if self.header_starts_file() {
                self.start_file()?;
            }
            self.current_mut().old_path = normalize_repo_path(path);
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            if self.header_starts_file() {
                self.start_file()?;
            }
            self.current_mut().new_path = normalize_repo_path(path);
            return Ok(());
        }

        if line.starts_with("@@") {
            return self.start_hunk(line_no, line);
        }

        match self.current.as_mut() {
            Some(file) if file.hunks.is_empty() => {
                apply_extended_header(file, line);
                file.extended.push(line.to_string());
            }
            Some(_) if line.starts_with(['+', '-', ' ']) => {
                return Err(DiffError::UnexpectedLine {
                    line: line_no,
                    content: line.to_string(),
                });
            }
            Some(file) => {
                log::trace!(
                    "Ignoring trailing line {line_no} after hunks of {}",
                    file.path()
                );
            }
            None => {
                log::trace!("Ignoring preamble line {line_no}");
            }
        }
        Ok(())
    }

    /// A file header after hunks belongs to the next file.
    fn header_starts_file(&self) -> bool {
        match &self.current {
            Some(file) => !file.hunks.is_empty(),
            None => true,
        }
    }

    fn current_mut(&mut self) -> &mut FileDiff {
        self.current.get_or_insert_with(FileDiff::default)
    }

    fn start_file(&mut self) -> Result<(), DiffError> {
        self.flush()?;
        self.current = Some(FileDiff::default());
        self.position = 0;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DiffError> {
        if let Some(cursor) = self.cursor.take().filter(|cursor| cursor.is_open()) {
            let file = self
                .current
                .as_ref()
                .map(|file| file.path().to_string())
                .unwrap_or_default();
            return Err(DiffError::TruncatedHunk {
                file,
                missing_old: cursor.old_remaining,
                missing_new: cursor.new_remaining,
            });
        }
        if let Some(file) = self.current.take() {
            self.files.push(file);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<FileDiff>, DiffError> {
        self.flush()?;
        Ok(self.files)
    }

    fn start_hunk(&mut self, line_no: usize, line: &str) -> Result<(), DiffError> {
        if self.current.is_none() {
            return Err(DiffError::UnexpectedLine {
                line: line_no,
                content: line.to_string(),
            });
        }
        let hunk = parse_hunk_header(line_no, line)?;
        self.cursor = Some(BodyCursor {
            old_remaining: hunk.old_lines,
            new_remaining: hunk.new_lines,
            next_old: hunk.old_start,
            next_new: hunk.new_start,
        });
        self.current_mut().hunks.push(hunk);
        Ok(())
    }

    fn push_body_line(&mut self, line_no: usize, raw: &str) -> Result<(), DiffError> {
        // Some tools strip the single space that marks an empty context line.
        let (kind, content) = match raw.chars().next() {
            None => (LineType::Unchanged, ""),
            Some('\\') => return Ok(()),
            Some(marker) => match LineType::from_marker(marker) {
                Some(kind) => (kind, &raw[1..]),
                None => {
                    return Err(DiffError::UnexpectedLine {
                        line: line_no,
                        content: raw.to_string(),
                    });
                }
            },
        };

        let unexpected = || DiffError::UnexpectedLine {
            line: line_no,
            content: raw.to_string(),
        };
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(unexpected());
        };

        let (lnum_old, lnum_new) = match kind {
            LineType::Unchanged => {
                if cursor.old_remaining == 0 || cursor.new_remaining == 0 {
                    return Err(unexpected());
                }
                cursor.old_remaining -= 1;
                cursor.new_remaining -= 1;
                cursor.next_old += 1;
                cursor.next_new += 1;
                (cursor.next_old - 1, cursor.next_new - 1)
            }
            LineType::Added => {
                if cursor.new_remaining == 0 {
                    return Err(unexpected());
                }
                cursor.new_remaining -= 1;
                cursor.next_new += 1;
                (0, cursor.next_new - 1)
            }
            LineType::Deleted => {
                if cursor.old_remaining == 0 {
                    return Err(unexpected());
                }
                cursor.old_remaining -= 1;
                cursor.next_old += 1;
                (cursor.next_old - 1, 0)
            }
        };

        self.position += 1;
        let line = Line {
            kind,
            content: content.to_string(),
            lnum_old,
            lnum_new,
            lnum_diff: self.position,
        };
        let hunk = self
            .current
            .as_mut()
            .and_then(|file| file.hunks.last_mut())
            .ok_or_else(unexpected)?;
        hunk.lines.push(line);
        Ok(())
    }
}

fn parse_hunk_header(line_no: usize, line: &str) -> Result<Hunk, DiffError> {
    let caps = HUNK_HEADER_RE
        .captures(line)
        .ok_or_else(|| DiffError::MalformedHunkHeader {
            line: line_no,
            header: line.to_string(),
        })?;

    let count = |idx: usize| -> Result<u32, DiffError> {
        match caps.get(idx) {
            None => Ok(1),
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .map_err(|_| DiffError::InvalidHunkCount {
                    line: line_no,
                    value: m.as_str().to_string(),
                }),
        }
    };

    let section = caps
        .get(5)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Ok(Hunk {
        old_start: count(1)?,
        old_lines: count(2)?,
        new_start: count(3)?,
        new_lines: count(4)?,
        section,
        lines: Vec::new(),
    })
}

/// Paths from `diff --git a/x b/y`; unreliable when paths contain spaces,
/// so `---`/`+++` and rename markers override them.
fn git_header_paths(rest: &str) -> Option<(String, String)> {
    let rest = rest.strip_prefix("--git ")?;
    let mut parts = rest.split_whitespace();
    let old = parts.next()?;
    let new = parts.next()?;
    Some((normalize_repo_path(old), normalize_repo_path(new)))
}

fn apply_extended_header(file: &mut FileDiff, line: &str) {
    if let Some(path) = line.strip_prefix("rename from ") {
        file.old_path = path.to_string();
    } else if let Some(path) = line.strip_prefix("rename to ") {
        file.new_path = path.to_string();
    } else if let Some(path) = line.strip_prefix("copy from ") {
        file.old_path = path.to_string();
    } else if let Some(path) = line.strip_prefix("copy to ") {
        file.new_path = path.to_string();
    } else if line.starts_with("new file mode") {
        file.old_path = DEV_NULL.to_string();
    } else if line.starts_with("deleted file mode") {
        file.new_path = DEV_NULL.to_string();
    }
}
