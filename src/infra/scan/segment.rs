//! Splits added-line content into size-bounded scan units.
//!
//! Each unit is at most `chunk_size` bytes and always ends on a character
//! boundary, so a unit can be shorter than the limit but never carries half
//! of a multi-byte character.

use crate::domain::{FileDiff, Line, ScanUnit, SegmentError};

/// Lazily yields the scan units of one line.
#[derive(Debug)]
pub struct Segments<'a> {
    content: &'a str,
    path: &'a str,
    line: u32,
    chunk_size: usize,
    offset: usize,
    done: bool,
}

pub fn segment_line<'a>(line: &'a Line, path: &'a str, chunk_size: usize) -> Segments<'a> {
    Segments {
        content: &line.content,
        path,
        line: line.lnum_new,
        chunk_size,
        offset: 0,
        done: line.content.trim().is_empty(),
    }
}

impl Iterator for Segments<'_> {
    type Item = Result<ScanUnit, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.content.len() {
            return None;
        }
        if self.chunk_size == 0 {
            self.done = true;
            return Some(Err(SegmentError::ZeroChunkSize));
        }

        let mut end = (self.offset + self.chunk_size).min(self.content.len());
        while end > self.offset && !self.content.is_char_boundary(end) {
            end -= 1;
        }
        if end == self.offset {
            self.done = true;
            return Some(Err(SegmentError::NoBoundary {
                path: self.path.to_string(),
                line: self.line,
                offset: self.offset,
                chunk_size: self.chunk_size,
            }));
        }

        let unit = ScanUnit {
            content: self.content[self.offset..end].to_string(),
            path: self.path.to_string(),
            line: self.line,
        };
        self.offset = end;
        Some(Ok(unit))
    }
}

/// Segments every line of every file, in discovery order.
pub fn segment_files(files: &[FileDiff], chunk_size: usize) -> Result<Vec<ScanUnit>, SegmentError> {
    let mut units = Vec::new();
    for file in files {
        let path = file.path();
        for line in file.lines() {
            for unit in segment_line(line, path, chunk_size) {
                units.push(unit?);
            }
        }
    }
    Ok(units)
}
