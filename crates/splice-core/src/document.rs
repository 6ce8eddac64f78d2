//! Documents, positions and ranges
//!
//! Lines are zero-based indices into the document split on `'\n'`.
//! Columns count `char`s, offsets are byte offsets into the text.

use crate::index::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A span between two positions, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The inclusive line span touched by this range.
    pub fn line_range(&self) -> LineRange {
        LineRange {
            start: self.start.line,
            end: self.end.line,
        }
    }
}

/// Inclusive span of whole lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// Whether every line of the range exists in a document of `line_count` lines.
    pub fn fits(&self, line_count: usize) -> bool {
        self.end < line_count
    }
}

/// An in-memory snapshot of an editor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.split('\n').nth(index)
    }

    pub fn language(&self) -> Language {
        self.path
            .as_deref()
            .and_then(|p| p.extension())
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Byte offset of a position. Columns past the line end clamp to the line
    /// end, lines past the document end clamp to the document end.
    pub fn offset_at(&self, position: Position) -> usize {
        let mut offset = 0;
        for (index, line) in self.text.split('\n').enumerate() {
            if index == position.line {
                let column = line
                    .char_indices()
                    .nth(position.column)
                    .map(|(byte, _)| byte)
                    .unwrap_or(line.len());
                return offset + column;
            }
            offset += line.len() + 1;
        }
        self.text.len()
    }

    /// Position of the end of the given line (clamped to the last line).
    pub fn line_end(&self, line: usize) -> Position {
        let last = self.line_count().saturating_sub(1);
        let line = line.min(last);
        let column = self.line(line).map(|l| l.chars().count()).unwrap_or(0);
        Position::new(line, column)
    }

    /// A range covering whole lines `range.start..=range.end`.
    pub fn full_lines(&self, range: LineRange) -> TextRange {
        TextRange::new(Position::new(range.start, 0), self.line_end(range.end))
    }

    pub fn text_in(&self, range: TextRange) -> &str {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end);
        &self.text[start..end]
    }

    /// The document text with `range` replaced. The document itself is untouched.
    pub fn splice(&self, range: TextRange, replacement: &str) -> String {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end);
        let mut out = String::with_capacity(self.text.len() + replacement.len());
        out.push_str(&self.text[..start]);
        out.push_str(replacement);
        out.push_str(&self.text[end..]);
        out
    }

    /// The document text with lines `range.start..=range.end` replaced by `replacement`.
    pub fn replace_lines(&self, range: LineRange, replacement: &str) -> String {
        let mut lines = self.lines();
        let start = range.start.min(lines.len());
        let end = (range.end + 1).min(lines.len()).max(start);
        lines.splice(start..end, std::iter::once(replacement));
        lines.join("\n")
    }
}
