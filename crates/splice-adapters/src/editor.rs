//! Editor surface backed by a file on disk

use crate::fsutil::write_atomic;
use splice_core::{Document, EditorSurface, LineRange, Position, TextRange};
use std::path::{Path, PathBuf};

/// A single open file with an optional cursor and selection.
///
/// Edits are written straight back to disk so the next read sees them.
#[derive(Debug, Clone)]
pub struct FileEditor {
    document: Document,
    cursor: Option<Position>,
    selection: Option<TextRange>,
}

impl FileEditor {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Ok(Self {
            document: Document::new(text).with_path(path),
            cursor: None,
            selection: None,
        })
    }

    pub fn with_cursor(mut self, position: Position) -> Self {
        self.cursor = Some(position);
        self
    }

    pub fn with_selection(mut self, range: TextRange) -> Self {
        self.selection = Some(range);
        self
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.document.path().map(Path::to_path_buf)
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }
}

impl EditorSurface for FileEditor {
    fn document(&self) -> Option<Document> {
        Some(self.document.clone())
    }

    fn cursor(&self) -> Option<Position> {
        self.cursor
    }

    fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    fn replace_lines(&mut self, range: LineRange, text: &str) -> anyhow::Result<()> {
        if !range.fits(self.document.line_count()) {
            anyhow::bail!(
                "Line range {}..={} is outside the document ({} lines)",
                range.start,
                range.end,
                self.document.line_count()
            );
        }
        let updated = self.document.replace_lines(range, text);
        if let Some(path) = self.document.path() {
            write_atomic(path, &updated)?;
        }
        self.document.text = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_lines_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "a\nb\nc\n").unwrap();

        let mut editor = FileEditor::open(&path).unwrap().with_cursor(Position::new(1, 0));
        editor.replace_lines(LineRange::single(1), "B1\nB2").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nB1\nB2\nc\n");
        assert_eq!(editor.text(), "a\nB1\nB2\nc\n");
        assert_eq!(editor.cursor(), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.rs");
        std::fs::write(&path, "only").unwrap();

        let mut editor = FileEditor::open(&path).unwrap();
        assert!(editor.replace_lines(LineRange::single(3), "nope").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "only");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(FileEditor::open("/definitely/not/here.rs").is_err());
    }
}
