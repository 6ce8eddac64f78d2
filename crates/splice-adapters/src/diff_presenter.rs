//! Review surface for proposed rewrites: a unified diff on a writer

use crate::fsutil::write_atomic;
use splice_core::{DiffPresenter, Document};
use std::io::Write;
use std::sync::Mutex;

/// Render a unified diff with three lines of context, or `None` when the
/// texts are identical.
pub fn unified_diff(label: &str, old: &str, new: &str) -> Option<String> {
    if old == new {
        return None;
    }

    let diff = similar::TextDiff::from_lines(old, new);
    let mut output = String::new();
    output.push_str(&format!("--- a/{}\n", label));
    output.push_str(&format!("+++ b/{}\n", label));
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        output.push_str(&hunk.to_string());
    }
    Some(output)
}

/// Count of (added, removed) lines between two texts.
pub fn diff_stats(old: &str, new: &str) -> (usize, usize) {
    let diff = similar::TextDiff::from_lines(old, new);
    let mut added = 0;
    let mut removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Insert => added += 1,
            similar::ChangeTag::Delete => removed += 1,
            similar::ChangeTag::Equal => {}
        }
    }
    (added, removed)
}

/// Prints the proposed change as a unified diff. With `apply` set, the
/// proposed text is also written to the document's file.
pub struct UnifiedDiffPresenter {
    out: Mutex<Box<dyn Write + Send>>,
    apply: bool,
}

impl UnifiedDiffPresenter {
    pub fn new(out: Box<dyn Write + Send>, apply: bool) -> Self {
        Self {
            out: Mutex::new(out),
            apply,
        }
    }

    pub fn stdout(apply: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), apply)
    }
}

impl DiffPresenter for UnifiedDiffPresenter {
    fn present(&self, original: &Document, proposed: &str) -> anyhow::Result<()> {
        let label = original
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "untitled".to_string());

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let Some(diff) = unified_diff(&label, &original.text, proposed) else {
            writeln!(out, "no changes to {}", label)?;
            return Ok(());
        };

        let (added, removed) = diff_stats(&original.text, proposed);
        write!(out, "{}", diff)?;
        writeln!(out, "{} (+{} -{})", label, added, removed)?;
        out.flush()?;

        if self.apply {
            let path = original
                .path()
                .ok_or_else(|| anyhow::anyhow!("Cannot apply changes to an unsaved document"))?;
            write_atomic(path, proposed)?;
            tracing::info!(path = %path.display(), added, removed, "applied proposed change");
        }
        Ok(())
    }
}
