//! Workspace similarity search
//!
//! A cheap lexical stand-in for embedding search: every source file in the
//! workspace is reduced to its set of identifiers, and files are ranked by
//! how many identifiers they share with the query.

use crate::tokens::identifier_tokens;
use rayon::prelude::*;
use splice_core::{BoxFuture, RelevantContextSearch};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files larger than this are skipped.
const MAX_FILE_BYTES: u64 = 256 * 1024;

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "js", "jsx", "mjs", "ts", "tsx", "py", "go", "java", "kt", "swift", "c", "h", "cc",
    "cpp", "hpp", "cs", "rb", "php", "dart", "scala", "lua",
];

#[derive(Debug, Clone)]
pub struct RankedFile {
    /// Path relative to the workspace root.
    pub path: PathBuf,
    pub score: f64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct WorkspaceSearch {
    root: PathBuf,
    max_files: usize,
    max_chars_per_file: usize,
}

impl WorkspaceSearch {
    pub fn new(root: impl Into<PathBuf>, max_files: usize, max_chars_per_file: usize) -> Self {
        Self {
            root: root.into(),
            max_files,
            max_chars_per_file,
        }
    }

    /// Best matches for `query`, highest score first.
    pub fn rank(&self, query: &str, exclude: Option<&Path>) -> Vec<RankedFile> {
        if self.max_files == 0 {
            return Vec::new();
        }
        let query_tokens = identifier_tokens(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let excluded = exclude.map(canonical);

        let candidates: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
            .filter(|e| e.metadata().map(|m| m.len() <= MAX_FILE_BYTES).unwrap_or(false))
            .map(|e| e.into_path())
            .filter(|p| excluded.as_ref() != Some(&canonical(p)))
            .collect();

        let mut ranked: Vec<RankedFile> = candidates
            .par_iter()
            .filter_map(|path| {
                let content = std::fs::read_to_string(path).ok()?;
                let tokens = identifier_tokens(&content);
                let shared = tokens.intersection(&query_tokens).count();
                if shared == 0 {
                    return None;
                }
                let score = shared as f64 / (tokens.len() as f64).sqrt();
                Some(RankedFile {
                    path: path.strip_prefix(&self.root).unwrap_or(path).to_path_buf(),
                    score,
                    content,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        ranked.truncate(self.max_files);
        ranked
    }

    /// Ranked files rendered as prompt context.
    pub fn render(&self, ranked: &[RankedFile]) -> String {
        ranked
            .iter()
            .map(|file| {
                format!(
                    "File: {}\n```\n{}\n```\n",
                    file.path.display(),
                    truncate_chars(&file.content, self.max_chars_per_file).trim_end()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RelevantContextSearch for WorkspaceSearch {
    fn find_similar<'a>(
        &'a self,
        query: &'a str,
        exclude: Option<&'a Path>,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let search = self.clone();
            let query = query.to_string();
            let exclude = exclude.map(Path::to_path_buf);
            let rendered = tokio::task::spawn_blocking(move || {
                let ranked = search.rank(&query, exclude.as_deref());
                search.render(&ranked)
            })
            .await
            .map_err(|e| anyhow::anyhow!("Workspace search failed: {}", e))?;
            tracing::debug!(chars = rendered.len(), "workspace search finished");
            Ok(rendered)
        })
    }
}

fn is_ignored(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let ignored = [
        "target",
        "node_modules",
        ".git",
        ".svn",
        ".hg",
        "dist",
        "build",
        "out",
        "__pycache__",
        ".pytest_cache",
        "vendor",
        ".idea",
        ".vscode",
    ];

    ignored.contains(&name) || name.starts_with('.')
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}\n... (truncated)", &s[..byte]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(
            root.join("src/payments.rs"),
            "fn charge_customer(invoice: Invoice) -> Receipt { todo!() }",
        )
        .unwrap();
        fs::write(root.join("src/other.rs"), "fn unrelated_helper() {}").unwrap();
        fs::write(root.join("src/notes.md"), "charge_customer invoice receipt").unwrap();
        fs::write(
            root.join("target/payments_copy.rs"),
            "fn charge_customer(invoice: Invoice) {}",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_rank_prefers_overlap_and_skips_ignored() {
        let dir = workspace();
        let search = WorkspaceSearch::new(dir.path(), 5, 1000);
        let ranked = search.rank("charge_customer(invoice)", None);

        let paths: Vec<_> = ranked.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("src/payments.rs")]);
    }

    #[test]
    fn test_exclude_current_file() {
        let dir = workspace();
        let search = WorkspaceSearch::new(dir.path(), 5, 1000);
        let ranked = search.rank("charge_customer", Some(&dir.path().join("src/payments.rs")));
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_render_truncates() {
        let search = WorkspaceSearch::new(".", 1, 4);
        let rendered = search.render(&[RankedFile {
            path: PathBuf::from("src/a.rs"),
            score: 1.0,
            content: "abcdefgh".to_string(),
        }]);
        assert_eq!(rendered, "File: src/a.rs\n```\nabcd\n... (truncated)\n```\n");
    }

    #[tokio::test]
    async fn test_find_similar_renders_blocks() {
        let dir = workspace();
        let search = WorkspaceSearch::new(dir.path(), 2, 1000);
        let text = search.find_similar("Receipt", None).await.unwrap();
        assert!(text.starts_with("File: src/payments.rs\n```\n"));
        assert!(search.find_similar("", None).await.unwrap().is_empty());
    }
}
