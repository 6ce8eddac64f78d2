//! Splice - AI code insertion from the terminal
//!
//! Generates code at a cursor position or proposes an optimized selection,
//! trimming whatever the model repeats from the surrounding file before the
//! result touches the document.

mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use splice_adapters::{
    Config, FileEditor, OutlineContextProvider, UnifiedDiffPresenter, UsageStore, WorkspaceSearch,
};
use splice_core::extract::FencedCodeExtractor;
use splice_core::index::{self, Language};
use splice_core::{Document, LineRange, TextRange};
use splice_engine::{Collaborators, InsertionOrchestrator, OpenRouterClient, OrchestratorOptions};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use terminal::{StderrNotifier, TerminalProgress};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Complete {
            file,
            at,
            root,
            language,
        } => {
            let mut editor = FileEditor::open(&file)?.with_cursor(at);
            let orchestrator = build_orchestrator(&root, language.map(Into::into), false)?;
            let inserted = orchestrator.complete_inline(&mut editor).await;
            Ok(exit_for(&inserted))
        }
        Command::Optimize {
            file,
            select,
            lines,
            symbol,
            apply,
            language,
        } => {
            let language = language.map(Language::from);
            let mut editor = FileEditor::open(&file)?;
            if let Some(range) = select {
                editor = editor.with_selection(range);
            }
            let document = Document::new(editor.text()).with_path(&file);
            let fallback = fallback_range(&document, lines, symbol.as_deref(), language);

            let root = file.parent().map(Path::to_path_buf).unwrap_or_default();
            let orchestrator = build_orchestrator(&root, language, apply)?;
            let proposed = orchestrator
                .optimize(&editor, fallback, symbol.as_deref())
                .await;
            Ok(exit_for(&proposed))
        }
        Command::Reconcile {
            file,
            generated,
            lines,
        } => {
            reconcile_files(&file, generated.as_deref(), lines)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Usage { key } => {
            show_usage(&key)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `SPLICE_LOG` wins over `-v`; the default keeps stderr quiet apart from warnings.
fn init_logging(verbose: u8) {
    let filter = std::env::var("SPLICE_LOG").unwrap_or_else(|_| {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_orchestrator(
    root: &Path,
    language_hint: Option<Language>,
    apply: bool,
) -> Result<InsertionOrchestrator> {
    let config = Config::load();
    let generator = OpenRouterClient::from_config(&config)?;
    tracing::debug!(model = generator.model(), "using generation backend");

    let extractor = match language_hint.and_then(|l| l.fence_tag()) {
        Some(tag) => FencedCodeExtractor::preferring(tag),
        None => FencedCodeExtractor::new(),
    };

    let collab = Collaborators {
        generator: Arc::new(generator),
        extractor: Arc::new(extractor),
        search: Arc::new(WorkspaceSearch::new(
            root,
            config.max_relevant_files,
            config.max_context_chars,
        )),
        symbols: Arc::new(OutlineContextProvider::new()),
        presenter: Arc::new(UnifiedDiffPresenter::stdout(apply)),
        usage: Arc::new(UsageStore::open_default()?),
        notifier: Arc::new(StderrNotifier),
        progress: Arc::new(TerminalProgress::new()),
    };

    let options = OrchestratorOptions {
        language_hint,
        ..OrchestratorOptions::from_config(&config)
    };
    Ok(InsertionOrchestrator::new(collab, options))
}

/// Range optimized when the command line gives no selection: explicit lines
/// first, then the named symbol's definition.
fn fallback_range(
    document: &Document,
    lines: Option<LineRange>,
    symbol: Option<&str>,
    language_hint: Option<Language>,
) -> Option<TextRange> {
    if let Some(lines) = lines {
        return Some(document.full_lines(lines));
    }

    let name = symbol?;
    let language = match document.language() {
        Language::Unknown => language_hint.unwrap_or(Language::Unknown),
        language => language,
    };
    let symbols = match index::outline(language, &document.text) {
        Ok(symbols) => symbols,
        Err(err) => {
            tracing::warn!(error = %err, "could not outline document");
            return None;
        }
    };

    let Some(found) = index::symbol_named(&symbols, name) else {
        tracing::warn!(symbol = name, "symbol not found in document");
        return None;
    };
    Some(document.full_lines(LineRange {
        start: found.line,
        end: found.end_line,
    }))
}

fn reconcile_files(file: &Path, generated: Option<&Path>, lines: LineRange) -> Result<()> {
    let document = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let generated = match generated {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let result =
        splice_core::reconcile_detailed(&document, generated.trim_end_matches('\n'), lines);
    tracing::info!(
        trimmed_leading = result.trimmed_leading,
        trimmed_trailing = result.trimmed_trailing,
        "reconciled block"
    );
    println!("{}", result.text);
    Ok(())
}

fn show_usage(key: &str) -> Result<()> {
    let store = UsageStore::open_default()?;
    match store.entry(key)? {
        Some(entry) => eprintln!(
            "  {}: {} (last updated {})",
            key,
            entry.count,
            entry.updated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => eprintln!("  {}: 0", key),
    }
    eprintln!("  Usage file: {}", store.path().display());
    Ok(())
}

/// An empty result means nothing was produced; the flow has already said why.
fn exit_for(result: &str) -> ExitCode {
    if result.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
