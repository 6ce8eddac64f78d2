//! End-to-end completion and optimize flows
//!
//! Each call is a single sequential pipeline: gather context, generate,
//! extract, reconcile, apply. Every failure is caught at the outer boundary
//! of the flow, reported through the notifier and turned into an empty
//! result; nothing propagates to the caller.

use crate::progress::ProgressTicker;
use crate::prompts;
use splice_adapters::{Config, INLINE_COMPLETION_KEY};
use splice_core::extract::CodeExtractor;
use splice_core::index::Language;
use splice_core::sentinel::{mark_cursor, mark_selection, strip_markers};
use splice_core::{
    reconcile_detailed, DiffPresenter, Document, EditorSurface, GenerationService, LineRange,
    Notifier, Position, PreconditionError, ProgressSink, RelevantContextSearch, SpliceError,
    SymbolContextProvider, TextRange, UsageCounter,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

const COMPLETION_PROGRESS_TITLE: &str = "Generating code, please wait.";
const OPTIMIZE_PROGRESS_TITLE: &str = "Optimizing code";
const OPTIMIZE_SUCCESS: &str = "Code optimization successful!";
const OPTIMIZE_EMPTY_RESPONSE: &str = "Failed to optimize code. Please try again.";
const NOTHING_TO_INSERT: &str = "Nothing new to insert";

/// Everything the orchestrator calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn GenerationService>,
    pub extractor: Arc<dyn CodeExtractor>,
    pub search: Arc<dyn RelevantContextSearch>,
    pub symbols: Arc<dyn SymbolContextProvider>,
    pub presenter: Arc<dyn DiffPresenter>,
    pub usage: Arc<dyn UsageCounter>,
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn ProgressSink>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Counter bumped once per completion request.
    pub usage_key: String,
    pub progress_interval: Duration,
    /// Percent added per progress tick; the bar wraps at 100.
    pub progress_step: i32,
    /// Language named in prompts when the document's own is unknown.
    pub language_hint: Option<Language>,
    pub max_context_chars: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            usage_key: INLINE_COMPLETION_KEY.to_string(),
            progress_interval: Duration::from_millis(200),
            progress_step: 10,
            language_hint: None,
            max_context_chars: Config::default().max_context_chars,
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_context_chars: config.max_context_chars,
            ..Self::default()
        }
    }
}

pub struct InsertionOrchestrator {
    collab: Collaborators,
    options: OrchestratorOptions,
}

impl InsertionOrchestrator {
    pub fn new(collab: Collaborators, options: OrchestratorOptions) -> Self {
        Self { collab, options }
    }

    /// Generate code for the cursor line and write it in place of that line.
    ///
    /// Returns the inserted text, or an empty string when nothing was written.
    pub async fn complete_inline(&self, editor: &mut dyn EditorSurface) -> String {
        let span = tracing::info_span!("inline-completion", request_id = %Uuid::new_v4());
        async move {
            tracing::info!(
                event = "inline-completion",
                kind = "create",
                "starting inline completion"
            );
            let _progress = self.start_progress(COMPLETION_PROGRESS_TITLE);

            // Counts requests, not successes.
            if let Err(err) = self.collab.usage.increment_and_get(&self.options.usage_key) {
                tracing::warn!(
                    error = %err,
                    key = %self.options.usage_key,
                    "failed to bump usage counter"
                );
            }

            match self.run_completion(editor).await {
                Ok(text) => text,
                Err(err) => self.report_failure("inline-completion-error", err),
            }
        }
        .instrument(span)
        .await
    }

    /// Propose an optimized version of the selection (or `fallback` when the
    /// selection is empty) and hand the rewritten document to the presenter.
    ///
    /// The editor is never written. Returns the proposed document text, or an
    /// empty string on failure.
    pub async fn optimize(
        &self,
        editor: &dyn EditorSurface,
        fallback: Option<TextRange>,
        symbol_name: Option<&str>,
    ) -> String {
        let span = tracing::info_span!("optimize-code", request_id = %Uuid::new_v4());
        async move {
            tracing::info!(event = "optimize-code", kind = "refactor", "starting optimization");
            match self.run_optimize(editor, fallback, symbol_name).await {
                Ok(proposed) => proposed,
                Err(err) => self.report_failure("optimize-code-error", err),
            }
        }
        .instrument(span)
        .await
    }

    async fn run_completion(&self, editor: &mut dyn EditorSurface) -> Result<String, SpliceError> {
        let document = editor.document().ok_or(PreconditionError::NoActiveEditor)?;
        let cursor = editor.cursor().ok_or(PreconditionError::NoRange)?;
        let current_line = document.line(cursor.line).ok_or(PreconditionError::NoRange)?;

        let query = format!(
            "Current file content:{}\n\nLine of code:{}",
            document.text,
            current_line.trim()
        );
        let (mut context, contextual_code) = futures::join!(
            self.relevant_files(&query, document.path()),
            self.position_context(&document, cursor),
        );
        if let Some(code) = contextual_code.filter(|code| !code.is_empty()) {
            context.push('\n');
            context.push_str(&code);
        }

        let marked = mark_cursor(&document.text, document.offset_at(cursor));
        let messages = prompts::completion_prompt(
            self.language_for(&document),
            &marked,
            &context,
            self.options.max_context_chars,
        );

        let raw = self.collab.generator.complete(&messages).await?;
        let code = self
            .collab
            .extractor
            .extract_code(&raw)
            .ok_or(SpliceError::Extraction)?;

        let line = LineRange::single(cursor.line);
        let reconciled = reconcile_detailed(&document.text, &code, line);
        tracing::debug!(
            trimmed_leading = reconciled.trimmed_leading,
            trimmed_trailing = reconciled.trimmed_trailing,
            "reconciled generated block"
        );

        if reconciled.text.trim().is_empty() {
            self.collab.notifier.info(NOTHING_TO_INSERT);
            return Ok(String::new());
        }

        editor.replace_lines(line, &reconciled.text)?;
        tracing::info!(
            event = "inline-completion-success",
            lines = reconciled.text.lines().count(),
            "inserted completion"
        );
        Ok(reconciled.text)
    }

    async fn run_optimize(
        &self,
        editor: &dyn EditorSurface,
        fallback: Option<TextRange>,
        symbol_name: Option<&str>,
    ) -> Result<String, SpliceError> {
        let document = editor.document().ok_or(PreconditionError::NoActiveEditor)?;
        let range = editor
            .selection()
            .filter(|selection| !selection.is_empty())
            .or(fallback)
            .ok_or(PreconditionError::NoSelection)?;
        if !range.line_range().fits(document.line_count()) {
            return Err(PreconditionError::NoRange.into());
        }

        let marked = mark_selection(
            &document.text,
            document.offset_at(range.start),
            document.offset_at(range.end),
        );

        let progress = self.start_progress(OPTIMIZE_PROGRESS_TITLE);
        let contextual_code = self.range_context(&document, range, symbol_name).await;
        let messages = prompts::optimize_messages(
            self.language_for(&document),
            &marked,
            &contextual_code,
            self.options.max_context_chars,
        );

        let raw = self.collab.generator.complete(&messages).await?;
        if raw.trim().is_empty() {
            return Err(SpliceError::Generation(anyhow::anyhow!(OPTIMIZE_EMPTY_RESPONSE)));
        }
        progress.stop();

        let code = self
            .collab
            .extractor
            .extract_code(&raw)
            .ok_or(SpliceError::Extraction)?;
        let code = strip_markers(&code);
        // An empty block would splice the selection away.
        if code.trim().is_empty() {
            return Err(SpliceError::Generation(anyhow::anyhow!(OPTIMIZE_EMPTY_RESPONSE)));
        }

        let reconciled = reconcile_detailed(&document.text, &code, range.line_range());
        tracing::debug!(
            trimmed_leading = reconciled.trimmed_leading,
            trimmed_trailing = reconciled.trimmed_trailing,
            "reconciled optimized block"
        );
        let proposed = document.splice(range, &reconciled.text);

        self.collab.notifier.info(OPTIMIZE_SUCCESS);
        self.collab.presenter.present(&document, &proposed)?;
        Ok(proposed)
    }

    fn start_progress(&self, title: &str) -> ProgressTicker {
        ProgressTicker::start(
            Arc::clone(&self.collab.progress),
            title,
            self.options.progress_interval,
            self.options.progress_step,
        )
    }

    fn language_for(&self, document: &Document) -> Language {
        match document.language() {
            Language::Unknown => self.options.language_hint.unwrap_or(Language::Unknown),
            language => language,
        }
    }

    async fn relevant_files(&self, query: &str, exclude: Option<&Path>) -> String {
        match self.collab.search.find_similar(query, exclude).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "relevant file search failed; continuing without it");
                String::new()
            }
        }
    }

    async fn position_context(&self, document: &Document, position: Position) -> Option<String> {
        match self.collab.symbols.context_for_position(document, position).await {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!(error = %err, "contextual code unavailable");
                None
            }
        }
    }

    async fn range_context(
        &self,
        document: &Document,
        range: TextRange,
        symbol_name: Option<&str>,
    ) -> String {
        match self.collab.symbols.context_for_range(document, range, symbol_name).await {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!(error = %err, "contextual code unavailable");
                String::new()
            }
        }
    }

    fn report_failure(&self, event: &'static str, err: SpliceError) -> String {
        if err.is_precondition() {
            tracing::warn!(event, error = %err, "request aborted");
        } else {
            tracing::error!(event, error = ?err, "request failed");
        }
        self.collab.notifier.error(&err.user_message());
        String::new()
    }
}
