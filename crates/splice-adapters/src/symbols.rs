//! Symbol context from the tree-sitter outline
//!
//! Collects the source of symbols that the code around an edit refers to, so
//! the model sees the definitions it is expected to call into.

use crate::tokens::identifiers;
use splice_core::index::{enclosing_symbol, outline, symbol_named, Symbol};
use splice_core::{BoxFuture, Document, LineRange, Position, SymbolContextProvider, TextRange};
use std::collections::HashSet;

/// Lines above and below the cursor scanned when it sits outside any symbol.
const DEFAULT_WINDOW: usize = 20;
const DEFAULT_MAX_SYMBOLS: usize = 8;

#[derive(Debug, Clone)]
pub struct OutlineContextProvider {
    window: usize,
    max_symbols: usize,
}

impl Default for OutlineContextProvider {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }
}

impl OutlineContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = max_symbols;
        self
    }

    fn window_around(&self, line: usize, line_count: usize) -> LineRange {
        let last = line_count.saturating_sub(1);
        LineRange {
            start: line.saturating_sub(self.window),
            end: (line + self.window).min(last),
        }
    }

    /// Source of the symbols referenced from `focus`, excluding symbols that
    /// contain the focus or sit entirely inside it.
    fn referenced(&self, document: &Document, symbols: &[Symbol], focus: LineRange) -> String {
        let lines = document.lines();
        let end = (focus.end + 1).min(lines.len());
        let start = focus.start.min(end);
        let used: HashSet<&str> = lines[start..end]
            .iter()
            .flat_map(|line| identifiers(line))
            .collect();

        let mut seen = HashSet::new();
        symbols
            .iter()
            .filter(|s| used.contains(s.name.as_str()))
            .filter(|s| !s.covers(focus.start))
            .filter(|s| !(focus.contains(s.line) && focus.contains(s.end_line)))
            .filter(|s| seen.insert((s.name.as_str(), s.line)))
            .take(self.max_symbols)
            .map(|s| render_symbol(s, &lines))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn render_symbol(symbol: &Symbol, lines: &[&str]) -> String {
    let end = (symbol.end_line + 1).min(lines.len());
    let start = symbol.line.min(end);
    format!(
        "// {:?} `{}` (lines {}-{})\n{}",
        symbol.kind,
        symbol.name,
        symbol.line + 1,
        symbol.end_line + 1,
        lines[start..end].join("\n")
    )
}

impl SymbolContextProvider for OutlineContextProvider {
    fn context_for_position<'a>(
        &'a self,
        document: &'a Document,
        position: Position,
    ) -> BoxFuture<'a, anyhow::Result<Option<String>>> {
        Box::pin(async move {
            let symbols = outline(document.language(), &document.text)?;
            let focus = match enclosing_symbol(&symbols, position.line) {
                Some(symbol) => LineRange {
                    start: symbol.line,
                    end: symbol.end_line,
                },
                None => self.window_around(position.line, document.line_count()),
            };
            let context = self.referenced(document, &symbols, focus);
            Ok((!context.is_empty()).then_some(context))
        })
    }

    fn context_for_range<'a>(
        &'a self,
        document: &'a Document,
        range: TextRange,
        symbol_name: Option<&'a str>,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let symbols = outline(document.language(), &document.text)?;
            let focus = symbol_name
                .and_then(|name| symbol_named(&symbols, name))
                .map(|s| LineRange {
                    start: s.line,
                    end: s.end_line,
                })
                .unwrap_or_else(|| range.line_range());
            Ok(self.referenced(document, &symbols, focus))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
fn tax(amount: u64) -> u64 {
    amount / 10
}

fn shipping() -> u64 {
    5
}

fn total(amount: u64) -> u64 {
    let base = amount + shipping();

    base + tax(amount)
}
";

    fn doc() -> Document {
        Document::new(SOURCE).with_path("src/checkout.rs")
    }

    #[tokio::test]
    async fn test_position_collects_referenced_functions() {
        let provider = OutlineContextProvider::new();
        let context = provider
            .context_for_position(&doc(), Position::new(10, 0))
            .await
            .unwrap()
            .unwrap();
        assert!(context.contains("// Function `tax` (lines 1-3)\nfn tax(amount: u64) -> u64 {"));
        assert!(context.contains("fn shipping() -> u64 {"));
        assert!(!context.contains("fn total"));
    }

    #[tokio::test]
    async fn test_position_without_references_is_none() {
        let provider = OutlineContextProvider::new();
        let context = provider
            .context_for_position(&doc(), Position::new(1, 0))
            .await
            .unwrap();
        assert!(context.is_none());
    }

    #[tokio::test]
    async fn test_range_uses_named_symbol() {
        let provider = OutlineContextProvider::new();
        let selection = TextRange::new(Position::new(9, 4), Position::new(9, 20));

        let by_name = provider
            .context_for_range(&doc(), selection, Some("total"))
            .await
            .unwrap();
        assert!(by_name.contains("fn tax"));
        assert!(by_name.contains("fn shipping"));

        let by_selection = provider
            .context_for_range(&doc(), selection, None)
            .await
            .unwrap();
        assert!(by_selection.contains("fn shipping"));
        assert!(!by_selection.contains("fn tax"));
    }

    #[tokio::test]
    async fn test_unknown_language_yields_nothing() {
        let provider = OutlineContextProvider::new();
        let plain = Document::new("tax shipping").with_path("notes.txt");
        let range = TextRange::new(Position::new(0, 0), Position::new(0, 3));
        assert_eq!(provider.context_for_range(&plain, range, None).await.unwrap(), "");
    }

    #[test]
    fn test_max_symbols_caps_output() {
        let provider = OutlineContextProvider::new().with_max_symbols(1);
        let d = doc();
        let symbols = outline(d.language(), &d.text).unwrap();
        let context = provider.referenced(&d, &symbols, LineRange { start: 8, end: 12 });
        assert_eq!(context.matches("// Function").count(), 1);
    }

    #[tokio::test]
    async fn test_short_names_match_case_sensitively() {
        let source = "fn id(x: u8) -> u8 {\n    x\n}\n\nfn Id() {}\n\nfn run() {\n    id(1);\n}\n";
        let d = Document::new(source).with_path("src/ids.rs");
        let context = OutlineContextProvider::new()
            .context_for_position(&d, Position::new(7, 4))
            .await
            .unwrap()
            .unwrap();
        assert!(context.contains("// Function `id` (lines 1-3)"));
        assert!(!context.contains("fn Id()"));
    }
}
