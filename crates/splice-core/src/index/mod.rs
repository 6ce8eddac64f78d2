//! Symbol outline for a single document
//!
//! A light tree-sitter pass that lists the functions, types and modules of a
//! file with their line spans. Used to find the symbol around an edit and the
//! symbols it refers to.

mod parser;

pub use parser::outline;

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "py" | "pyi" => Language::Python,
            "go" => Language::Go,
            _ => Language::Unknown,
        }
    }

    /// Human readable name used in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Go => "Go",
            Language::Unknown => "source",
        }
    }

    /// Info string models put on fenced blocks for this language.
    pub fn fence_tag(&self) -> Option<&'static str> {
        match self {
            Language::Rust => Some("rust"),
            Language::JavaScript => Some("javascript"),
            Language::TypeScript => Some("typescript"),
            Language::Python => Some("python"),
            Language::Go => Some("go"),
            Language::Unknown => None,
        }
    }
}

/// A symbol extracted from the AST. Lines are zero-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
    pub end_line: usize,
}

impl Symbol {
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.line) + 1
    }

    pub fn covers(&self, line: usize) -> bool {
        self.line <= line && line <= self.end_line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    Module,
    Constant,
}

impl SymbolKind {
    /// Kinds whose nested functions are methods.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Struct | SymbolKind::Interface | SymbolKind::Trait
        )
    }
}

/// Innermost symbol whose span covers `line`.
pub fn enclosing_symbol(symbols: &[Symbol], line: usize) -> Option<&Symbol> {
    symbols
        .iter()
        .filter(|s| s.covers(line))
        .min_by_key(|s| s.line_count())
}

pub fn symbol_named<'a>(symbols: &'a [Symbol], name: &str) -> Option<&'a Symbol> {
    symbols.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, line: usize, end_line: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function,
            line,
            end_line,
        }
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("dart"), Language::Unknown);
        assert_eq!(Language::Unknown.fence_tag(), None);
    }

    #[test]
    fn test_enclosing_symbol_picks_innermost() {
        let symbols = vec![sym("outer", 0, 20), sym("inner", 5, 8), sym("other", 22, 30)];
        assert_eq!(enclosing_symbol(&symbols, 6).unwrap().name, "inner");
        assert_eq!(enclosing_symbol(&symbols, 12).unwrap().name, "outer");
        assert!(enclosing_symbol(&symbols, 21).is_none());
        assert_eq!(symbol_named(&symbols, "other").unwrap().line, 22);
    }
}
