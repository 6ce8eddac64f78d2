//! Contracts for everything the orchestrator talks to.
//!
//! Host editors, the generation backend, search and persistence all live
//! outside this crate and are reached only through these traits.

use crate::document::{Document, LineRange, Position, TextRange};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The language model behind both flows.
pub trait GenerationService: Send + Sync {
    /// Returns the raw response text. Errors cover network, quota and
    /// malformed-response failures.
    fn complete<'a>(&'a self, conversation: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>>;
}

/// Finds source elsewhere in the workspace that resembles the query.
pub trait RelevantContextSearch: Send + Sync {
    fn find_similar<'a>(
        &'a self,
        query: &'a str,
        exclude: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Static-analysis context: the code of symbols referenced near the edit.
pub trait SymbolContextProvider: Send + Sync {
    fn context_for_position<'a>(
        &'a self,
        document: &'a Document,
        position: Position,
    ) -> BoxFuture<'a, Result<Option<String>>>;

    fn context_for_range<'a>(
        &'a self,
        document: &'a Document,
        range: TextRange,
        symbol_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Read access to the active document and a single mutation primitive.
pub trait EditorSurface: Send + Sync {
    /// `None` when no editor is active.
    fn document(&self) -> Option<Document>;
    fn cursor(&self) -> Option<Position>;
    fn selection(&self) -> Option<TextRange>;
    /// Replace the inclusive line range with `text`.
    fn replace_lines(&mut self, range: LineRange, text: &str) -> Result<()>;
}

/// Shows a proposed document to the user; applying it is up to the presenter.
pub trait DiffPresenter: Send + Sync {
    fn present(&self, original: &Document, proposed: &str) -> Result<()>;
}

/// Persistent counters that survive across sessions.
pub trait UsageCounter: Send + Sync {
    fn increment_and_get(&self, key: &str) -> Result<u64>;
    fn get(&self, key: &str) -> Result<u64>;
}

/// User-visible message surface.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait ProgressSink: Send + Sync {
    fn begin(&self, title: &str);
    /// Advance by `increment` percent; may be negative when the bar wraps.
    fn report(&self, increment: i32);
    fn finish(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
        let back: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(back.role, Role::Assistant);
    }
}
