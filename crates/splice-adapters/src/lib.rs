//! Runtime adapters for Splice (config, persistence, files, search).

pub mod config;
pub mod diff_presenter;
pub mod editor;
mod fsutil;
pub mod search;
pub mod symbols;
pub mod tokens;
pub mod usage;

pub use config::Config;
pub use diff_presenter::UnifiedDiffPresenter;
pub use editor::FileEditor;
pub use search::WorkspaceSearch;
pub use symbols::OutlineContextProvider;
pub use usage::{UsageStore, INLINE_COMPLETION_KEY};
