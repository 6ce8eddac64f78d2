//! Configuration management for splice
//!
//! Stores settings in ~/.config/splice/config.json

use crate::fsutil::write_private;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

const MIN_MAX_TOKENS: u32 = 64;
const MAX_MAX_TOKENS: u32 = 32_768;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_RELEVANT_FILES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// How many similar workspace files are pulled into a completion prompt.
    pub max_relevant_files: usize,
    /// Character budget per context section in a prompt.
    pub max_context_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            request_timeout_secs: 60,
            max_relevant_files: 3,
            max_context_chars: 12_000,
            api_key: None,
        }
    }
}

impl Config {
    fn sanitize(&mut self) {
        let base = self.api_base.trim().trim_end_matches('/').to_string();
        self.api_base = if is_http_url(&base) {
            base
        } else {
            tracing::warn!(api_base = %self.api_base, "ignoring invalid api_base");
            DEFAULT_API_BASE.to_string()
        };

        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        self.max_tokens = self.max_tokens.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, MAX_TIMEOUT_SECS);
        self.max_relevant_files = self.max_relevant_files.min(MAX_RELEVANT_FILES);
        self.max_context_chars = self.max_context_chars.max(256);
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("splice"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk plus environment overrides, or return defaults.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        config.apply_env(|name| std::env::var(name).ok());
        config.sanitize();
        config
    }

    /// Load from an explicit path. A file that fails to parse is moved aside
    /// to `config.json.corrupt` and defaults are returned.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = fs::read_to_string(path) {
            match serde_json::from_str::<Config>(&content) {
                Ok(mut config) => {
                    config.sanitize();
                    return config;
                }
                Err(err) => {
                    preserve_corrupt_config(path, &content);
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "config file was corrupted; a backup was saved and defaults were loaded"
                    );
                }
            }
        }
        Self::default()
    }

    /// Environment takes precedence over the file.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("SPLICE_API_KEY").or_else(|| non_empty("OPENROUTER_API_KEY")) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = non_empty("SPLICE_MODEL") {
            self.model = model.trim().to_string();
        }
        if let Some(base) = non_empty("SPLICE_API_BASE") {
            self.api_base = base.trim().to_string();
        }
    }

    /// Save config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(&sanitized)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
        write_private(path, &content).map_err(|e| anyhow::anyhow!("Failed to write config: {}", e))
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/splice/config.json".to_string())
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
