//! Chat-completions client for OpenRouter-compatible APIs

use serde::{Deserialize, Serialize};
use splice_adapters::Config;
use splice_core::{BoxFuture, ChatMessage, GenerationService};
use std::time::Duration;

/// Longest slice of a response body quoted back in an error.
const MAX_ERROR_CONTENT_LEN: usize = 200;

pub(crate) const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;
const BACKOFF_MULTIPLIER: u64 = 2;
/// Server-suggested waits above this are ignored in favour of backoff.
const MAX_HINTED_WAIT_SECS: u64 = 300;

const REDACTED: &str = "(response details redacted - may contain sensitive data)";

/// Quote a response body in an error without leaking anything key-shaped.
fn sanitize_api_response(content: &str) -> String {
    const SECRET_MARKERS: [&str; 7] = [
        "api_key",
        "apikey",
        "secret",
        "password",
        "credential",
        "bearer",
        "sk-",
    ];

    let quoted = truncate_str(content, MAX_ERROR_CONTENT_LEN);
    let lower = quoted.to_lowercase();
    if SECRET_MARKERS.iter().any(|marker| lower.contains(marker)) {
        REDACTED.to_string()
    } else {
        quoted.to_string()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    /// Null when the reply was refused or failed upstream.
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Upstream failure wrapped in a 200 response.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<i32>,
}

impl ApiError {
    /// Missing codes are treated as transient.
    fn is_transient(&self) -> bool {
        self.code.map_or(true, |code| code == 429 || code >= 500)
    }
}

/// Seconds named after the word "retry" in a rate-limit body, e.g.
/// "retry after 12 seconds".
fn parse_retry_after(text: &str) -> Option<u64> {
    let lower = text.to_lowercase();
    let tail = &lower[lower.find("retry")?..];
    tail.split_whitespace()
        .skip(1)
        .take(5)
        .filter_map(|word| {
            word.trim_matches(|c: char| !c.is_ascii_digit())
                .parse::<u64>()
                .ok()
        })
        .find(|secs| (1..MAX_HINTED_WAIT_SECS).contains(secs))
}

/// Wait before retry number `attempt` (1-based), never under a second.
pub(crate) fn backoff_secs(attempt: u32) -> u64 {
    let factor = BACKOFF_MULTIPLIER.pow(attempt.saturating_sub(1));
    (INITIAL_BACKOFF_MS.saturating_mul(factor) / 1000).max(1)
}

pub(crate) fn is_retryable_network_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn describe_network_error(err: reqwest::Error) -> anyhow::Error {
    if err.is_timeout() {
        anyhow::anyhow!("Generation request timed out. Please try again.")
    } else if err.is_connect() {
        anyhow::anyhow!("Could not connect to the generation API. Check your network and try again.")
    } else {
        err.into()
    }
}

fn describe_http_failure(status: reqwest::StatusCode, body: &str, retries: u32) -> anyhow::Error {
    match status.as_u16() {
        401 => anyhow::anyhow!("Invalid API key. Check SPLICE_API_KEY or your config file."),
        429 => anyhow::anyhow!(
            "Rate limited by the generation API after {} retries. Try again in a few minutes.",
            retries
        ),
        500..=599 => anyhow::anyhow!(
            "Generation API server error ({}). The service may be temporarily unavailable.",
            status
        ),
        _ => anyhow::anyhow!("API error {}: {}", status, sanitize_api_response(body)),
    }
}

/// Unicode-safe prefix of at most `max_chars` characters.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

pub(crate) fn create_http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))
}

/// One request attempt's outcome.
enum Attempt {
    Done(String),
    /// Retry after the given number of seconds.
    Retry(u64),
    Failed(anyhow::Error),
}

/// Chat-completions client for OpenRouter or any OpenAI-compatible endpoint.
pub struct OpenRouterClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenRouterClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured. Set SPLICE_API_KEY or add \"api_key\" to {}.",
                Config::config_location()
            )
        })?;
        Ok(Self {
            http: create_http_client(config.request_timeout_secs)?,
            url: config.completions_url(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST `body`, retrying timeouts, connection failures, 429s, 5xx and
    /// transient error objects inside 200 responses with exponential backoff.
    async fn send_with_retry<T: Serialize>(&self, body: &T) -> anyhow::Result<String> {
        let mut retries = 0;
        loop {
            match self.attempt(body, retries).await {
                Attempt::Done(text) => return Ok(text),
                Attempt::Failed(err) => return Err(err),
                Attempt::Retry(wait_secs) => {
                    retries += 1;
                    tracing::warn!(retries, wait_secs, "generation request failed, retrying");
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                }
            }
        }
    }

    async fn attempt<T: Serialize>(&self, body: &T, retries: u32) -> Attempt {
        let can_retry = retries < MAX_RETRIES;
        let next_wait = backoff_secs(retries + 1);

        let sent = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Title", "Splice")
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(err) if can_retry && is_retryable_network_error(&err) => {
                return Attempt::Retry(next_wait)
            }
            Err(err) => return Attempt::Failed(describe_network_error(err)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) if can_retry && is_retryable_network_error(&err) => {
                return Attempt::Retry(next_wait)
            }
            Err(err) => return Attempt::Failed(describe_network_error(err)),
        };

        if status.is_success() {
            return match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) if can_retry && body.error.is_transient() => Attempt::Retry(next_wait),
                Ok(body) => Attempt::Failed(anyhow::anyhow!(
                    "Generation API error: {}",
                    truncate_str(&body.error.message, MAX_ERROR_CONTENT_LEN)
                )),
                Err(_) => Attempt::Done(text),
            };
        }

        if can_retry && status.as_u16() == 429 {
            return Attempt::Retry(parse_retry_after(&text).unwrap_or(next_wait));
        }
        if can_retry && status.is_server_error() {
            return Attempt::Retry(next_wait);
        }
        Attempt::Failed(describe_http_failure(status, &text, retries))
    }
}

/// Pull the message content out of a chat-completions response body.
pub(crate) fn parse_completion(text: &str) -> anyhow::Result<String> {
    let parsed: ChatResponse = serde_json::from_str(text).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse generation response: {}\n{}",
            e,
            sanitize_api_response(text)
        )
    })?;

    let message = parsed.choices.into_iter().next().map(|c| c.message);
    if let Some(refusal) = message.as_ref().and_then(|m| m.refusal.as_deref()) {
        anyhow::bail!(
            "Request was refused: {}",
            truncate_str(refusal, MAX_ERROR_CONTENT_LEN)
        );
    }

    let content = message.and_then(|m| m.content).unwrap_or_default();
    if content.trim().is_empty() {
        anyhow::bail!(
            "API returned empty response. The model may have been rate limited or failed to generate content. Please try again."
        );
    }
    Ok(content)
}

impl GenerationService for OpenRouterClient {
    fn complete<'a>(
        &'a self,
        conversation: &'a [ChatMessage],
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let request = ChatRequest {
                model: &self.model,
                messages: conversation,
                max_tokens: self.max_tokens,
                stream: false,
            };
            let text = self.send_with_retry(&request).await?;
            parse_completion(&text)
        })
    }
}
