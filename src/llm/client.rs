//! Core `InstructionSender` trait and `ApiSender` implementation.
//!
//! `ApiSender` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! (OpenAI, Ollama in OpenAI mode, Groq, LM Studio, vLLM, ...). All
//! connection details come from [`LlmConfig`]; nothing is hardcoded.
//!
//! Transport failures are folded into [`LlmError`], whose [`ErrorKind`]
//! tells the pipeline whether another attempt is worth making. The pipeline
//! never looks at status codes itself.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;

/// HTTP status codes that will not improve on retry: bad payload, auth,
/// forbidden and quota.
pub const NON_RETRYABLE_STATUS: [u16; 4] = [400, 401, 403, 429];

/// Upper bound on raw body text quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors returned by an [`InstructionSender`].
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Credentials, endpoint or model identifier are missing or invalid.
    #[error("LLM service not configured: {0}")]
    NotConfigured(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Coarse classification of an [`LlmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The capability cannot be used at all.
    Configuration,
    /// Deterministic rejection (payload, auth, quota). Not retried.
    Client,
    /// Timeout, connection failure, server error or empty body. Retried.
    Transient,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::NotConfigured(_) => ErrorKind::Configuration,
            LlmError::Status { status, .. } if NON_RETRYABLE_STATUS.contains(status) => {
                ErrorKind::Client
            }
            LlmError::Status { .. }
            | LlmError::Timeout
            | LlmError::Request(_)
            | LlmError::Parse(_)
            | LlmError::EmptyResponse => ErrorKind::Transient,
        }
    }

    /// `true` when another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::Parse(e.to_string())
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

/// Pull a readable message out of an error response body.
///
/// Tries `error.message`, then `message`, then `detail` of a JSON body and
/// falls back to the first 200 characters of the raw text.
pub fn extract_api_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let candidate = [
            json.pointer("/error/message"),
            json.get("message"),
            json.get("detail"),
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_null());

        if let Some(value) = candidate {
            return match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
        }
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

// ---------------------------------------------------------------------------
// InstructionSender trait
// ---------------------------------------------------------------------------

/// The single remote capability the pipeline depends on: send a system
/// instruction plus user content, get processed text back.
///
/// Implementors must be `Send + Sync` so one sender can serve every
/// concurrent chunk request (e.g. wrapped in `Arc<dyn InstructionSender>`).
#[async_trait]
pub trait InstructionSender: Send + Sync {
    async fn send(&self, system_instruction: &str, user_content: &str)
        -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiSender
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiSender {
    client: reqwest::Client,
    endpoint: String,
    config: LlmConfig,
}

impl ApiSender {
    /// Build an `ApiSender` from the LLM config.
    ///
    /// Fails with [`LlmError::NotConfigured`] when [`LlmConfig::readiness`]
    /// does. The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config.readiness().map_err(LlmError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl InstructionSender for ApiSender {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-blank string.
    async fn send(
        &self,
        system_instruction: &str,
        user_content: &str,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_instruction },
                { "role": "user",   "content": user_content       }
            ],
            "temperature": self.config.temperature
        });

        let mut req = self.client.post(&self.endpoint).json(&body);

        let key = self.config.api_key.as_deref().map_or("", str::trim);
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: extract_api_error_message(&text),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// MockSender  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
type Responder = Box<dyn Fn(usize, &str, &str) -> Result<String, LlmError> + Send + Sync>;

#[cfg(test)]
type DelayFn = Box<dyn Fn(&str) -> std::time::Duration + Send + Sync>;

/// A test double that answers through a closure.
///
/// The closure receives the 0-based call number plus the system instruction
/// and user content. An optional delay (keyed on the user content) makes
/// calls overlap so concurrency and ordering can be observed.
#[cfg(test)]
pub struct MockSender {
    respond: Responder,
    delay: Option<DelayFn>,
    calls: std::sync::atomic::AtomicUsize,
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSender {
    pub fn new(
        respond: impl Fn(usize, &str, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            calls: Default::default(),
            in_flight: Default::default(),
            max_in_flight: Default::default(),
        }
    }

    /// Sleep for `delay(user_content)` inside every call.
    pub fn with_delay(
        mut self,
        delay: impl Fn(&str) -> std::time::Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    /// Number of `send` calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl InstructionSender for MockSender {
    async fn send(
        &self,
        system_instruction: &str,
        user_content: &str,
    ) -> Result<String, LlmError> {
        use std::sync::atomic::Ordering;

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(user_content)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(call, system_instruction, user_content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
