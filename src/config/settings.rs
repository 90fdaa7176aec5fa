//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every struct is `#[serde(default)]`, so a partial `settings.toml` only
//! needs the keys it wants to change.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Default OpenAI-compatible endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote text-completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the API endpoint; `/v1/chat/completions` is appended.
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Ollama (OpenAI mode): `http://localhost:11434`
    pub base_url: String,
    /// API key sent as a bearer token. `None` or empty means no auth header.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature. Calibration wants near-deterministic output.
    pub temperature: f32,
    /// Per-request timeout. Long chunks can take minutes on a slow model.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: String::new(),
            temperature: 0.1,
            timeout_secs: 300,
        }
    }
}

impl LlmConfig {
    /// Full chat-completions URL derived from `base_url`.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Check whether the remote service is usable.
    ///
    /// Returns `Err(reason)` with a human-readable skip reason otherwise:
    /// `"service not configured"` when nothing was set at all, or
    /// `"incomplete configuration: …"` naming each missing piece.
    pub fn readiness(&self) -> Result<(), String> {
        let has_key = self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        let url_valid =
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        let has_model = !self.model.trim().is_empty();

        if has_key && url_valid && has_model {
            return Ok(());
        }

        let touched = has_key || self.base_url != DEFAULT_BASE_URL || has_model;
        if !touched {
            return Err("service not configured".into());
        }

        let mut missing = Vec::new();
        if !has_key {
            missing.push("missing API key");
        }
        if !url_valid {
            missing.push("invalid API URL");
        }
        if !has_model {
            missing.push("missing model name");
        }
        Err(format!("incomplete configuration: {}", missing.join(", ")))
    }
}

// ---------------------------------------------------------------------------
// ChunkingConfig
// ---------------------------------------------------------------------------

/// How long documents are cut up and fanned out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk length in characters.
    pub target_size: usize,
    /// Documents at or below this many characters go out as a single request.
    ///
    /// Kept slightly above `target_size` so a barely-oversized document is not
    /// split into one full chunk plus a tiny tail.
    pub threshold: usize,
    /// Maximum number of chunk requests in flight at once.
    pub max_workers: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 5000,
            threshold: 5500,
            max_workers: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Per-chunk retry budget with linear backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per chunk, including the first one.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `n * base_delay_ms`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// Backoff to wait after the given 1-based failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(u64::from(attempt)))
    }
}

// ---------------------------------------------------------------------------
// PromptConfig
// ---------------------------------------------------------------------------

/// Optional overrides for the built-in instruction texts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// System instruction for calibration requests.
    pub calibration: Option<String>,
    /// System instruction for the summarization map stage.
    pub key_points: Option<String>,
    /// System instruction for the summarization reduce stage.
    pub synthesis: Option<String>,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use transcript_calibrate::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote LLM endpoint settings.
    pub llm: LlmConfig,
    /// Chunk sizes and worker count.
    pub chunking: ChunkingConfig,
    /// Per-chunk retry policy.
    pub retry: RetryConfig,
    /// Instruction text overrides.
    pub prompts: PromptConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ready_llm() -> LlmConfig {
        LlmConfig {
            api_key: Some("sk-test".into()),
            model: "gpt-4o-mini".into(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.llm.base_url, "https://api.openai.com");
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.llm.timeout_secs, 300);
        assert_eq!(cfg.chunking.target_size, 5000);
        assert_eq!(cfg.chunking.threshold, 5500);
        assert_eq!(cfg.chunking.max_workers, 3);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.base_delay_ms, 2000);
        assert!(cfg.prompts.calibration.is_none());
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.chunking.target_size, 5000);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.llm = ready_llm();
        cfg.llm.base_url = "http://localhost:11434".into();
        cfg.chunking.max_workers = 8;
        cfg.retry.base_delay_ms = 10;
        cfg.prompts.synthesis = Some("Write it up.".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.llm.base_url, "http://localhost:11434");
        assert_eq!(loaded.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert_eq!(loaded.chunking.max_workers, 8);
        assert_eq!(loaded.retry.base_delay_ms, 10);
        assert_eq!(loaded.prompts.synthesis.as_deref(), Some("Write it up."));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[llm]\nmodel = \"qwen2.5:7b\"\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.llm.model, "qwen2.5:7b");
        assert_eq!(loaded.llm.timeout_secs, 300);
        assert_eq!(loaded.chunking.threshold, 5500);
    }

    #[test]
    fn endpoint_appends_chat_path() {
        let mut llm = LlmConfig::default();
        llm.base_url = "http://localhost:11434/".into();
        assert_eq!(llm.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn readiness_ok_when_complete() {
        assert!(ready_llm().readiness().is_ok());
    }

    #[test]
    fn readiness_untouched_config_is_not_configured() {
        let err = LlmConfig::default().readiness().unwrap_err();
        assert_eq!(err, "service not configured");
    }

    #[test]
    fn readiness_lists_missing_parts() {
        let mut llm = LlmConfig::default();
        llm.api_key = Some("sk-test".into());
        llm.base_url = "ftp://example.com".into();

        let err = llm.readiness().unwrap_err();
        assert_eq!(
            err,
            "incomplete configuration: invalid API URL, missing model name"
        );
    }

    #[test]
    fn readiness_blank_key_counts_as_missing() {
        let mut llm = ready_llm();
        llm.api_key = Some("  ".into());
        let err = llm.readiness().unwrap_err();
        assert_eq!(err, "incomplete configuration: missing API key");
    }

    #[test]
    fn linear_backoff_schedule() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_after(1), Duration::from_secs(2));
        assert_eq!(retry.delay_after(2), Duration::from_secs(4));
    }
}
