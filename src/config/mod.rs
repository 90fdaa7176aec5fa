//! Configuration module for the transcript calibrator.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the LLM
//! endpoint, chunking, retry and prompt overrides, `AppPaths` for the
//! platform config directory, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ChunkingConfig, LlmConfig, PromptConfig, RetryConfig};
