//! Chunk processor: one task, bounded retries, linear backoff.
//!
//! ```text
//! attempt 1 ──ok, non-blank──▶ Success
//!    │ Client/Configuration error ──▶ Failure { retryable: false }
//!    │ Transient error / blank body
//!    ▼ sleep 1 × base
//! attempt 2 ...
//!    ▼ sleep 2 × base
//! attempt N ──still transient──▶ Failure { retryable: true, last message }
//! ```
//!
//! The only suspension points are the remote call and the backoff sleep.

use std::sync::Arc;

use crate::config::{AppConfig, RetryConfig};
use crate::llm::{ApiSender, InstructionSender, LlmError};

use super::types::{ProcessingOutcome, ProcessingTask};

/// Sends tasks to an [`InstructionSender`] with retry.
#[derive(Clone)]
pub struct ChunkProcessor {
    sender: Arc<dyn InstructionSender>,
    retry: RetryConfig,
}

impl ChunkProcessor {
    pub fn new(sender: Arc<dyn InstructionSender>, retry: RetryConfig) -> Self {
        Self { sender, retry }
    }

    /// Build a processor backed by an [`ApiSender`].
    ///
    /// Fails with [`LlmError::NotConfigured`] when the endpoint settings are
    /// incomplete.
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let sender = ApiSender::from_config(&config.llm)?;
        Ok(Self::new(Arc::new(sender), config.retry.clone()))
    }

    /// Process one task.
    ///
    /// Never returns an error: every failure is folded into
    /// [`ProcessingOutcome::Failure`].
    pub async fn process(&self, task: &ProcessingTask) -> ProcessingOutcome {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let error = match self
                .sender
                .send(&task.system_instruction, &task.user_content)
                .await
            {
                Ok(content) if !content.trim().is_empty() => {
                    if attempt > 1 {
                        log::info!("chunk {}: succeeded on attempt {attempt}", task.index);
                    }
                    return ProcessingOutcome::Success { content };
                }
                Ok(_) => LlmError::EmptyResponse,
                Err(e) => e,
            };

            if !error.is_retryable() {
                log::warn!("chunk {}: non-retryable error: {error}", task.index);
                return ProcessingOutcome::Failure {
                    message: error.to_string(),
                    retryable: false,
                };
            }

            last_error = error.to_string();

            if attempt < attempts {
                let delay = self.retry.delay_after(attempt);
                log::warn!(
                    "chunk {}: attempt {attempt}/{attempts} failed ({error}); retrying in {:.1}s",
                    task.index,
                    delay.as_secs_f32()
                );
                tokio::time::sleep(delay).await;
            }
        }

        log::error!(
            "chunk {}: giving up after {attempts} attempts: {last_error}",
            task.index
        );
        ProcessingOutcome::Failure {
            message: last_error,
            retryable: true,
        }
    }
}

/// Build a processor for the named pipeline, or log and return the reason
/// the service is unusable.
pub(crate) fn processor_or_reason(
    config: &AppConfig,
    pipeline: &str,
) -> Result<ChunkProcessor, String> {
    ChunkProcessor::from_config(config).map_err(|e| {
        let reason = match e {
            LlmError::NotConfigured(reason) => reason,
            other => other.to_string(),
        };
        log::warn!("{pipeline} disabled: {reason}");
        reason
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
