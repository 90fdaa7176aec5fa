//! Map-reduce summarization.
//!
//! * **Map**: split the document, extract key points from every chunk
//!   independently (no context threading), bounded by the coordinator.
//! * **Reduce**: join the points with blank lines and make one more request
//!   with the synthesis instruction. That request is not chunked again.
//!
//! Any failure in either stage fails the whole request; there is no partial
//! summary.

use std::sync::Arc;

use crate::config::{AppConfig, ChunkingConfig};
use crate::llm::{InstructionSender, PromptBuilder};

use super::coordinator::Coordinator;
use super::processor::{processor_or_reason, ChunkProcessor};
use super::types::{Chunk, PipelineError, ProcessingOutcome, ProcessingTask, SummaryResult};

/// Separator between per-chunk key points in the reduce input.
const POINTS_SEPARATOR: &str = "\n\n";

pub struct Summarizer {
    processor: Result<ChunkProcessor, String>,
    prompts: PromptBuilder,
    chunking: ChunkingConfig,
    coordinator: Coordinator,
}

impl Summarizer {
    /// Build with an injected sender.
    pub fn new(sender: Arc<dyn InstructionSender>, config: &AppConfig) -> Self {
        Self::with_processor(
            Ok(ChunkProcessor::new(sender, config.retry.clone())),
            config,
        )
    }

    /// Build against the configured OpenAI-compatible endpoint.
    ///
    /// An incomplete endpoint config is logged here and reported by every
    /// [`summarize`](Self::summarize) call.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_processor(processor_or_reason(config, "summarization"), config)
    }

    fn with_processor(processor: Result<ChunkProcessor, String>, config: &AppConfig) -> Self {
        Self {
            processor,
            prompts: PromptBuilder::from_config(&config.prompts),
            chunking: config.chunking.clone(),
            coordinator: Coordinator::new(config.chunking.max_workers),
        }
    }

    /// Summarize `text` into one narrative.
    pub async fn summarize(&self, text: &str) -> SummaryResult {
        match self.try_summarize(text).await {
            Ok(summary) => SummaryResult::Summary(summary),
            Err(e) => {
                log::warn!("summarization failed: {e}");
                SummaryResult::ErrorMessage(e.to_string())
            }
        }
    }

    async fn try_summarize(&self, text: &str) -> Result<String, PipelineError> {
        let processor = self
            .processor
            .as_ref()
            .map_err(|reason| PipelineError::NotConfigured(reason.clone()))?;

        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        // ── Map ─────────────────────────────────────────────────────────
        let chunks = Chunk::from_document(text, self.chunking.target_size, false);
        log::info!(
            "summarizing {} chars: extracting key points from {} chunks",
            text.chars().count(),
            chunks.len()
        );

        let tasks = chunks
            .iter()
            .map(|chunk| ProcessingTask::new(chunk, self.prompts.key_points(), &self.prompts))
            .collect();
        let outcomes = self.coordinator.run_all(processor, tasks).await;

        let mut points = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                ProcessingOutcome::Success { content } => points.push(content),
                ProcessingOutcome::Failure { message, .. } => {
                    return Err(PipelineError::ChunkFailed { index, message });
                }
            }
        }

        // ── Reduce ──────────────────────────────────────────────────────
        let combined = points.join(POINTS_SEPARATOR);
        log::debug!(
            "synthesizing summary from {} chars of key points",
            combined.chars().count()
        );

        let reduce = ProcessingTask::new(
            &Chunk::whole(&combined),
            self.prompts.synthesis(),
            &self.prompts,
        );
        match processor.process(&reduce).await {
            ProcessingOutcome::Success { content } => Ok(content),
            ProcessingOutcome::Failure { message, .. } => Err(PipelineError::ReduceFailed(message)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockSender, DEFAULT_KEY_POINTS_PROMPT, DEFAULT_SYNTHESIS_PROMPT};

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.chunking.target_size = 10;
        config.chunking.max_workers = 2;
        config.retry.max_attempts = 2;
        config.retry.base_delay_ms = 0;
        config
    }

    fn summarizer(mock: &Arc<MockSender>) -> Summarizer {
        let sender: Arc<dyn InstructionSender> = mock.clone();
        Summarizer::new(sender, &config())
    }

    /// Three 10-char sentences → three chunks with a 10-char target.
    const DOCUMENT: &str = "Alpha one.Beta two..Gamma thr.";

    #[tokio::test]
    async fn reduce_receives_points_joined_by_blank_lines() {
        let mock = Arc::new(MockSender::new(|_, system, user| {
            if system == DEFAULT_KEY_POINTS_PROMPT {
                Ok(format!("- point of {user}"))
            } else {
                // Echo so the reduce input becomes the summary.
                Ok(user.to_string())
            }
        }));

        let result = summarizer(&mock).summarize(DOCUMENT).await;

        assert_eq!(
            result,
            SummaryResult::Summary(
                "- point of Alpha one.\n\n- point of Beta two..\n\n- point of Gamma thr.".into()
            )
        );
        assert!(result.succeeded());
        // Three map calls plus one reduce call.
        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test]
    async fn map_requests_carry_no_context() {
        let mock = Arc::new(MockSender::new(|_, system, user| {
            if system == DEFAULT_KEY_POINTS_PROMPT && user.contains("---CONTEXT---") {
                Err(LlmError::Status {
                    status: 400,
                    message: "context leaked".into(),
                })
            } else {
                Ok("ok".into())
            }
        }));

        assert!(summarizer(&mock).summarize(DOCUMENT).await.succeeded());
    }

    #[tokio::test]
    async fn reduce_uses_synthesis_instruction() {
        let mock = Arc::new(MockSender::new(|_, system, _| {
            if system == DEFAULT_SYNTHESIS_PROMPT {
                Ok("final narrative".into())
            } else {
                Ok("points".into())
            }
        }));

        let result = summarizer(&mock).summarize(DOCUMENT).await;
        assert_eq!(result, SummaryResult::Summary("final narrative".into()));
    }

    #[tokio::test]
    async fn map_failure_aborts_before_reduce() {
        let mock = Arc::new(MockSender::new(|_, system, user| {
            if system == DEFAULT_SYNTHESIS_PROMPT {
                panic!("reduce must not run");
            }
            if user.starts_with("Beta") {
                Err(LlmError::Status {
                    status: 429,
                    message: "quota exceeded".into(),
                })
            } else {
                Ok("points".into())
            }
        }));

        let result = summarizer(&mock).summarize(DOCUMENT).await;

        assert_eq!(
            result,
            SummaryResult::ErrorMessage("chunk 1 failed: API error 429: quota exceeded".into())
        );
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn blank_reduce_response_is_a_failure() {
        let mock = Arc::new(MockSender::new(|_, system, _| {
            if system == DEFAULT_SYNTHESIS_PROMPT {
                Ok("  ".into())
            } else {
                Ok("points".into())
            }
        }));

        let result = summarizer(&mock).summarize(DOCUMENT).await;

        assert_eq!(
            result,
            SummaryResult::ErrorMessage(
                "final synthesis failed: LLM returned an empty response".into()
            )
        );
    }

    #[tokio::test]
    async fn blank_input_is_an_error() {
        let mock = Arc::new(MockSender::new(|_, _, _| Ok("x".into())));
        let result = summarizer(&mock).summarize("   ").await;

        assert_eq!(result, SummaryResult::ErrorMessage("nothing to process".into()));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_service_is_an_error() {
        let result = Summarizer::from_config(&AppConfig::default())
            .summarize("some text")
            .await;

        assert_eq!(
            result,
            SummaryResult::ErrorMessage("service unavailable: service not configured".into())
        );
    }
}
