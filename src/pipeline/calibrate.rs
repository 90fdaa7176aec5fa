//! Calibration pipeline: correct a whole transcript, all or nothing.
//!
//! ```text
//! text ─┬─ service unusable ─────────────▶ skipped, original text
//!       ├─ blank ────────────────────────▶ failed, original text
//!       ├─ ≤ threshold chars ─▶ one request, no context
//!       └─ longer ─▶ split ─▶ tasks (context = last sentence of chunk i-1)
//!                         ─▶ Coordinator ─▶ outcomes in chunk order
//!                               ├─ all Success ─▶ concatenated, succeeded
//!                               └─ any Failure ─▶ original text, first error
//! ```
//!
//! A document is never returned half calibrated.

use std::sync::Arc;

use crate::config::{AppConfig, ChunkingConfig};
use crate::llm::{InstructionSender, PromptBuilder};

use super::coordinator::Coordinator;
use super::processor::{processor_or_reason, ChunkProcessor};
use super::types::{Chunk, PipelineError, PipelineResult, ProcessingOutcome, ProcessingTask};

/// Single-pass "correct this text" pipeline.
pub struct Calibrator {
    /// `Err` holds the reason the service cannot be used.
    processor: Result<ChunkProcessor, String>,
    prompts: PromptBuilder,
    chunking: ChunkingConfig,
    coordinator: Coordinator,
}

impl Calibrator {
    /// Build with an injected sender.
    pub fn new(sender: Arc<dyn InstructionSender>, config: &AppConfig) -> Self {
        Self::with_processor(
            Ok(ChunkProcessor::new(sender, config.retry.clone())),
            config,
        )
    }

    /// Build against the configured OpenAI-compatible endpoint.
    ///
    /// An incomplete endpoint config does not fail here: every call to
    /// [`calibrate`](Self::calibrate) then reports the skip reason and returns
    /// the input untouched.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_processor(processor_or_reason(config, "calibration"), config)
    }

    fn with_processor(processor: Result<ChunkProcessor, String>, config: &AppConfig) -> Self {
        Self {
            processor,
            prompts: PromptBuilder::from_config(&config.prompts),
            chunking: config.chunking.clone(),
            coordinator: Coordinator::new(config.chunking.max_workers),
        }
    }

    /// Calibrate `text`.
    ///
    /// `succeeded` is `true` only if every request succeeded; otherwise
    /// `final_text` is `text` unchanged and `status_message` says why.
    pub async fn calibrate(&self, text: &str) -> PipelineResult {
        let processor = match &self.processor {
            Ok(processor) => processor,
            Err(reason) => {
                log::info!("calibration skipped: {reason}");
                return PipelineResult::skipped(text, reason);
            }
        };

        if text.trim().is_empty() {
            return PipelineResult::fallback(text, &PipelineError::EmptyInput.to_string());
        }

        let len = text.chars().count();
        if len <= self.chunking.threshold {
            log::info!("calibrating {len} chars in a single request");
            let task = ProcessingTask::new(
                &Chunk::whole(text),
                self.prompts.calibration(),
                &self.prompts,
            );
            return assemble(text, vec![processor.process(&task).await]);
        }

        let chunks = Chunk::from_document(text, self.chunking.target_size, true);
        if chunks.is_empty() {
            return PipelineResult::fallback(text, "text empty after splitting");
        }

        log::info!(
            "text too long ({len} chars): calibrating {} chunks on {} workers",
            chunks.len(),
            self.coordinator.max_workers()
        );

        let tasks = chunks
            .iter()
            .map(|chunk| ProcessingTask::new(chunk, self.prompts.calibration(), &self.prompts))
            .collect();
        let outcomes = self.coordinator.run_all(processor, tasks).await;

        assemble(text, outcomes)
    }
}

/// Concatenate outcomes in order, or fall back to `original` on any failure.
fn assemble(original: &str, outcomes: Vec<ProcessingOutcome>) -> PipelineResult {
    let mut calibrated = String::new();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            ProcessingOutcome::Success { content } => calibrated.push_str(&content),
            ProcessingOutcome::Failure { message, .. } => {
                log::warn!(
                    "calibration failed at chunk {index}, returning original text: {message}"
                );
                return PipelineResult::fallback(original, &message);
            }
        }
    }

    log::info!("all chunks calibrated and merged");
    PipelineResult::calibrated(calibrated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
