//! Data passed between pipeline stages.
//!
//! [`Chunk`], [`ProcessingTask`] and [`ProcessingOutcome`] are internal to a
//! single run and dropped after assembly. [`PipelineResult`] and
//! [`SummaryResult`] are what callers get back; both serialize to the JSON
//! shapes the surrounding service returns.

use serde::Serialize;
use thiserror::Error;

use crate::chunking::{last_sentence, split};
use crate::llm::PromptBuilder;

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One ordered slice of the input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the original ordering.
    pub index: usize,
    /// The chunk text. Never blank.
    pub text: String,
    /// Last sentence of the previous chunk's *input* text, if threaded.
    pub preceding_context: Option<String>,
}

impl Chunk {
    /// The whole document as a single chunk with no context.
    pub fn whole(text: &str) -> Self {
        Self {
            index: 0,
            text: text.to_string(),
            preceding_context: None,
        }
    }

    /// Split `text` and number the pieces.
    ///
    /// With `thread_context`, every chunk after the first carries the last
    /// sentence of the chunk before it. Context is derived from input text
    /// only, so no chunk waits on another chunk's result.
    pub fn from_document(text: &str, target_size: usize, thread_context: bool) -> Vec<Self> {
        let pieces = split(text, target_size);
        pieces
            .iter()
            .enumerate()
            .map(|(index, piece)| Self {
                index,
                text: piece.to_string(),
                preceding_context: match index {
                    0 => None,
                    _ if thread_context => {
                        Some(last_sentence(pieces[index - 1])).filter(|s| !s.is_empty())
                    }
                    _ => None,
                },
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ProcessingTask
// ---------------------------------------------------------------------------

/// A fully built request for one chunk. Owned by exactly one processor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingTask {
    /// Index of the chunk this task was built from.
    pub index: usize,
    pub system_instruction: String,
    /// Chunk text, wrapped with the preceding context when there is one.
    pub user_content: String,
}

impl ProcessingTask {
    pub fn new(chunk: &Chunk, system_instruction: &str, prompts: &PromptBuilder) -> Self {
        Self {
            index: chunk.index,
            system_instruction: system_instruction.to_string(),
            user_content: prompts.user_content(&chunk.text, chunk.preceding_context.as_deref()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessingOutcome
// ---------------------------------------------------------------------------

/// Result of processing one task, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success { content: String },
    Failure { message: String, retryable: bool },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

// ---------------------------------------------------------------------------
// PipelineResult
// ---------------------------------------------------------------------------

/// Whole-document calibration result.
///
/// `succeeded` is `true` only when every chunk was calibrated; otherwise
/// `final_text` is the untouched input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    pub final_text: String,
    pub status_message: String,
    pub succeeded: bool,
}

impl PipelineResult {
    pub fn calibrated(text: String) -> Self {
        Self {
            final_text: text,
            status_message: "Calibration succeeded".into(),
            succeeded: true,
        }
    }

    /// The run failed; hand back the original text.
    pub fn fallback(original: &str, reason: &str) -> Self {
        Self {
            final_text: original.to_string(),
            status_message: format!("Calibration failed ({reason})"),
            succeeded: false,
        }
    }

    /// The service is unusable; nothing was sent.
    pub fn skipped(original: &str, reason: &str) -> Self {
        Self {
            final_text: original.to_string(),
            status_message: format!("Calibration skipped ({reason})"),
            succeeded: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SummaryResult
// ---------------------------------------------------------------------------

/// Summarization result. Serializes as `{"summary": …}` or
/// `{"error_message": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryResult {
    Summary(String),
    ErrorMessage(String),
}

impl SummaryResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, SummaryResult::Summary(_))
    }
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Whole-document failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The remote service is missing credentials, endpoint or model.
    #[error("service unavailable: {0}")]
    NotConfigured(String),

    /// Input was empty or blank.
    #[error("nothing to process")]
    EmptyInput,

    /// One chunk failed after its retries; the whole run is discarded.
    #[error("chunk {index} failed: {message}")]
    ChunkFailed { index: usize, message: String },

    /// The final summarization call failed.
    #[error("final synthesis failed: {0}")]
    ReduceFailed(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_document_threads_previous_last_sentence() {
        let chunks = Chunk::from_document("One. Two. Three. Four.", 10, true);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].preceding_context, None);
        assert_eq!(chunks[1].preceding_context.as_deref(), Some("Two."));
        assert_eq!(chunks[2].preceding_context.as_deref(), Some("Three."));
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn from_document_without_context() {
        let chunks = Chunk::from_document("One. Two. Three. Four.", 10, false);
        assert!(chunks.iter().all(|c| c.preceding_context.is_none()));
    }

    #[test]
    fn task_wraps_only_when_context_present() {
        let prompts = PromptBuilder::default();
        let chunks = Chunk::from_document("One. Two. Three. Four.", 10, true);

        let first = ProcessingTask::new(&chunks[0], "sys", &prompts);
        let second = ProcessingTask::new(&chunks[1], "sys", &prompts);

        assert_eq!(first.user_content, chunks[0].text);
        assert!(second.user_content.contains("---CONTEXT---\nTwo."));
        assert_eq!(second.index, 1);
    }

    #[test]
    fn pipeline_result_serializes_external_shape() {
        let json = serde_json::to_value(PipelineResult::calibrated("ok".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "final_text": "ok",
                "status_message": "Calibration succeeded",
                "succeeded": true
            })
        );
    }

    #[test]
    fn summary_result_serializes_as_tagged_object() {
        let ok = serde_json::to_value(SummaryResult::Summary("s".into())).unwrap();
        let err = serde_json::to_value(SummaryResult::ErrorMessage("e".into())).unwrap();
        assert_eq!(ok, serde_json::json!({ "summary": "s" }));
        assert_eq!(err, serde_json::json!({ "error_message": "e" }));
    }

    #[test]
    fn fallback_keeps_original_text() {
        let result = PipelineResult::fallback("raw", "API error 401: bad key");
        assert_eq!(result.final_text, "raw");
        assert!(!result.succeeded);
        assert_eq!(result.status_message, "Calibration failed (API error 401: bad key)");
    }
}
