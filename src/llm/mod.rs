//! Remote LLM capability.
//!
//! This module provides:
//! * [`InstructionSender`]: async trait for "send instruction + text, get text".
//! * [`ApiSender`]: OpenAI-compatible REST implementation.
//! * [`LlmError`] / [`ErrorKind`]: transport errors tagged retryable or not.
//! * [`PromptBuilder`]: instruction texts and context wrapping.

pub mod client;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{
    extract_api_error_message, ApiSender, ErrorKind, InstructionSender, LlmError,
    NON_RETRYABLE_STATUS,
};
pub use prompt::{
    PromptBuilder, DEFAULT_CALIBRATION_PROMPT, DEFAULT_KEY_POINTS_PROMPT,
    DEFAULT_SYNTHESIS_PROMPT,
};

// test-only re-export so pipeline tests can build a scripted sender.
#[cfg(test)]
pub use client::MockSender;
