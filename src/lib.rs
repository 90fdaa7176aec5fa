//! Transcript calibration and summarization over a remote LLM.
//!
//! Long transcripts are split at sentence boundaries, processed chunk by
//! chunk under a worker cap with retry, and reassembled in order:
//!
//! * [`pipeline::Calibrator`]: corrected text, or the original on any failure;
//! * [`pipeline::Summarizer`]: map-reduce summary.

pub mod chunking;
pub mod config;
pub mod llm;
pub mod pipeline;
