//! Chunked, concurrent transformation pipelines.
//!
//! # Architecture
//!
//! ```text
//! text ──▶ chunking::split ──▶ Chunk[] ──▶ ProcessingTask[]
//!                                              │
//!                                              ▼
//!                               Coordinator (max_workers in flight)
//!                                              │  ChunkProcessor per task
//!                                              │  (retry + linear backoff)
//!                                              ▼
//!                               ProcessingOutcome[] in chunk order
//!                                   │                      │
//!                       Calibrator: concat or      Summarizer: join points,
//!                       fall back to original      one synthesis request
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use transcript_calibrate::config::AppConfig;
//! use transcript_calibrate::pipeline::Calibrator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap_or_default();
//!     let calibrator = Calibrator::from_config(&config);
//!
//!     let result = calibrator.calibrate("um so the meeting uh started late").await;
//!     println!("{} ({})", result.final_text, result.status_message);
//! }
//! ```

pub mod calibrate;
pub mod coordinator;
pub mod processor;
pub mod summarize;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use calibrate::Calibrator;
pub use coordinator::Coordinator;
pub use processor::ChunkProcessor;
pub use summarize::Summarizer;
pub use types::{
    Chunk, PipelineError, PipelineResult, ProcessingOutcome, ProcessingTask, SummaryResult,
};
