//! Text chunking.
//!
//! * [`split`]: sentence-aware splitting near a target size.
//! * [`last_sentence`]: trailing context carried into the next chunk.

pub mod context;
pub mod splitter;

pub use context::last_sentence;
pub use splitter::{split, SENTENCE_DELIMITERS};
