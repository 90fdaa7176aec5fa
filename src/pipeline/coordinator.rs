//! Bounded-concurrency dispatch with order-preserving results.
//!
//! At most `max_workers` tasks are in flight; the rest queue until any slot
//! frees up, so one slow task never holds back the ones queued behind it.
//! Results come back index-aligned with the input no matter which task
//! finishes first, because assembly downstream is positional. A failing task
//! never cancels its siblings: the caller needs the full batch to make its
//! all-or-nothing decision.

use futures::stream::{self, StreamExt};

use super::processor::ChunkProcessor;
use super::types::{ProcessingOutcome, ProcessingTask};

/// Runs a batch of tasks through a [`ChunkProcessor`].
#[derive(Debug, Clone, Copy)]
pub struct Coordinator {
    max_workers: usize,
}

impl Coordinator {
    /// `max_workers` of zero is treated as one.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Process every task; `output[i]` belongs to `tasks[i]`.
    pub async fn run_all(
        &self,
        processor: &ChunkProcessor,
        tasks: Vec<ProcessingTask>,
    ) -> Vec<ProcessingOutcome> {
        log::debug!(
            "dispatching {} tasks on {} workers",
            tasks.len(),
            self.max_workers
        );

        // Completion order is arbitrary; tag each outcome with its slot.
        let mut finished: Vec<(usize, ProcessingOutcome)> =
            stream::iter(tasks.iter().enumerate().map(move |(slot, task)| async move {
                (slot, processor.process(task).await)
            }))
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        finished.sort_unstable_by_key(|(slot, _)| *slot);
        finished.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
