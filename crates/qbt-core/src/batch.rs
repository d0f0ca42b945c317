//! Chunked application of bulk mutations.
//!
//! # Design
//! - Chunks are consecutive ranges over the caller's list; all hold `size` items except
//!   possibly the last.
//! - Chunks are applied strictly in order, one at a time.
//! - The first failing chunk ends the run and its error is returned unchanged. Chunks
//!   already applied are not rolled back.

use std::future::Future;
use std::num::NonZeroUsize;
use std::ops::Range;

use tracing::{debug, warn};

/// Default number of hashes carried by a single delete request.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => panic!("default batch size must be non-zero"),
};

/// Outcome of a fully applied batched run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of chunks applied.
    pub batches: usize,
    /// Number of items covered by those chunks.
    pub items: usize,
}

/// Chunk ranges for a list of `total` items.
pub fn plan_batches(total: usize, size: NonZeroUsize) -> impl Iterator<Item = Range<usize>> {
    let size = size.get();
    (0..total)
        .step_by(size)
        .map(move |start| start..start.saturating_add(size).min(total))
}

/// Apply `apply` to each chunk range of a list of `total` items.
///
/// An empty list succeeds without calling `apply`.
///
/// # Errors
///
/// Returns the error of the first failing chunk; later chunks are never attempted.
pub async fn run_batched<F, Fut, E>(
    total: usize,
    size: NonZeroUsize,
    mut apply: F,
) -> Result<BatchSummary, E>
where
    F: FnMut(Range<usize>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut summary = BatchSummary::default();
    for range in plan_batches(total, size) {
        let (start, end) = (range.start, range.end);
        if let Err(err) = apply(range).await {
            warn!(
                start,
                end,
                applied = summary.batches,
                "batch failed; remaining batches skipped"
            );
            return Err(err);
        }
        summary.batches += 1;
        summary.items += end - start;
        debug!(start, end, "batch applied");
    }
    Ok(summary)
}
