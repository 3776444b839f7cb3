//! Phase progress reporting.
//!
//! Jobs report progress per phase (loading, counting, filtering, writing,
//! publishing), never per record to the log. Frontends decide how to render it.

/// Receives progress for one phase at a time.
pub trait Progress {
    /// A phase begins; `total` is the number of steps if known.
    fn start(&self, phase: &str, total: Option<u64>);

    /// `n` more steps of the current phase completed.
    fn advance(&self, n: u64);

    /// The current phase is done.
    fn finish(&self, summary: &str);
}

/// Discards all progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _phase: &str, _total: Option<u64>) {}

    fn advance(&self, _n: u64) {}

    fn finish(&self, _summary: &str) {}
}
