//! Progress reporting for the per-document loop.
//!
//! The pipeline only knows about [`ProgressCallback`]; the binary plugs in
//! an `indicatif` bar and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a long-running loop.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message shown next to the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A [`ProgressCallback`] that ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
