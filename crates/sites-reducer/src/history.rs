//! History service seam
//!
//! Clearing the browser's own history store is somebody else's job. The
//! reducer only tells the service when to do it.

use std::sync::atomic::{AtomicUsize, Ordering};

/// External collaborator that owns persisted browsing history
pub trait HistoryService: Send + Sync {
    /// Drop all browsing history. Called at most once per reduction.
    fn clear_history(&self);
}

/// Service that only counts how often it was asked to clear
#[derive(Debug, Default)]
pub struct RecordingHistory {
    clears: AtomicUsize,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl HistoryService for RecordingHistory {
    fn clear_history(&self) {
        log::debug!("History clear requested");
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
