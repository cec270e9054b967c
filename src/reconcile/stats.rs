use serde::Serialize;

/// Running counters for a single store instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Actions enqueued.
    pub dispatched: u64,
    /// Actions settled successfully and folded into the base state.
    pub confirmed: u64,
    /// Actions settled with a failure and rolled back.
    pub failed: u64,
    /// Settle callbacks ignored because a reset had advanced the generation.
    pub stale: u64,
    /// Pending entries dropped by resets.
    pub discarded: u64,
    /// Number of resets.
    pub resets: u64,
}

impl StoreStats {
    /// Actions dispatched but neither settled nor discarded.
    pub fn outstanding(&self) -> u64 {
        self.dispatched
            .saturating_sub(self.confirmed)
            .saturating_sub(self.failed)
            .saturating_sub(self.discarded)
    }
}
