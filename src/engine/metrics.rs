use serde::{Deserialize, Serialize};

/// Counters accumulated over the lifetime of an engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub iterations: u64,
    pub shards_staged: u64,
    pub shards_evicted: u64,
    pub gather_launches: u64,
    pub scatter_launches: u64,
    /// Output slots expanded by gather, including virtual sink edges.
    pub edges_gathered: u64,
    /// Out-edges traversed while activating neighborhoods.
    pub edges_scattered: u64,
    /// Largest frontier observed after any scatter phase.
    pub peak_frontier: u64,
}

impl EngineMetrics {
    pub(crate) fn record_gather(&mut self, shards: u64, expanded: u64) {
        self.gather_launches += shards;
        self.edges_gathered += expanded;
    }

    pub(crate) fn record_scatter(&mut self, shards: u64, expanded: u64) {
        self.scatter_launches += shards;
        self.edges_scattered += expanded;
    }

    pub(crate) fn record_frontier(&mut self, n_active: u64) {
        self.peak_frontier = self.peak_frontier.max(n_active);
    }
}
