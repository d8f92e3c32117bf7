/// Maximum combined in+out edge count per shard when none is given.
pub const DEFAULT_EDGE_BUDGET: usize = 1 << 26;

/// Accelerator-resident shard slots when none is given; two slots let the
/// next shard stage while the current one computes.
pub const DEFAULT_SLOT_COUNT: usize = 2;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Edge budget `B`: maximum combined in+out edge count a shard may hold.
    pub edge_budget: usize,
    /// Number of shard slots `P` kept resident at once.
    pub slot_count: usize,
    /// When true, edge state is stored in incoming-view (gather) order and
    /// the outgoing view reaches it through a permutation; mirrored when
    /// false.
    pub sort_edges_for_gather: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            edge_budget: DEFAULT_EDGE_BUDGET,
            slot_count: DEFAULT_SLOT_COUNT,
            sort_edges_for_gather: true,
        }
    }
}

impl EngineConfig {
    /// Configuration with a specific shard edge budget.
    pub fn with_edge_budget(edge_budget: usize) -> Self {
        Self { edge_budget, ..Self::default() }
    }
}
