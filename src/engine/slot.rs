use parking_lot::Mutex;
use tracing::trace;

use crate::error::{EngineError, Result};
use crate::graph::Topology;
use crate::plan::ShardPlan;
use crate::program::VertexProgram;
use crate::types::Vertex;

/// Which view's order the engine's edge-state array follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoredOrder {
    /// Incoming (gather) order; the outgoing view goes through the
    /// permutation.
    Incoming,
    /// Outgoing (scatter) order; the incoming view goes through the
    /// permutation.
    Outgoing,
}

/// One accelerator-resident shard slot: the staged cold payload of a single
/// shard plus the scratch the gather kernels need. Buffers are allocated
/// once, sized for the largest shard, and reused across stagings.
pub(crate) struct ShardSlot<P: VertexProgram> {
    resident: Option<usize>,
    /// First global vertex id of the resident shard.
    pub vertex_offset: Vertex,
    /// Rebased incoming offsets, `|V_k| + 1` entries.
    pub src_offsets: Vec<u32>,
    /// Global source ids of the shard's incoming edges.
    pub srcs: Vec<Vertex>,
    /// Rebased outgoing offsets, `|V_k| + 1` entries.
    pub dst_offsets: Vec<u32>,
    /// Global destination ids of the shard's outgoing edges.
    pub dsts: Vec<Vertex>,
    /// Stored-order edge-state slice of the resident shard.
    pub edge_data: Vec<P::EdgeData>,
    /// Other-view slice of the cross-view permutation; values are positions
    /// in the engine-resident stored-order array.
    pub edge_index: Vec<u32>,
    /// Set when a scatter hook mutated `edge_data`; eviction writes back.
    pub edge_dirty: bool,

    pub edge_count_scan: Vec<u32>,
    pub gather_keys: Vec<Vertex>,
    pub gather_vals: Vec<P::GatherResult>,

    max_vertices: usize,
    max_csc_edges: usize,
    max_csr_edges: usize,
}

impl<P: VertexProgram> ShardSlot<P> {
    fn new(plan: &ShardPlan) -> Self {
        let max_vertices = plan.max_shard_vertices();
        let max_csc = plan.max_shard_csc_edges();
        let max_csr = plan.max_shard_csr_edges();
        Self {
            resident: None,
            vertex_offset: 0,
            src_offsets: Vec::with_capacity(max_vertices + 1),
            srcs: Vec::with_capacity(max_csc),
            dst_offsets: Vec::with_capacity(max_vertices + 1),
            dsts: Vec::with_capacity(max_csr),
            edge_data: Vec::with_capacity(max_csc.max(max_csr)),
            edge_index: Vec::with_capacity(max_csc.max(max_csr)),
            edge_dirty: false,
            edge_count_scan: Vec::with_capacity(max_vertices + 1),
            // Gather emits at most one slot per edge plus one virtual slot
            // per vertex of the shard.
            gather_keys: Vec::with_capacity(max_csc + max_vertices),
            gather_vals: Vec::with_capacity(max_csc + max_vertices),
            max_vertices,
            max_csc_edges: max_csc,
            max_csr_edges: max_csr,
        }
    }

    /// Copies shard `k`'s cold payload into this slot.
    pub fn stage(
        &mut self,
        k: usize,
        topology: &Topology,
        plan: &ShardPlan,
        edge_data: &[P::EdgeData],
        edge_index: &[u32],
        stored: StoredOrder,
    ) -> Result<()> {
        debug_assert!(!self.edge_dirty, "staging over unevicted mutations");

        let csc = plan.csc_edge_range(k);
        let csr = plan.csr_edge_range(k);
        if plan.vertex_count(k) > self.max_vertices
            || csc.len() > self.max_csc_edges
            || csr.len() > self.max_csr_edges
        {
            return Err(EngineError::Plan(format!(
                "shard {k} exceeds the slot capacity it was planned for"
            )));
        }

        self.vertex_offset = plan.vertex_range(k).start;

        self.src_offsets.clear();
        self.src_offsets.extend_from_slice(plan.local_src_offsets(k));
        self.srcs.clear();
        self.srcs.extend_from_slice(&topology.csc.adjacency[csc.clone()]);

        self.dst_offsets.clear();
        self.dst_offsets.extend_from_slice(plan.local_dst_offsets(k));
        self.dsts.clear();
        self.dsts.extend_from_slice(&topology.csr.adjacency[csr.clone()]);

        let (stored_range, other_range) = match stored {
            StoredOrder::Incoming => (csc.clone(), csr),
            StoredOrder::Outgoing => (csr, csc),
        };
        self.edge_data.clear();
        self.edge_data.extend_from_slice(&edge_data[stored_range]);
        self.edge_index.clear();
        self.edge_index.extend_from_slice(&edge_index[other_range]);

        self.resident = Some(k);
        trace!(shard = k, vertices = plan.vertex_count(k), "staged shard");
        Ok(())
    }

    /// Writes mutated edge state back into `writeback` (the shard's slice of
    /// the engine-resident stored-order array) and releases the slot.
    pub fn evict(&mut self, writeback: &mut [P::EdgeData]) {
        if self.edge_dirty {
            writeback.clone_from_slice(&self.edge_data);
            self.edge_dirty = false;
            trace!(shard = ?self.resident, "evicted mutated edge state");
        }
        self.resident = None;
    }

    /// Releases the slot without write-back; valid only when nothing was
    /// mutated.
    pub fn release(&mut self) {
        debug_assert!(!self.edge_dirty, "released a dirty slot");
        self.resident = None;
    }

    #[cfg(test)]
    pub fn resident(&self) -> Option<usize> {
        self.resident
    }
}

/// Fixed pool of shard slots. The lock expresses hand-off between the
/// compute path and the staging thread, not shared access.
pub(crate) struct SlotPool<P: VertexProgram> {
    slots: Vec<Mutex<ShardSlot<P>>>,
}

impl<P: VertexProgram> SlotPool<P> {
    pub fn new(plan: &ShardPlan, slot_count: usize) -> Self {
        let slots = (0..slot_count).map(|_| Mutex::new(ShardSlot::new(plan))).collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, i: usize) -> &Mutex<ShardSlot<P>> {
        &self.slots[i]
    }
}
