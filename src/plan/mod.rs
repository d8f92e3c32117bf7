//! Shard planning: partition the vertex space into contiguous ranges whose
//! combined in+out edge count fits a budget, and rebase both views' offset
//! arrays so each shard can be traversed with shard-local indices.

mod planner;

pub use planner::plan_shards;

use std::ops::Range;

use crate::error::{EngineError, Result};
use crate::graph::Topology;
use crate::types::Vertex;

/// The shard map: contiguous vertex ranges plus the derived tables the
/// engine needs to stage and address one shard at a time.
#[derive(Debug, Clone)]
pub struct ShardPlan {
    /// Prefix of shard vertex counts; length `K + 1`, last entry `V`.
    pub(crate) vertex_starts: Vec<u32>,
    /// Prefix of per-shard incoming edge counts; length `K + 1`.
    pub(crate) edge_starts_csc: Vec<u32>,
    /// Prefix of per-shard outgoing edge counts; length `K + 1`.
    pub(crate) edge_starts_csr: Vec<u32>,
    /// Owning shard of each vertex; length `V`.
    pub(crate) shard_of_vertex: Vec<u32>,
    /// Concatenated per-shard rebased incoming offsets. Shard `k`'s slice
    /// has length `|V_k| + 1` and starts at `vertex_starts[k] + k`.
    pub(crate) local_src_offsets: Vec<u32>,
    /// Concatenated per-shard rebased outgoing offsets, same layout.
    pub(crate) local_dst_offsets: Vec<u32>,
    pub(crate) max_shard_vertices: usize,
    pub(crate) max_shard_csc_edges: usize,
    pub(crate) max_shard_csr_edges: usize,
}

impl ShardPlan {
    pub fn shard_count(&self) -> usize {
        self.vertex_starts.len() - 1
    }

    /// Global vertex ids owned by shard `k`, half-open.
    pub fn vertex_range(&self, k: usize) -> Range<Vertex> {
        self.vertex_starts[k]..self.vertex_starts[k + 1]
    }

    pub fn vertex_count(&self, k: usize) -> usize {
        (self.vertex_starts[k + 1] - self.vertex_starts[k]) as usize
    }

    /// Positions of shard `k`'s edges in the incoming view.
    pub fn csc_edge_range(&self, k: usize) -> Range<usize> {
        self.edge_starts_csc[k] as usize..self.edge_starts_csc[k + 1] as usize
    }

    /// Positions of shard `k`'s edges in the outgoing view.
    pub fn csr_edge_range(&self, k: usize) -> Range<usize> {
        self.edge_starts_csr[k] as usize..self.edge_starts_csr[k + 1] as usize
    }

    /// Shard `k`'s rebased incoming offsets, length `|V_k| + 1`.
    pub fn local_src_offsets(&self, k: usize) -> &[u32] {
        let base = self.vertex_starts[k] as usize + k;
        &self.local_src_offsets[base..base + self.vertex_count(k) + 1]
    }

    /// Shard `k`'s rebased outgoing offsets, length `|V_k| + 1`.
    pub fn local_dst_offsets(&self, k: usize) -> &[u32] {
        let base = self.vertex_starts[k] as usize + k;
        &self.local_dst_offsets[base..base + self.vertex_count(k) + 1]
    }

    /// Shard owning vertex `v`.
    pub fn shard_of(&self, v: Vertex) -> usize {
        self.shard_of_vertex[v as usize] as usize
    }

    pub fn max_shard_vertices(&self) -> usize {
        self.max_shard_vertices
    }

    pub fn max_shard_csc_edges(&self) -> usize {
        self.max_shard_csc_edges
    }

    pub fn max_shard_csr_edges(&self) -> usize {
        self.max_shard_csr_edges
    }

    /// Re-checks the shard-map invariants against the topology it was
    /// planned from: budget compliance, prefix consistency, and the rebased
    /// local offsets.
    pub fn verify(&self, topology: &Topology, edge_budget: usize) -> Result<()> {
        if *self.vertex_starts.last().unwrap_or(&0) as usize != topology.n_vertices() {
            return Err(EngineError::Plan(
                "vertex prefix does not cover the vertex space".into(),
            ));
        }
        for k in 0..self.shard_count() {
            let vertices = self.vertex_count(k);
            let weight = self.csc_edge_range(k).len() + self.csr_edge_range(k).len();
            if weight > edge_budget && vertices != 1 {
                return Err(EngineError::Plan(format!(
                    "shard {k} holds {weight} edges over budget {edge_budget} with {vertices} vertices"
                )));
            }
            let src_local = self.local_src_offsets(k);
            let dst_local = self.local_dst_offsets(k);
            if src_local[0] != 0 || dst_local[0] != 0 {
                return Err(EngineError::Plan(format!("shard {k} local offsets not rebased")));
            }
            for (j, v) in self.vertex_range(k).enumerate() {
                if self.shard_of(v) != k {
                    return Err(EngineError::Plan(format!(
                        "vertex {v} maps to shard {} instead of {k}",
                        self.shard_of(v)
                    )));
                }
                let global_csc = topology.csc.offsets[v as usize + 1];
                let global_csr = topology.csr.offsets[v as usize + 1];
                if src_local[j + 1] != global_csc - self.edge_starts_csc[k]
                    || dst_local[j + 1] != global_csr - self.edge_starts_csr[k]
                {
                    return Err(EngineError::Plan(format!(
                        "shard {k} local offsets disagree with the global views at vertex {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}
