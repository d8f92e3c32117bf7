use std::sync::atomic::{AtomicU8, Ordering};

use rayon::prelude::*;

use crate::device::primitives;
use crate::plan::ShardPlan;
use crate::types::Vertex;

/// The compact ordered frontier.
///
/// Invariant: `active` holds global vertex ids grouped by shard in shard
/// order, ascending within each group; `starts[k]..starts[k + 1]` bounds
/// shard `k`'s group. Because shards own contiguous ascending vertex
/// ranges, the whole list is globally ascending.
pub(crate) struct Frontier {
    active: Vec<Vertex>,
    starts: Vec<u32>,
}

impl Frontier {
    pub fn new(shard_count: usize) -> Self {
        Self { active: Vec::new(), starts: vec![0; shard_count + 1] }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.active
    }

    pub fn shard_len(&self, k: usize) -> usize {
        (self.starts[k + 1] - self.starts[k]) as usize
    }

    pub fn shard_slice(&self, k: usize) -> &[Vertex] {
        &self.active[self.starts[k] as usize..self.starts[k + 1] as usize]
    }

    pub fn per_shard_counts(&self) -> Vec<u32> {
        self.starts.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Replaces the frontier with the half-open vertex range
    /// `[start, end)`, clipped against each shard's range for the
    /// per-shard bookkeeping.
    pub fn set_range(&mut self, plan: &ShardPlan, start: Vertex, end: Vertex) {
        self.active.clear();
        self.active.extend(start..end);
        for k in 0..plan.shard_count() {
            let range = plan.vertex_range(k);
            let clipped_start = range.start.max(start);
            let clipped_end = range.end.min(end);
            let count = clipped_end.saturating_sub(clipped_start);
            self.starts[k + 1] = self.starts[k] + count;
        }
    }

    /// Phase B of scatter: per-shard counts over each shard's flag range,
    /// then a global two-phase compact. Compaction preserves ascending
    /// order over contiguous shard ranges, so the grouping invariant holds
    /// by construction. Returns the new frontier size.
    pub fn rebuild(&mut self, plan: &ShardPlan, flags: &[AtomicU8]) -> usize {
        let counts: Vec<u32> = (0..plan.shard_count())
            .into_par_iter()
            .map(|k| {
                let range = plan.vertex_range(k);
                flags[range.start as usize..range.end as usize]
                    .iter()
                    .filter(|f| f.load(Ordering::Relaxed) != 0)
                    .count() as u32
            })
            .collect();
        for (k, c) in counts.iter().enumerate() {
            self.starts[k + 1] = self.starts[k] + c;
        }

        let total = primitives::compact_flags(flags, &mut self.active);
        debug_assert_eq!(total, *self.starts.last().unwrap_or(&0) as usize);
        total
    }
}
