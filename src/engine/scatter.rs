use std::sync::atomic::{AtomicU8, Ordering};

use crate::device::primitives;
use crate::engine::slot::ShardSlot;
use crate::program::VertexProgram;
use crate::types::Vertex;

/// How the scatter hook reaches edge state for the shard's out-edges.
pub(crate) enum ScatterEdges<'a, E> {
    /// Edge state is staged in the slot in outgoing order; mutations are
    /// written back on eviction.
    Staged,
    /// Edge state is stored in incoming order; the hook writes the
    /// engine-resident array through the slot's permutation slice, whose
    /// targets may lie outside this shard.
    Permuted(&'a mut [E]),
}

/// Phase A of scatter for one staged shard: expand the out-edges of every
/// vertex whose apply verdict was true and raise the destination flags.
/// All writers store the same constant, so cross-shard concurrency on the
/// flag array is idempotent.
///
/// Returns the number of out-edges traversed.
pub(crate) fn scatter_shard<P: VertexProgram>(
    program: &P,
    slot: &mut ShardSlot<P>,
    active: &[Vertex],
    apply_ret: &[u8],
    vertex_data: &[P::VertexData],
    active_flags: &[AtomicU8],
    edges: ScatterEdges<'_, P::EdgeData>,
) -> u64 {
    let n = active.len();
    if n == 0 {
        return 0;
    }
    let vertex_offset = slot.vertex_offset;
    let ShardSlot {
        dst_offsets,
        dsts,
        edge_data,
        edge_index,
        edge_dirty,
        edge_count_scan,
        ..
    } = slot;

    let total = primitives::exclusive_scan_by(
        n,
        |i| {
            if apply_ret[active[i] as usize] == 0 {
                return 0;
            }
            let a = (active[i] - vertex_offset) as usize;
            dst_offsets[a + 1] - dst_offsets[a]
        },
        edge_count_scan,
    ) as usize;
    if total == 0 {
        return 0;
    }

    if program.uses_scatter() {
        // The hook takes the edge mutably, so this path stays sequential.
        let visit = |pos: usize, a_global: Vertex, edge: &mut P::EdgeData| {
            let d = dsts[pos];
            program.scatter(
                &vertex_data[a_global as usize],
                &vertex_data[d as usize],
                edge,
            );
            active_flags[d as usize].store(1, Ordering::Relaxed);
        };
        match edges {
            ScatterEdges::Staged => {
                *edge_dirty = true;
                for (i, &a_global) in active.iter().enumerate() {
                    if edge_count_scan[i + 1] == edge_count_scan[i] {
                        continue;
                    }
                    let a = (a_global - vertex_offset) as usize;
                    for pos in dst_offsets[a]..dst_offsets[a + 1] {
                        visit(pos as usize, a_global, &mut edge_data[pos as usize]);
                    }
                }
            }
            ScatterEdges::Permuted(global) => {
                for (i, &a_global) in active.iter().enumerate() {
                    if edge_count_scan[i + 1] == edge_count_scan[i] {
                        continue;
                    }
                    let a = (a_global - vertex_offset) as usize;
                    for pos in dst_offsets[a]..dst_offsets[a + 1] {
                        let stored = edge_index[pos as usize] as usize;
                        visit(pos as usize, a_global, &mut global[stored]);
                    }
                }
            }
        }
    } else {
        primitives::for_each_expanded(edge_count_scan, total, |i, rank| {
            let a = (active[i] - vertex_offset) as usize;
            let d = dsts[(dst_offsets[a] + rank) as usize];
            active_flags[d as usize].store(1, Ordering::Relaxed);
        });
    }

    total as u64
}
