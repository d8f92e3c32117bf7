use crate::device::primitives;
use crate::engine::slot::{ShardSlot, StoredOrder};
use crate::program::VertexProgram;
use crate::types::Vertex;

/// Runs the gather phase for one staged shard: edge-count scan with the
/// virtual sink edge, load-balanced gather-map over the shard's incoming
/// edges, and a segmented reduce by destination into the global
/// accumulator. Destinations are emitted as global ids, so shards populate
/// disjoint ranges of `gather_tmp`.
///
/// Returns the number of expanded output slots.
pub(crate) fn gather_shard<P: VertexProgram>(
    program: &P,
    slot: &mut ShardSlot<P>,
    active: &[Vertex],
    vertex_data: &[P::VertexData],
    stored_edge_data: &[P::EdgeData],
    stored: StoredOrder,
    gather_tmp: &mut [P::GatherResult],
) -> u64 {
    let n = active.len();
    if n == 0 {
        return 0;
    }
    let vertex_offset = slot.vertex_offset;
    let ShardSlot {
        src_offsets,
        srcs,
        edge_data,
        edge_index,
        edge_count_scan,
        gather_keys,
        gather_vals,
        ..
    } = slot;

    // Every active vertex contributes at least one slot; sinks get a
    // virtual edge so the reduce emits their identity value.
    let total = primitives::exclusive_scan_by(
        n,
        |i| {
            let a = (active[i] - vertex_offset) as usize;
            (src_offsets[a + 1] - src_offsets[a]).max(1)
        },
        edge_count_scan,
    ) as usize;

    let zero = program.gather_zero();
    gather_keys.clear();
    gather_keys.resize(total, 0);
    gather_vals.clear();
    gather_vals.resize(total, zero.clone());

    primitives::expand_into(edge_count_scan, total, gather_keys, gather_vals, |i, rank| {
        let a_global = active[i];
        let a = (a_global - vertex_offset) as usize;
        let begin = src_offsets[a];
        if src_offsets[a + 1] == begin {
            return (a_global, zero.clone());
        }
        let pos = (begin + rank) as usize;
        let src = srcs[pos];
        let edge = match stored {
            StoredOrder::Incoming => &edge_data[pos],
            StoredOrder::Outgoing => &stored_edge_data[edge_index[pos] as usize],
        };
        let value = program.gather_map(
            &vertex_data[src as usize],
            &vertex_data[a_global as usize],
            edge,
        );
        (a_global, value)
    });

    primitives::reduce_by_key_runs(
        gather_keys,
        gather_vals,
        |a, b| program.gather_reduce(a, b),
        |dst, value| {
            gather_tmp[dst as usize] = value;
        },
    );

    total as u64
}
