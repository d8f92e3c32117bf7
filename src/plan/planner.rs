use tracing::info;

use crate::graph::Topology;
use crate::plan::ShardPlan;

/// Cuts the vertex space into the smallest number of contiguous shards whose
/// combined in+out edge weight stays within `edge_budget`.
///
/// A single vertex heavier than the whole budget still forms a shard by
/// itself; vertices are never split. An empty graph yields zero shards.
pub fn plan_shards(topology: &Topology, edge_budget: usize) -> ShardPlan {
    let v = topology.n_vertices();

    // Exclusive prefix of per-vertex weights; weight_scan[i] is the total
    // weight of vertices [0, i). u64 because in+out can reach 2E.
    let mut weight_scan = vec![0u64; v + 1];
    for i in 0..v {
        let w = topology.in_degree(i as u32) as u64 + topology.out_degree(i as u32) as u64;
        weight_scan[i + 1] = weight_scan[i] + w;
    }

    let mut vertex_starts = vec![0u32];
    let mut prev = 0usize;
    while prev < v {
        let limit = weight_scan[prev] + edge_budget as u64;
        // First prefix index whose cumulative weight exceeds the budget.
        let p = weight_scan.partition_point(|&w| w <= limit);
        let end = if p - 1 > prev { p - 1 } else { prev + 1 };
        vertex_starts.push(end as u32);
        prev = end;
    }

    let k = vertex_starts.len() - 1;
    let mut edge_starts_csc = vec![0u32; k + 1];
    let mut edge_starts_csr = vec![0u32; k + 1];
    let mut shard_of_vertex = vec![0u32; v];
    let mut max_shard_vertices = 0usize;
    let mut max_shard_csc_edges = 0usize;
    let mut max_shard_csr_edges = 0usize;

    for s in 0..k {
        let start = vertex_starts[s] as usize;
        let end = vertex_starts[s + 1] as usize;
        edge_starts_csc[s + 1] = topology.csc.offsets[end];
        edge_starts_csr[s + 1] = topology.csr.offsets[end];
        for entry in &mut shard_of_vertex[start..end] {
            *entry = s as u32;
        }
        max_shard_vertices = max_shard_vertices.max(end - start);
        max_shard_csc_edges =
            max_shard_csc_edges.max((edge_starts_csc[s + 1] - edge_starts_csc[s]) as usize);
        max_shard_csr_edges =
            max_shard_csr_edges.max((edge_starts_csr[s + 1] - edge_starts_csr[s]) as usize);
    }

    // Rebase both offset views to shard-local positions in one linear pass.
    let mut local_src_offsets = vec![0u32; v + k];
    let mut local_dst_offsets = vec![0u32; v + k];
    for s in 0..k {
        let base = vertex_starts[s] as usize + s;
        let start = vertex_starts[s] as usize;
        let count = vertex_starts[s + 1] as usize - start;
        for j in 0..=count {
            local_src_offsets[base + j] = topology.csc.offsets[start + j] - edge_starts_csc[s];
            local_dst_offsets[base + j] = topology.csr.offsets[start + j] - edge_starts_csr[s];
        }
    }

    info!(
        shards = k,
        vertices = v,
        edges = topology.n_edges(),
        edge_budget,
        "planned shards"
    );

    ShardPlan {
        vertex_starts,
        edge_starts_csc,
        edge_starts_csr,
        shard_of_vertex,
        local_src_offsets,
        local_dst_offsets,
        max_shard_vertices,
        max_shard_csc_edges,
        max_shard_csr_edges,
    }
}
