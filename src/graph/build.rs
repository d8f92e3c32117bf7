use crate::error::{EngineError, Result};
use crate::types::{EdgePos, Vertex};

/// One direction of the edge structure in compressed sparse form.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyView {
    /// Per-vertex offsets into `adjacency`; length `V + 1`, last entry `E`.
    pub offsets: Vec<EdgePos>,
    /// Neighbor vertex ids, length `E`.
    pub adjacency: Vec<Vertex>,
    /// For each position in this view, the index of the same edge in the
    /// input edge list.
    pub input_index: Vec<EdgePos>,
}

impl AdjacencyView {
    /// Stable counting sort of the edge list keyed on `keys`; positions of
    /// equal keys preserve input order.
    fn build(n_vertices: usize, keys: &[Vertex], values: &[Vertex]) -> Self {
        let mut offsets = vec![0u32; n_vertices + 1];
        for &k in keys {
            offsets[k as usize + 1] += 1;
        }
        for v in 0..n_vertices {
            offsets[v + 1] += offsets[v];
        }

        let mut cursor = offsets.clone();
        let mut adjacency = vec![0u32; keys.len()];
        let mut input_index = vec![0u32; keys.len()];
        for (e, (&k, &v)) in keys.iter().zip(values).enumerate() {
            let pos = cursor[k as usize] as usize;
            cursor[k as usize] += 1;
            adjacency[pos] = v;
            input_index[pos] = e as u32;
        }

        Self { offsets, adjacency, input_index }
    }

    /// Number of neighbors of `v` in this view.
    pub fn degree(&self, v: Vertex) -> u32 {
        self.offsets[v as usize + 1] - self.offsets[v as usize]
    }

    /// Neighbor ids of `v` in this view.
    pub fn neighbors(&self, v: Vertex) -> &[Vertex] {
        let start = self.offsets[v as usize] as usize;
        let end = self.offsets[v as usize + 1] as usize;
        &self.adjacency[start..end]
    }
}

/// Immutable dual CSC/CSR topology over a dense `[0, V)` vertex space.
#[derive(Debug, Clone)]
pub struct Topology {
    n_vertices: usize,
    n_edges: usize,
    /// Incoming view: offsets by destination, adjacency lists sources.
    pub csc: AdjacencyView,
    /// Outgoing view: offsets by source, adjacency lists destinations.
    pub csr: AdjacencyView,
}

impl Topology {
    /// Builds both views from a directed edge list.
    pub fn from_edge_list(n_vertices: usize, srcs: &[Vertex], dsts: &[Vertex]) -> Result<Self> {
        if srcs.len() != dsts.len() {
            return Err(EngineError::Ingest(format!(
                "edge list length mismatch: {} sources vs {} destinations",
                srcs.len(),
                dsts.len()
            )));
        }
        // V + E must fit the expansion scans, which count one virtual slot
        // per vertex on top of the edges.
        if n_vertices >= u32::MAX as usize || srcs.len() > u32::MAX as usize - n_vertices {
            return Err(EngineError::Ingest(
                "graph exceeds the 32-bit index space".into(),
            ));
        }
        for (e, (&s, &d)) in srcs.iter().zip(dsts).enumerate() {
            if s as usize >= n_vertices || d as usize >= n_vertices {
                return Err(EngineError::Ingest(format!(
                    "edge {e} ({s} -> {d}) references a vertex outside [0, {n_vertices})"
                )));
            }
        }

        Ok(Self {
            n_vertices,
            n_edges: srcs.len(),
            csc: AdjacencyView::build(n_vertices, dsts, srcs),
            csr: AdjacencyView::build(n_vertices, srcs, dsts),
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_edges(&self) -> usize {
        self.n_edges
    }

    /// Incoming-edge count of `v`.
    pub fn in_degree(&self, v: Vertex) -> u32 {
        self.csc.degree(v)
    }

    /// Outgoing-edge count of `v`.
    pub fn out_degree(&self, v: Vertex) -> u32 {
        self.csr.degree(v)
    }
}

/// For each position in view `a`, the position of the same edge in view `b`.
///
/// Both views must index the same edge list; the result is a bijection on
/// `[0, E)`.
pub fn cross_view_index(a: &AdjacencyView, b: &AdjacencyView) -> Vec<EdgePos> {
    let mut pos_in_b = vec![0u32; b.input_index.len()];
    for (p, &orig) in b.input_index.iter().enumerate() {
        pos_in_b[orig as usize] = p as u32;
    }
    a.input_index.iter().map(|&orig| pos_in_b[orig as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Topology {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        Topology::from_edge_list(4, &[0, 0, 1, 2], &[1, 2, 3, 3]).unwrap()
    }

    #[test]
    fn dual_views_agree_on_every_edge() {
        let srcs = vec![0, 0, 1, 2, 3, 3];
        let dsts = vec![1, 2, 3, 3, 0, 1];
        let topo = Topology::from_edge_list(4, &srcs, &dsts).unwrap();

        for (&s, &d) in srcs.iter().zip(&dsts) {
            assert!(topo.csc.neighbors(d).contains(&s));
            assert!(topo.csr.neighbors(s).contains(&d));
        }
        assert_eq!(*topo.csc.offsets.last().unwrap() as usize, srcs.len());
        assert_eq!(*topo.csr.offsets.last().unwrap() as usize, srcs.len());
    }

    #[test]
    fn degrees_match_edge_list() {
        let topo = diamond();
        assert_eq!(topo.out_degree(0), 2);
        assert_eq!(topo.in_degree(0), 0);
        assert_eq!(topo.in_degree(3), 2);
        assert_eq!(topo.out_degree(3), 0);
    }

    #[test]
    fn cross_view_index_is_a_bijection() {
        let topo = diamond();
        let perm = cross_view_index(&topo.csr, &topo.csc);
        let mut seen = vec![false; perm.len()];
        for &p in &perm {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));

        // The permuted position must hold the same edge.
        for (p_csr, &p_csc) in perm.iter().enumerate() {
            assert_eq!(
                topo.csr.input_index[p_csr],
                topo.csc.input_index[p_csc as usize]
            );
        }
    }

    #[test]
    fn parallel_edges_and_self_loops_survive_ingest() {
        let topo = Topology::from_edge_list(2, &[0, 0, 1], &[1, 1, 1]).unwrap();
        assert_eq!(topo.in_degree(1), 3);
        assert_eq!(topo.csc.neighbors(1), &[0, 0, 1]);
    }

    #[test]
    fn out_of_range_vertex_is_rejected() {
        let err = Topology::from_edge_list(2, &[0], &[2]).unwrap_err();
        assert!(matches!(err, EngineError::Ingest(_)));
    }

    #[test]
    fn mismatched_edge_arrays_are_rejected() {
        let err = Topology::from_edge_list(2, &[0, 1], &[1]).unwrap_err();
        assert!(matches!(err, EngineError::Ingest(_)));
    }

    #[test]
    fn empty_graph_builds() {
        let topo = Topology::from_edge_list(0, &[], &[]).unwrap();
        assert_eq!(topo.n_vertices(), 0);
        assert_eq!(topo.n_edges(), 0);
    }
}
