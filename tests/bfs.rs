use tessera::{EngineConfig, GasEngine, VertexProgram};

const UNREACHED: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct BfsState {
    depth: u32,
    settled: bool,
}

struct Bfs;

impl VertexProgram for Bfs {
    type VertexData = BfsState;
    type EdgeData = ();
    type GatherResult = u32;

    fn gather_zero(&self) -> u32 {
        UNREACHED
    }

    fn gather_map(&self, src: &BfsState, _dst: &BfsState, _edge: &()) -> u32 {
        src.depth.saturating_add(1)
    }

    fn gather_reduce(&self, a: &u32, b: &u32) -> u32 {
        *a.min(b)
    }

    fn apply(&self, vertex: &mut BfsState, gathered: &u32) -> bool {
        if !vertex.settled {
            vertex.settled = true;
            if *gathered < vertex.depth {
                vertex.depth = *gathered;
            }
            return true;
        }
        if *gathered < vertex.depth {
            vertex.depth = *gathered;
            return true;
        }
        false
    }
}

fn bfs_engine(n: usize, srcs: &[u32], dsts: &[u32], source: u32) -> GasEngine<Bfs> {
    let vertex_data: Vec<BfsState> = (0..n as u32)
        .map(|v| BfsState { depth: if v == source { 0 } else { UNREACHED }, settled: false })
        .collect();
    let mut engine = GasEngine::from_edge_list(
        Bfs,
        EngineConfig::default(),
        n,
        vertex_data,
        srcs,
        dsts,
        vec![(); srcs.len()],
    )
    .unwrap();
    engine.set_active(source, source + 1).unwrap();
    engine
}

fn chain_edges(n: u32) -> (Vec<u32>, Vec<u32>) {
    ((0..n - 1).collect(), (1..n).collect())
}

#[test]
fn line_graph_settles_one_depth_per_iteration() {
    let (srcs, dsts) = chain_edges(5);
    let mut engine = bfs_engine(5, &srcs, &dsts, 0);

    let mut frontiers = Vec::new();
    while engine.count_active() > 0 {
        engine.gather().unwrap();
        engine.apply();
        engine.scatter_activate().unwrap();
        engine.next_iter();
        frontiers.push(engine.active_vertices().to_vec());
    }

    assert_eq!(
        frontiers,
        vec![vec![1], vec![2], vec![3], vec![4], vec![]],
        "each iteration advances the wave by one vertex"
    );

    let depths: Vec<u32> = engine.results().iter().map(|s| s.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 3, 4]);
}

#[test]
fn line_graph_run_drains_on_the_fifth_iteration() {
    let (srcs, dsts) = chain_edges(5);
    let mut engine = bfs_engine(5, &srcs, &dsts, 0);

    let iterations = engine.run().unwrap();
    assert_eq!(iterations, 5);
    assert_eq!(engine.count_active(), 0);

    let depths: Vec<u32> = engine.results().iter().map(|s| s.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 3, 4]);
}

#[test]
fn cycle_terminates_without_revisiting_settled_vertices() {
    let mut engine = bfs_engine(3, &[0, 1, 2], &[1, 2, 0], 0);
    let iterations = engine.run().unwrap();
    assert_eq!(iterations, 4);

    let depths: Vec<u32> = engine.results().iter().map(|s| s.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[test]
fn disconnected_component_stays_unreached() {
    // 0 -> 1 and an isolated pair 2 -> 3.
    let mut engine = bfs_engine(4, &[0, 2], &[1, 3], 0);
    engine.run().unwrap();

    let depths: Vec<u32> = engine.results().iter().map(|s| s.depth).collect();
    assert_eq!(depths, vec![0, 1, UNREACHED, UNREACHED]);
}

struct NeverActivate;

impl VertexProgram for NeverActivate {
    type VertexData = u64;
    type EdgeData = ();
    type GatherResult = u64;

    fn gather_zero(&self) -> u64 {
        0
    }
    fn gather_map(&self, src: &u64, _dst: &u64, _edge: &()) -> u64 {
        *src
    }
    fn gather_reduce(&self, a: &u64, b: &u64) -> u64 {
        a + b
    }
    fn apply(&self, _vertex: &mut u64, _gathered: &u64) -> bool {
        false
    }
}

#[test]
fn an_apply_that_never_activates_terminates_after_one_iteration() {
    let (srcs, dsts) = chain_edges(5);
    let mut engine = GasEngine::from_edge_list(
        NeverActivate,
        EngineConfig::default(),
        5,
        vec![0u64; 5],
        &srcs,
        &dsts,
        vec![(); srcs.len()],
    )
    .unwrap();
    engine.set_active(0, 5).unwrap();

    let iterations = engine.run().unwrap();
    assert_eq!(iterations, 1);
    assert_eq!(engine.count_active(), 0);
}
