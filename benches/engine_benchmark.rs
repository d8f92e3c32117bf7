use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera::{EngineConfig, GasEngine, VertexProgram};

struct WeightFlood;

impl VertexProgram for WeightFlood {
    type VertexData = u64;
    type EdgeData = u64;
    type GatherResult = u64;

    fn gather_zero(&self) -> u64 {
        0
    }
    fn gather_map(&self, src: &u64, _dst: &u64, edge: &u64) -> u64 {
        src.wrapping_mul(31).wrapping_add(*edge)
    }
    fn gather_reduce(&self, a: &u64, b: &u64) -> u64 {
        a.wrapping_add(*b)
    }
    fn apply(&self, vertex: &mut u64, gathered: &u64) -> bool {
        *vertex = vertex.wrapping_add(*gathered);
        true
    }
}

fn random_engine(n: u32, m: usize, edge_budget: usize) -> GasEngine<WeightFlood> {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let srcs: Vec<u32> = (0..m).map(|_| rng.gen_range(0..n)).collect();
    let dsts: Vec<u32> = (0..m).map(|_| rng.gen_range(0..n)).collect();
    let weights: Vec<u64> = (0..m).map(|_| rng.gen_range(1..100)).collect();
    let vertex_data: Vec<u64> = (0..n as u64).collect();

    GasEngine::from_edge_list(
        WeightFlood,
        EngineConfig::with_edge_budget(edge_budget),
        n as usize,
        vertex_data,
        &srcs,
        &dsts,
        weights,
    )
    .unwrap()
}

fn bench_full_iteration(c: &mut Criterion) {
    let n = 20_000u32;
    let m = 200_000usize;

    let mut group = c.benchmark_group("gas_iteration");
    for (label, edge_budget) in [("one_shard", usize::MAX >> 1), ("eight_shards", m / 4)] {
        let mut engine = random_engine(n, m, edge_budget);
        engine.set_active(0, n).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(label), &edge_budget, |b, _| {
            b.iter(|| {
                engine.gather().unwrap();
                engine.apply();
                engine.scatter_activate().unwrap();
                engine.next_iter()
            });
        });
    }
    group.finish();
}

fn bench_frontier_rebuild(c: &mut Criterion) {
    let n = 50_000u32;
    let m = 300_000usize;
    let mut engine = random_engine(n, m, m / 8);
    engine.set_active(0, n).unwrap();
    engine.gather().unwrap();
    engine.apply();

    c.bench_function("scatter_activate", |b| {
        b.iter(|| engine.scatter_activate().unwrap());
    });
}

criterion_group!(benches, bench_full_iteration, bench_frontier_rebuild);
criterion_main!(benches);
