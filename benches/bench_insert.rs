use std::time::Duration;

use anygraph::{Graph, MemoryBackend, NodeKey, SqliteBackend};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

const EDGE_SEED: u64 = 0xA17C;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);
const SCALES: &[usize] = &[100, 1_000];

#[derive(Clone, Copy)]
enum Adapter {
    Memory,
    Sqlite,
}

impl Adapter {
    fn label(self) -> &'static str {
        match self {
            Adapter::Memory => "memory",
            Adapter::Sqlite => "sqlite",
        }
    }

    fn open(self) -> Graph {
        match self {
            Adapter::Memory => Graph::new(MemoryBackend::undirected()),
            Adapter::Sqlite => Graph::new(SqliteBackend::open_in_memory(false).expect("sqlite")),
        }
    }
}

fn random_edges(nodes: usize) -> Vec<(NodeKey, NodeKey)> {
    let mut rng = StdRng::seed_from_u64(EDGE_SEED + nodes as u64);
    (0..nodes.saturating_mul(3))
        .map(|_| {
            let u = rng.gen_range(0..nodes as i64);
            let v = rng.gen_range(0..nodes as i64);
            (NodeKey::Int(u), NodeKey::Int(v))
        })
        .collect()
}

fn load(graph: &Graph, edges: &[(NodeKey, NodeKey)]) {
    let nx = graph.nx();
    for (u, v) in edges {
        nx.add_edge_with(u.clone(), v.clone(), [("w", 1)])
            .expect("edge insert");
    }
}

fn bench_insert_edges(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_edges");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for &nodes in SCALES {
        let edges = random_edges(nodes);
        for adapter in [Adapter::Memory, Adapter::Sqlite] {
            let id = BenchmarkId::new(adapter.label(), nodes);
            group.bench_function(id, |b| {
                b.iter(|| {
                    let graph = adapter.open();
                    load(&graph, &edges);
                });
            });
        }
    }
    group.finish();
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_adjacency");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for &nodes in SCALES {
        let edges = random_edges(nodes);
        for adapter in [Adapter::Memory, Adapter::Sqlite] {
            let graph = adapter.open();
            load(&graph, &edges);
            let id = BenchmarkId::new(adapter.label(), nodes);
            group.bench_function(id, |b| {
                b.iter(|| graph.nx().adj().expect("adjacency"));
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = insert_benches;
    config = Criterion::default();
    targets = bench_insert_edges, bench_enumerate
);
criterion_main!(insert_benches);
