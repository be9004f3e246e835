use dtruss_core::rng::RngHandle;
use dtruss_graph::{compute_supports, gen_random_digraph, LinkTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn supports_bench(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(42);
    let graph = gen_random_digraph(2_000, 12_000, 0.2, &mut rng).unwrap();

    c.bench_function("compute_supports_12k", |b| {
        b.iter(|| {
            let table = compute_supports(graph.view(), graph.edges());
            black_box(table);
        });
    });

    c.bench_function("link_table_12k", |b| {
        b.iter(|| black_box(LinkTable::from_view(graph.view())));
    });
}

criterion_group!(benches, supports_bench);
criterion_main!(benches);
