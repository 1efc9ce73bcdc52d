use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hedge_engine::optimization::allocation::AllocationEngine;
use hedge_engine::optimization::netting::NettingEngine;
use hedge_engine::simulation::book_generator::{generate_book, BookConfig};

fn bench_netting_1000_tickets(c: &mut Criterion) {
    let book = generate_book(&BookConfig {
        trade_count: 1_000,
        cargo_count: 0,
        ..Default::default()
    });

    c.bench_function("netting_1000_tickets", |b| {
        b.iter(|| NettingEngine::net_positions(black_box(&book.paper)))
    });
}

fn bench_netting_20000_tickets(c: &mut Criterion) {
    let book = generate_book(&BookConfig {
        trade_count: 20_000,
        cargo_count: 0,
        month_count: 24,
        ..Default::default()
    });

    c.bench_function("netting_20000_tickets", |b| {
        b.iter(|| NettingEngine::net_positions(black_box(&book.paper)))
    });
}

fn bench_allocation_200_cargoes(c: &mut Criterion) {
    let book = generate_book(&BookConfig {
        trade_count: 5_000,
        cargo_count: 200,
        ..Default::default()
    });
    let netted = NettingEngine::net_positions(&book.paper);
    let engine = AllocationEngine::default();

    c.bench_function("allocation_200_cargoes", |b| {
        b.iter(|| engine.allocate(black_box(&book.cargoes), black_box(netted.trades())))
    });
}

criterion_group!(
    benches,
    bench_netting_1000_tickets,
    bench_netting_20000_tickets,
    bench_allocation_200_cargoes
);
criterion_main!(benches);
