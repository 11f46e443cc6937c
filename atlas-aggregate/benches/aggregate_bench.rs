//! Criterion benchmarks for probe aggregation: flat, grouped, and capped passes.

use atlas_aggregate::{Aggregator, IterSource, ValueKeyExtractor};
use atlas_core::Probe;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const COUNTRIES: [&str; 8] = ["DE", "GR", "NL", "FR", "US", "JP", "BR", "ZA"];
const PROBES: u64 = 10_000;

fn probes() -> Vec<Probe> {
    (0..PROBES)
        .map(|id| {
            Probe::new(id)
                .with_country(COUNTRIES[(id % COUNTRIES.len() as u64) as usize])
                .with_asn_v4(3300 + (id % 40) as u32)
                .with_prefix_v4(format!("193.{}.0.0/16", id % 16))
        })
        .collect()
}

fn grouped(names: &[&str]) -> Aggregator<Probe> {
    Aggregator::new(
        names
            .iter()
            .map(|name| ValueKeyExtractor::from_name(name).unwrap().boxed())
            .collect(),
    )
}

fn bench_flat(c: &mut Criterion) {
    let input = probes();
    let mut g = c.benchmark_group("flat");
    g.throughput(Throughput::Elements(PROBES));
    g.bench_function("no_keys", |b| {
        b.iter(|| {
            black_box(Aggregator::flat().aggregate(IterSource::infallible(input.clone()))).unwrap()
        });
    });
    g.finish();
}

fn bench_grouped(c: &mut Criterion) {
    let input = probes();
    let mut g = c.benchmark_group("grouped");
    g.throughput(Throughput::Elements(PROBES));
    g.bench_function("country", |b| {
        let aggregator = grouped(&["country"]);
        b.iter(|| black_box(aggregator.aggregate(IterSource::infallible(input.clone()))).unwrap());
    });
    g.bench_function("country_asn_prefix", |b| {
        let aggregator = grouped(&["country", "asn_v4", "prefix_v4"]);
        b.iter(|| black_box(aggregator.aggregate(IterSource::infallible(input.clone()))).unwrap());
    });
    g.finish();
}

fn bench_capped(c: &mut Criterion) {
    let input = probes();
    let mut g = c.benchmark_group("capped");
    g.throughput(Throughput::Elements(PROBES));
    g.bench_function("max_per_branch_10", |b| {
        let aggregator = grouped(&["country", "asn_v4"]).max_per_branch(Some(10));
        b.iter(|| black_box(aggregator.aggregate(IterSource::infallible(input.clone()))).unwrap());
    });
    g.bench_function("max_total_100_declared", |b| {
        let aggregator = grouped(&["country"]).max_total(Some(100));
        b.iter(|| {
            let source = IterSource::infallible(input.clone()).with_total(PROBES);
            black_box(aggregator.aggregate(source)).unwrap()
        });
    });
    g.finish();
}

criterion_group!(benches, bench_flat, bench_grouped, bench_capped);
criterion_main!(benches);
