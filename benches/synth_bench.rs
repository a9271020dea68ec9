//! Synthesizer Benchmarks — Fallback-Path Performance Validation
//!
//! Benchmarks the synthetic payload generation that runs on every failed
//! fetch. The fallback path must stay negligible next to network latency.
//!
//! Run with: cargo bench --bench synth_bench

use chrono::{TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use gridpulse::domain::market_data::DataType;
use gridpulse::domain::synthesizer::synthesize;

/// Benchmark synthetic pool price generation.
fn bench_synth_price(c: &mut Criterion) {
    let now = Utc.timestamp_opt(1_760_000_000, 0).unwrap();

    c.bench_function("synth_pool_price", |b| {
        b.iter(|| synthesize(black_box(DataType::PoolPrice), black_box(now)));
    });
}

/// Benchmark synthetic load forecast generation.
fn bench_synth_load(c: &mut Criterion) {
    let now = Utc.timestamp_opt(1_760_000_000, 0).unwrap();

    c.bench_function("synth_load_forecast", |b| {
        b.iter(|| synthesize(black_box(DataType::LoadForecast), black_box(now)));
    });
}

/// Benchmark the composite generation-mix payload with derived ratio.
fn bench_synth_generation(c: &mut Criterion) {
    let now = Utc.timestamp_opt(1_760_000_000, 0).unwrap();

    c.bench_function("synth_generation_mix", |b| {
        b.iter(|| synthesize(black_box(DataType::GenerationMix), black_box(now)));
    });
}

criterion_group!(
    benches,
    bench_synth_price,
    bench_synth_load,
    bench_synth_generation,
);
criterion_main!(benches);
