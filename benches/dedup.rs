//! Benchmarks for the per-tick pipeline hot path

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quote_stream::feed::QuoteRecord;
use quote_stream::pipeline::{AggregationRow, Deduplicator, RecordMapper};

fn batch(stocks: &[&str], start: i64, len: i64) -> Vec<QuoteRecord> {
    let base = Utc.with_ymd_and_hms(2019, 2, 11, 22, 6, 0).unwrap();
    (start..start + len)
        .flat_map(|i| {
            stocks.iter().map(move |s| {
                QuoteRecord::new(*s, base + Duration::milliseconds(i * 250))
                    .with_ask(120.0 + i as f64 * 0.01, 10.0)
                    .with_bid(119.5, 12.0)
            })
        })
        .collect()
}

fn benchmark_repeated_batch(c: &mut Criterion) {
    let mapper = RecordMapper::new();
    let rows: Vec<AggregationRow> = mapper.map_batch(&batch(&["ABC", "DEF"], 0, 50));

    let mut dedup = Deduplicator::new();
    dedup.filter(rows.clone());

    c.bench_function("dedup_repeated_batch", |b| {
        b.iter(|| dedup.filter(black_box(rows.clone())))
    });
}

fn benchmark_sliding_window(c: &mut Criterion) {
    let mapper = RecordMapper::new();
    let windows: Vec<Vec<AggregationRow>> = (0..100)
        .map(|tick| mapper.map_batch(&batch(&["ABC", "DEF"], tick, 50)))
        .collect();

    c.bench_function("dedup_sliding_window", |b| {
        b.iter(|| {
            let mut dedup = Deduplicator::with_max_keys(10_000);
            for rows in &windows {
                black_box(dedup.filter(rows.clone()));
            }
        })
    });
}

fn benchmark_map_batch(c: &mut Criterion) {
    let mapper = RecordMapper::new();
    let records = batch(&["ABC", "DEF"], 0, 50);

    c.bench_function("map_batch", |b| {
        b.iter(|| mapper.map_batch(black_box(&records)))
    });
}

criterion_group!(
    benches,
    benchmark_repeated_batch,
    benchmark_sliding_window,
    benchmark_map_batch
);
criterion_main!(benches);
