//! Merge throughput benchmarks for txscope
//!
//! - normalize: raw neighborhood rows into a batch
//! - replace: rebuild a session from a batch
//! - expand: merge a neighborhood into a populated session
//!
//! Run with: cargo bench --bench merge_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use txscope::graph::{normalize_rows, GraphSession};
use txscope::query::{RawRow, RawValue};
use txscope::EdgePolicy;

fn addr(n: usize) -> String {
    format!("0x{:040x}", n)
}

/// A star around address 0 followed by a chain, `n` rows in total
fn rows(n: usize) -> Vec<RawRow> {
    (1..=n)
        .map(|i| {
            let anchor = if i % 2 == 0 { 0 } else { i - 1 };
            RawRow::neighborhood(
                RawValue::address_node(&addr(anchor), i64::from(anchor == 0)),
                RawValue::sent(i as u64, i as f64 * 0.01),
                i % 3 != 0,
                RawValue::address_node(&addr(i), 0),
            )
        })
        .collect()
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for size in [100, 1000, 10_000] {
        let input = rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(normalize_rows(black_box(input))))
        });
    }
    group.finish();
}

fn benchmark_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace");
    for policy in [EdgePolicy::AppendLog, EdgePolicy::MergeByPair] {
        let batch = match normalize_rows(&rows(1000)) {
            Ok(batch) => batch,
            Err(e) => panic!("bench rows are malformed: {}", e),
        };
        group.throughput(Throughput::Elements(1000));
        group.bench_function(format!("{:?}", policy), |b| {
            b.iter(|| {
                let mut session = GraphSession::new(policy);
                black_box(session.replace(batch.clone()))
            })
        });
    }
    group.finish();
}

fn benchmark_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let (Ok(base), Ok(neighborhood)) = (normalize_rows(&rows(1000)), normalize_rows(&rows(2000))) else {
        panic!("bench rows are malformed");
    };
    group.throughput(Throughput::Elements(2000));
    group.bench_function("half_new", |b| {
        b.iter(|| {
            let mut session = GraphSession::new(EdgePolicy::AppendLog);
            session.replace(base.clone());
            black_box(session.expand_from_node(neighborhood.clone()))
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_normalize, benchmark_replace, benchmark_expand);
criterion_main!(benches);
