//! Table reading benchmarks.
//!
//! Measures streaming a delimited file through a schema, with and without
//! uniqueness and integrity checks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::io::Write;
use tableschema::{IntegrityExpectation, ReadOptions, Schema, Table};
use tempfile::NamedTempFile;

/// Generate synthetic CSV data with the specified number of rows.
fn generate_csv_data(rows: usize) -> String {
    let mut data = String::from("id,score,day,flag,label\n");
    for row in 0..rows {
        data.push_str(&format!(
            "{},{:.2},2023-{:02}-{:02},{},Category_{}\n",
            row,
            row as f64 * 1.5,
            (row % 12) + 1,
            (row % 28) + 1,
            row % 2 == 0,
            row % 10
        ));
    }
    data
}

fn schema(primary_key: bool) -> Schema {
    let mut descriptor = json!({
        "fields": [
            {"name": "id", "type": "integer"},
            {"name": "score", "type": "number"},
            {"name": "day", "type": "date"},
            {"name": "flag", "type": "boolean"},
            {"name": "label", "type": "string"}
        ]
    });
    if primary_key {
        descriptor["primaryKey"] = json!("id");
    }
    Schema::load(descriptor, true).unwrap()
}

/// Benchmark a full read of files of various sizes.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_csv");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_csv_data(*rows);
        let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
        temp.write_all(data.as_bytes()).unwrap();

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("plain", rows), temp.path(), |b, path| {
            b.iter(|| {
                let mut table = Table::from_path(path).with_schema(schema(false));
                black_box(table.read(ReadOptions::default()).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("primary_key", rows), temp.path(), |b, path| {
            b.iter(|| {
                let mut table = Table::from_path(path).with_schema(schema(true));
                black_box(table.read(ReadOptions::default()).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("integrity", rows), temp.path(), |b, path| {
            b.iter(|| {
                let mut table = Table::from_path(path).with_schema(schema(false));
                let expected = IntegrityExpectation::default().with_size(data.len() as u64);
                black_box(
                    table
                        .read(ReadOptions::default().with_integrity(expected))
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_read);
criterion_main!(benches);
