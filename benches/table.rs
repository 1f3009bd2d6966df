//! Benchmarks for table inserts, scans and lookups.
//!
//! ```bash
//! cargo bench --bench table
//! ```

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rowstore::{Row, Table};
use tempfile::TempDir;

/// Rows that fit without hitting the internal node limit.
const ROWS: u32 = 34;

fn row(id: u32) -> Row {
    Row::new(id, format!("user{id}"), format!("person{id}@example.com")).unwrap()
}

fn open_table() -> (Table, TempDir) {
    let dir = TempDir::new().unwrap();
    let table = Table::open(dir.path().join("bench.db")).unwrap();
    (table, dir)
}

fn filled_table() -> (Table, TempDir) {
    let (mut table, dir) = open_table();
    for id in 1..=ROWS {
        table.insert(&row(id)).unwrap();
    }
    (table, dir)
}

fn bench_insert(c: &mut Criterion) {
    let rows: Vec<Row> = (1..=ROWS).map(row).collect();

    c.bench_function("insert_sequential", |b| {
        b.iter_batched(
            open_table,
            |(mut table, _dir)| {
                for row in &rows {
                    table.insert(black_box(row)).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });

    // Fixed permutation of 1..=ROWS.
    let shuffled: Vec<Row> = (1..=ROWS).map(|i| row((i * 17) % 35)).collect();
    c.bench_function("insert_shuffled", |b| {
        b.iter_batched(
            open_table,
            |(mut table, _dir)| {
                for row in &shuffled {
                    table.insert(black_box(row)).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_read(c: &mut Criterion) {
    let (mut table, _dir) = filled_table();

    c.bench_function("select", |b| {
        b.iter(|| black_box(table.execute_select().unwrap()))
    });

    c.bench_function("get", |b| {
        b.iter(|| {
            for id in 1..=ROWS {
                black_box(table.get(black_box(id)).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_insert, bench_read);
criterion_main!(benches);
