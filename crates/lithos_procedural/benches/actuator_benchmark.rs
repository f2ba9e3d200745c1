//! Benchmark for terrain actuation.
//!
//! Run with: cargo bench --package lithos_procedural --bench actuator_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lithos_procedural::{CaveConfig, ChunkCoord, Dimension, Engine, WorldSeed};

fn engine() -> Engine {
    Engine::noise(
        WorldSeed::new(42),
        Dimension {
            caves: Some(CaveConfig::default()),
            ..Dimension::default()
        },
    )
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let engine = engine();
    let mut actuator = engine.actuator();

    c.bench_function("actuate_single_chunk", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(
                engine
                    .generate_chunk(&mut actuator, ChunkCoord::new(coord, coord / 2))
                    .unwrap(),
            )
        });
    });
}

fn benchmark_sections(c: &mut Criterion) {
    let engine = engine();

    let mut group = c.benchmark_group("actuate_sections");
    group.throughput(Throughput::Elements(1));
    for section in [4usize, 8, 16] {
        group.bench_function(format!("section_{section}"), |b| {
            let mut coord = 0i32;
            b.iter(|| {
                coord = coord.wrapping_add(1);
                black_box(
                    engine
                        .generate_chunk_parallel(ChunkCoord::new(coord, -coord), section)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_single_chunk, benchmark_sections);
criterion_main!(benches);
