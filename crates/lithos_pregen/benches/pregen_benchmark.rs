//! Benchmark for headless pregeneration throughput.
//!
//! Run with: cargo bench --package lithos_pregen --bench pregen_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lithos_pregen::{
    GenerationMethod, HeadlessConfig, HeadlessMethod, JobConfig, PregenJob, RegionTask,
};
use lithos_procedural::{ChunkCoord, Dimension, Engine, WorldSeed};

fn benchmark_headless_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("headless_pregen");
    group.sample_size(10);

    for threads in [1usize, 4] {
        let radius = 4u32;
        let side = u64::from(radius * 2 + 1);
        group.throughput(Throughput::Elements(side * side));
        group.bench_function(format!("radius_{radius}_threads_{threads}"), |b| {
            b.iter(|| {
                let engine = Engine::noise(WorldSeed::new(42), Dimension::default());
                let method = Arc::new(HeadlessMethod::new(
                    "bench",
                    engine,
                    HeadlessConfig {
                        threads,
                        ..HeadlessConfig::default()
                    },
                ));
                let task =
                    RegionTask::radius(method.identity().clone(), ChunkCoord::new(0, 0), radius);
                let job = PregenJob::new(task, method, JobConfig::default()).unwrap();
                job.start().unwrap();
                black_box(job.wait())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_headless_radius);
criterion_main!(benches);
