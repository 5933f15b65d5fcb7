//! Benchmark for noise and chunk generation.
//!
//! TARGET: a 32^3 chunk in well under one streaming tick (50ms)
//!
//! Run with: cargo bench --package lithos_procedural --bench generation_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lithos_procedural::{remove_floaters, NoiseField, WorldGenerator, WorldSeed};
use lithos_shared::ChunkPosition;

fn benchmark_noise_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_field");
    for size in [16u32, 32, 64] {
        group.throughput(Throughput::Elements(u64::from(size).pow(3)));
        group.bench_function(format!("{size}^3"), |b| {
            b.iter(|| black_box(NoiseField::generate(WorldSeed::new(42), size, size, size)));
        });
    }
    group.finish();
}

fn benchmark_chunk_generation(c: &mut Criterion) {
    let generator = WorldGenerator::new(WorldSeed::new(42), 32);

    c.bench_function("generate_chunk_32", |b| {
        let mut x = 0;
        b.iter(|| {
            x += 1;
            black_box(generator.generate_chunk(ChunkPosition::new(x, 0, 0)))
        });
    });
}

fn benchmark_floater_removal(c: &mut Criterion) {
    let generator = WorldGenerator::new(WorldSeed::new(42), 32);
    let seed = WorldSeed::new(42).for_chunk(ChunkPosition::ORIGIN);
    let raw = generator.density_grid(seed, ChunkPosition::ORIGIN);

    c.bench_function("remove_floaters_32", |b| {
        b.iter(|| black_box(remove_floaters(black_box(&raw), (0, 0, 0))));
    });
}

criterion_group!(
    benches,
    benchmark_noise_field,
    benchmark_chunk_generation,
    benchmark_floater_removal
);
criterion_main!(benches);
