//! Benchmark for light and surface meshing.
//!
//! TARGET: mesh + light for a 32^3 chunk well inside one streaming tick
//!
//! Run with: cargo bench --package lithos_rendering --bench meshing_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lithos_core::{Chunk, ChunkExtent, Tile};
use lithos_rendering::{ChunkNeighborhood, LightPropagator, MeshOptions, SurfaceMesher};
use lithos_shared::{ChunkPosition, LightModel, LocalTilePosition};

const SIZE: i32 = 32;

/// Rolling hills of ground with a brick wall across them.
fn terrain() -> ChunkNeighborhood {
    let mut chunk = Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(32), Tile::Air);
    for z in 0..SIZE {
        for x in 0..SIZE {
            let height = 8 + (x * 3 + z * 5) % 7;
            for y in 0..height {
                chunk.set_tile(LocalTilePosition::new(x, y, z), Tile::Ground);
            }
            if x == 16 {
                for y in height..height + 4 {
                    chunk.set_tile(LocalTilePosition::new(x, y, z), Tile::Brick);
                }
            }
        }
    }
    ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, SIZE, [Arc::new(chunk)])
}

fn benchmark_mesh(c: &mut Criterion) {
    let view = terrain();
    let mesher = SurfaceMesher::new(MeshOptions::for_chunk_size(SIZE));

    c.bench_function("build_mesh_32", |b| {
        b.iter(|| black_box(mesher.build_mesh(black_box(&view), ChunkPosition::ORIGIN, None)));
    });
}

fn benchmark_light(c: &mut Criterion) {
    let view = terrain();
    let mut group = c.benchmark_group("chunk_light_32");
    for model in [LightModel::Column, LightModel::Propagated] {
        let light = LightPropagator::new(model, SIZE);
        group.bench_function(format!("{model:?}"), |b| {
            b.iter(|| black_box(light.compute(black_box(&view), ChunkPosition::ORIGIN)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_mesh, benchmark_light);
criterion_main!(benches);
