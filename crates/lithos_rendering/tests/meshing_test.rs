//! Meshing across chunk borders, with light.

use std::collections::HashMap;
use std::sync::Arc;

use lithos_core::{Chunk, ChunkExtent, Tile};
use lithos_rendering::{ChunkNeighborhood, LightPropagator, MeshOptions, SurfaceMesher};
use lithos_shared::{ChunkPosition, LightModel, LocalTilePosition};

const SIZE: i32 = 8;

/// Hills that run straight through the x = 8 chunk face.
fn hills(position: ChunkPosition) -> Chunk {
    let mut chunk = Chunk::uniform(position, 0, ChunkExtent::cube(8), Tile::Air);
    for z in 0..SIZE {
        for x in 0..SIZE {
            let gx = position.x * SIZE + x;
            let height = 2 + (gx * 3 + z * 5).rem_euclid(4);
            for y in 0..height {
                chunk.set_tile(LocalTilePosition::new(x, y, z), Tile::Ground);
            }
        }
    }
    chunk
}

fn two_chunks() -> ChunkNeighborhood {
    ChunkNeighborhood::from_chunks(
        ChunkPosition::ORIGIN,
        SIZE,
        [
            Arc::new(hills(ChunkPosition::ORIGIN)),
            Arc::new(hills(ChunkPosition::new(1, 0, 0))),
        ],
    )
}

#[test]
fn test_smoothed_surfaces_meet_at_chunk_faces() {
    let view = two_chunks();
    let mesher = SurfaceMesher::new(MeshOptions::for_chunk_size(SIZE));
    let left = mesher.build_mesh(&view, ChunkPosition::ORIGIN, None);
    let right = mesher.build_mesh(&view, ChunkPosition::new(1, 0, 0), None);

    #[allow(clippy::cast_possible_truncation)]
    let key = |p: [f32; 3]| (p[1] as i32, p[2] as i32);
    let mut shared = HashMap::new();
    for (cube, low) in right.cube.vertices.iter().zip(&right.low_detail.vertices) {
        if cube.position[0] == 0.0 {
            shared.insert(key(cube.position), low.position);
        }
    }

    let mut matched = 0;
    for (cube, low) in left.cube.vertices.iter().zip(&left.low_detail.vertices) {
        if cube.position[0] != 8.0 {
            continue;
        }
        let Some(other) = shared.get(&key(cube.position)) else {
            continue;
        };
        matched += 1;
        assert!((low.position[0] - (other[0] + 8.0)).abs() < 1e-4);
        assert!((low.position[1] - other[1]).abs() < 1e-4);
        assert!((low.position[2] - other[2]).abs() < 1e-4);
    }
    assert!(matched > 0);
}

#[test]
fn test_open_sky_faces_are_fully_lit() {
    let view = two_chunks();
    let light = LightPropagator::new(LightModel::Propagated, SIZE);
    let chunk_light = light.compute(&view, ChunkPosition::ORIGIN);
    let mesher = SurfaceMesher::new(MeshOptions::for_chunk_size(SIZE));
    let meshes = mesher.build_mesh(&view, ChunkPosition::ORIGIN, Some(&chunk_light));

    let mut tops = 0;
    for (cube, low) in meshes.cube.vertices.iter().zip(&meshes.low_detail.vertices) {
        if cube.normal == [0.0, 1.0, 0.0] {
            tops += 1;
            assert_eq!(low.light, [1.0, 1.0, 1.0]);
        }
    }
    assert!(tops > 0);
}

#[test]
fn test_lamp_light_reaches_cave_walls() {
    let mut chunk = Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Rock);
    for x in 2..=5 {
        chunk.set_tile(LocalTilePosition::new(x, 4, 4), Tile::Air);
    }
    chunk.set_tile(LocalTilePosition::new(1, 4, 4), Tile::Lamp);
    let view = ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, SIZE, [Arc::new(chunk)]);

    let light = LightPropagator::new(LightModel::Propagated, SIZE);
    let chunk_light = light.compute(&view, ChunkPosition::ORIGIN);
    let meshes = SurfaceMesher::new(MeshOptions::for_chunk_size(SIZE)).build_mesh(
        &view,
        ChunkPosition::ORIGIN,
        Some(&chunk_light),
    );

    // Tunnel floor faces look up into lamp light: warm, red above blue.
    let floor: Vec<_> = meshes
        .cube
        .vertices
        .iter()
        .zip(&meshes.low_detail.vertices)
        .filter(|(cube, _)| cube.normal == [0.0, 1.0, 0.0] && cube.position[1] == 4.0)
        .map(|(_, low)| low.light)
        .collect();
    assert!(!floor.is_empty());
    for light in floor {
        assert!(light[0] > light[2]);
    }
}
