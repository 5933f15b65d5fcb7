//! Generate, light, mesh, persist and reload a chunk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lithos::core::{Chunk, Tile};
use lithos::procedural::{ChunkStore, ManualClock, StoreOptions, TileEdit, WorldGenerator, WorldSeed};
use lithos::rendering::{ChunkNeighborhood, LightPropagator, MeshOptions, SurfaceMesher};
use lithos::shared::{ChunkPosition, GlobalTilePosition, LightModel, WorldConfig};
use lithos::World;

const SIZE: u32 = 64;

fn scratch_dir(tag: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("lithos-e2e-{tag}-{stamp}"))
}

fn generate() -> Chunk {
    WorldGenerator::new(WorldSeed::new(42), SIZE).generate_chunk(ChunkPosition::ORIGIN)
}

#[test]
fn test_generation_is_deterministic() {
    let a = generate();
    let b = generate();
    assert!(a.tiles_equal(&b));
    assert_eq!(a.to_bytes(), b.to_bytes());
}

#[test]
fn test_generated_chunk_meshes() {
    let chunk = Arc::new(generate());
    let solid = chunk.solid_count();
    assert!(solid > 0);

    let size = i32::try_from(SIZE).unwrap();
    let view = ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, size, [chunk]);
    let light = LightPropagator::new(LightModel::Propagated, size);
    let chunk_light = light.compute(&view, ChunkPosition::ORIGIN);
    let meshes = SurfaceMesher::new(MeshOptions::for_chunk_size(size)).build_mesh(
        &view,
        ChunkPosition::ORIGIN,
        Some(&chunk_light),
    );

    assert!(meshes.stats.real_faces > 0);
    assert!(meshes.stats.real_faces <= solid * 6);
    assert_eq!(meshes.cube.quad_count(), meshes.stats.real_faces);
    assert_eq!(meshes.low_detail.quad_count(), meshes.stats.real_faces);
    assert_eq!(meshes.high_detail.quad_count(), meshes.stats.real_faces);
}

#[test]
fn test_saved_chunk_reloads_identically() {
    let root = scratch_dir("store");
    let chunk = generate();
    let expected = chunk.to_bytes();

    {
        let clock = Arc::new(ManualClock::new());
        let store = ChunkStore::open(&root, StoreOptions::manual(Duration::from_secs(5)), clock).unwrap();
        store.save(chunk).unwrap();
        assert!(store.is_pending(ChunkPosition::ORIGIN));
        assert_eq!(store.flush_all().unwrap(), 1);
        store.shutdown().unwrap();
    }

    let clock = Arc::new(ManualClock::new());
    let store = ChunkStore::open(&root, StoreOptions::manual(Duration::from_secs(5)), clock).unwrap();
    let loaded = store.load_if_present(ChunkPosition::ORIGIN).unwrap();
    assert_eq!(loaded.to_bytes(), expected);
    store.shutdown().unwrap();
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_world_streams_edits_and_reloads() {
    let root = scratch_dir("world");
    let config = WorldConfig {
        chunk_size: 16,
        save_path: root.clone(),
        world_name: "e2e".to_string(),
        seed: 42,
        ..WorldConfig::default()
    };

    let world = World::open(config.clone()).unwrap();
    world.set_position(ChunkPosition::ORIGIN);
    assert_eq!(world.tick().built, Some(ChunkPosition::ORIGIN));
    let before = world.render(ChunkPosition::ORIGIN).unwrap();

    let lamp = GlobalTilePosition::new(8, 8, 8);
    let affected = world.apply_edit(TileEdit::new(lamp, Tile::Lamp)).unwrap();
    assert_eq!(affected, vec![ChunkPosition::ORIGIN]);
    assert!(world.light().chunk_light(ChunkPosition::ORIGIN).is_none());

    // The stale build stays readable until the rebuild replaces it.
    assert!(world.render(ChunkPosition::ORIGIN).is_some());
    assert_eq!(world.tick().built, Some(ChunkPosition::ORIGIN));
    let after = world.render(ChunkPosition::ORIGIN).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    world.shutdown().unwrap();

    let world = World::open(config).unwrap();
    let chunk = &world.get_chunks(&[ChunkPosition::ORIGIN]).unwrap()[0];
    let (_, local) = lamp.split(16);
    assert_eq!(chunk.tile(local), Tile::Lamp);
    world.shutdown().unwrap();
    let _ = std::fs::remove_dir_all(root);
}
