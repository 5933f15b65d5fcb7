//! # Persistence Integration Test
//!
//! Generated chunks stay procedural; edited chunks survive a restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use lithos_core::Tile;
use lithos_procedural::{
    ChunkLookup, ChunkSource, ChunkStore, ChunkStreamingService, FetchError, FetchResult,
    ManualClock, Materializer, StoreBackedSource, StoreOptions, StreamingOptions, TileEdit,
    WorldGenerator, WorldSeed,
};
use lithos_shared::{ChunkPosition, GlobalTilePosition, LocalTilePosition};

const INTERVAL: Duration = Duration::from_secs(30);

fn temp_world(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("lithos_it_{name}_{nanos}"))
}

struct TileCount;

impl Materializer for TileCount {
    type Output = usize;

    fn materialize(&self, position: ChunkPosition, chunks: &dyn ChunkLookup) -> FetchResult<usize> {
        chunks
            .chunk(position)
            .map(|chunk| chunk.solid_count())
            .ok_or(FetchError::Materialize {
                position,
                reason: "missing".to_string(),
            })
    }
}

fn open(root: &Path) -> (Arc<ChunkStore>, Arc<ManualClock>, WorldGenerator) {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(ChunkStore::open(root, StoreOptions::manual(INTERVAL), clock.clone()).unwrap());
    (store, clock, WorldGenerator::new(WorldSeed::new(42), 16))
}

#[test]
fn test_generated_chunks_are_not_written() {
    let root = temp_world("generated");
    let (store, _clock, generator) = open(&root);
    let source = StoreBackedSource::new(Arc::clone(&store), generator);

    let chunk = source.fetch(ChunkPosition::ORIGIN).unwrap();
    assert_eq!(chunk, generator.generate_chunk(ChunkPosition::ORIGIN));
    assert_eq!(store.pending_count(), 0);

    assert_eq!(store.shutdown().unwrap(), 0);
    assert!(!store.chunk_path(ChunkPosition::ORIGIN).exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_edits_survive_restart() {
    let root = temp_world("edits");
    let edit_at = GlobalTilePosition::new(8, 20, 8);
    let owner = ChunkPosition::new(0, 1, 0);

    {
        let (store, clock, generator) = open(&root);
        let source = Arc::new(StoreBackedSource::new(Arc::clone(&store), generator));
        let service = ChunkStreamingService::new(source, TileCount, StreamingOptions {
            chunk_size: 16,
            ..StreamingOptions::default()
        });

        let affected = service.apply_edit(TileEdit::new(edit_at, Tile::Brick)).unwrap();
        assert_eq!(affected, vec![owner]);
        assert!(store.is_pending(owner));

        clock.advance(INTERVAL);
        assert_eq!(store.flush_due(), 1);
        assert!(store.chunk_path(owner).exists());
        store.shutdown().unwrap();
    }

    let (store, _clock, generator) = open(&root);
    let source = StoreBackedSource::new(Arc::clone(&store), generator);
    let chunk = source.fetch(owner).unwrap();
    let (_, local) = edit_at.split(16);
    assert_eq!(local, LocalTilePosition::new(8, 4, 8));
    assert_eq!(chunk.tile(local), Tile::Brick);

    store.shutdown().unwrap();
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_fetch_after_shutdown_is_a_failure() {
    let root = temp_world("closed");
    let (store, _clock, generator) = open(&root);
    let source = StoreBackedSource::new(Arc::clone(&store), generator);
    store.shutdown().unwrap();

    let err = source.fetch(ChunkPosition::ORIGIN).unwrap_err();
    assert!(matches!(err, FetchError::Unavailable { .. }));
    let _ = std::fs::remove_dir_all(&root);
}
