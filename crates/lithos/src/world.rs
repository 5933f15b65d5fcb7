//! # World
//!
//! The context object. Owns every cache and background thread of one open
//! world; tests open as many isolated worlds as they like.
//!
//! ```text
//! set_position ──> streaming worker ──> ChunkCache ──> StoreBackedSource
//!                        │                               │        │
//!                        ▼                            ChunkStore  WorldGenerator
//!                  MeshMaterializer ──> LightPropagator
//!                        │
//!                        ▼
//!                  ChunkRender (meshes + light), read by key
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use lithos_core::Chunk;
use lithos_procedural::{
    ChunkStore, ChunkStreamingService, Clock, ServiceState, StoreBackedSource, StoreOptions,
    StreamingOptions, StreamingStats, SystemClock, TickReport, TileEdit, WorldGenerator, WorldInfo,
    WorldSeed,
};
use lithos_rendering::{LightPropagator, MeshOptions};
use lithos_shared::{ChunkPosition, WorldConfig};

use crate::error::{WorldError, WorldResult};
use crate::materializer::{ChunkRender, MeshMaterializer};

/// One open world.
pub struct World {
    config: WorldConfig,
    seed: WorldSeed,
    generator: WorldGenerator,
    store: Arc<ChunkStore>,
    light: Arc<LightPropagator>,
    streaming: ChunkStreamingService<MeshMaterializer>,
}

impl World {
    /// Opens (or creates) the world described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the world
    /// directory cannot be created.
    pub fn open(config: WorldConfig) -> WorldResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Opens a world whose store measures save delays with `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`World::open`].
    pub fn open_with_clock(config: WorldConfig, clock: Arc<dyn Clock>) -> WorldResult<Self> {
        config.validate()?;

        let store = Arc::new(ChunkStore::open(
            config.world_dir(),
            StoreOptions::from_config(&config),
            clock,
        )?);

        let seed = match store.load_world_info() {
            Some(info) => {
                if info.name != config.world_name {
                    warn!(stored = %info.name, configured = %config.world_name, "world name mismatch");
                }
                WorldSeed::new(info.seed)
            }
            None => {
                store.save_world_info(&WorldInfo {
                    name: config.world_name.clone(),
                    seed: config.seed,
                })?;
                WorldSeed::new(config.seed)
            }
        };

        let chunk_size = config.chunk_size_i32();
        let generator = WorldGenerator::new(seed, config.chunk_size);
        let light = Arc::new(LightPropagator::new(config.light_model, chunk_size));
        let streaming_options = StreamingOptions::from_config(&config);
        let keep_radius = config.render_distance + streaming_options.search_radius.unsigned_abs();
        let materializer = MeshMaterializer::new(
            MeshOptions::for_chunk_size(chunk_size),
            Arc::clone(&light),
            keep_radius,
        );
        let source = Arc::new(StoreBackedSource::new(Arc::clone(&store), generator));
        let streaming = ChunkStreamingService::new(source, materializer, streaming_options);

        info!(
            world = %config.world_name,
            seed = seed.value(),
            chunk_size,
            light = ?config.light_model,
            "opened world"
        );

        Ok(Self {
            config,
            seed,
            generator,
            store,
            light,
            streaming,
        })
    }

    /// Configuration the world was opened with.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// World seed (the persisted one, if the world already existed).
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The generator.
    #[must_use]
    pub const fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    /// The chunk store.
    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// The light propagator.
    #[must_use]
    pub fn light(&self) -> &LightPropagator {
        &self.light
    }

    /// The streaming service.
    #[must_use]
    pub const fn streaming(&self) -> &ChunkStreamingService<MeshMaterializer> {
        &self.streaming
    }

    /// Starts the streaming worker. Returns false if it was already running.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Spawn`] if the worker thread cannot be spawned.
    pub fn start(&self) -> WorldResult<bool> {
        self.streaming.start().map_err(WorldError::Spawn)
    }

    /// Stops the streaming worker. Returns false if it was idle.
    pub fn stop(&self) -> bool {
        self.streaming.stop()
    }

    /// Worker state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.streaming.state()
    }

    /// Moves the streaming centre.
    pub fn set_position(&self, center: ChunkPosition) {
        self.streaming.set_position(center);
    }

    /// Runs one streaming iteration on the calling thread.
    pub fn tick(&self) -> TickReport {
        self.streaming.tick()
    }

    /// Fetches raw chunks.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Fetch`] on the first chunk that cannot be fetched.
    pub fn get_chunks(&self, positions: &[ChunkPosition]) -> WorldResult<Vec<Arc<Chunk>>> {
        Ok(self.streaming.get_chunks(positions)?)
    }

    /// Built meshes of a chunk; `None` until the worker has built it.
    #[must_use]
    pub fn render(&self, position: ChunkPosition) -> Option<Arc<ChunkRender>> {
        self.streaming.materialized(position)
    }

    /// Applies an edit. Returns the chunks scheduled for a rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Fetch`] if the owning chunk cannot be fetched or
    /// saved.
    pub fn apply_edit(&self, edit: TileEdit) -> WorldResult<Vec<ChunkPosition>> {
        let affected = self.streaming.apply_edit(edit)?;
        for &position in &affected {
            self.light.invalidate(position);
        }
        Ok(affected)
    }

    /// Streaming counters.
    #[must_use]
    pub fn stats(&self) -> StreamingStats {
        self.streaming.stats()
    }

    /// Stops streaming and flushes every pending chunk write.
    ///
    /// Returns the number of chunks written by the final flush.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Store`] if the final flush fails or the store
    /// was already shut down.
    pub fn shutdown(self) -> WorldResult<usize> {
        self.streaming.stop();
        let written = self.store.shutdown()?;
        info!(world = %self.config.world_name, written, "world closed");
        Ok(written)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("world", &self.config.world_name)
            .field("seed", &self.seed.value())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use lithos_core::Tile;
    use lithos_shared::{GlobalTilePosition, LocalTilePosition};

    fn scratch_dir(tag: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("lithos-world-{tag}-{stamp}"))
    }

    fn config(root: &std::path::Path, seed: u64) -> WorldConfig {
        WorldConfig {
            chunk_size: 16,
            save_path: root.to_path_buf(),
            world_name: "test".to_string(),
            seed,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let root = scratch_dir("invalid");
        let mut bad = config(&root, 1);
        bad.chunk_size = 2;
        assert!(matches!(World::open(bad), Err(WorldError::Config(_))));
    }

    #[test]
    fn test_reopen_keeps_stored_seed() {
        let root = scratch_dir("seed");
        let world = World::open(config(&root, 7)).unwrap();
        assert_eq!(world.seed().value(), 7);
        world.shutdown().unwrap();

        let world = World::open(config(&root, 99)).unwrap();
        assert_eq!(world.seed().value(), 7);
        world.shutdown().unwrap();
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_tick_builds_centre_first() {
        let root = scratch_dir("tick");
        let world = World::open(config(&root, 3)).unwrap();
        let centre = ChunkPosition::new(0, 1, 0);
        world.set_position(centre);

        assert!(world.render(centre).is_none());
        let report = world.tick();
        assert_eq!(report.built, Some(centre));

        let render = world.render(centre).unwrap();
        assert_eq!(render.meshes.position, centre);
        assert_eq!(render.light.position(), centre);
        assert_eq!(world.stats().built, 1);
        world.shutdown().unwrap();
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_edit_survives_reopen() {
        let root = scratch_dir("edit");
        let clock = Arc::new(lithos_procedural::ManualClock::new());
        let world = World::open_with_clock(config(&root, 5), clock).unwrap();
        let target = GlobalTilePosition::new(1, 1, 1);

        let affected = world.apply_edit(TileEdit::new(target, Tile::Lamp)).unwrap();
        assert!(affected.contains(&ChunkPosition::ORIGIN));
        assert_eq!(world.store().pending_count(), 1);
        assert_eq!(world.shutdown().unwrap(), 1);

        let world = World::open(config(&root, 5)).unwrap();
        let chunks = world.get_chunks(&[ChunkPosition::ORIGIN]).unwrap();
        assert_eq!(chunks[0].tile(LocalTilePosition::new(1, 1, 1)), Tile::Lamp);
        world.shutdown().unwrap();
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_start_and_stop() {
        let root = scratch_dir("worker");
        let world = World::open(config(&root, 9)).unwrap();
        assert!(world.start().unwrap());
        assert!(!world.start().unwrap());
        assert_eq!(world.state(), ServiceState::Running);
        assert!(world.stop());
        assert!(!world.stop());
        assert_eq!(world.state(), ServiceState::Idle);
        world.shutdown().unwrap();
        let _ = std::fs::remove_dir_all(root);
    }
}
