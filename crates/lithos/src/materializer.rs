//! Streaming materializer that lights and meshes chunks.

use std::sync::Arc;

use lithos_procedural::{ChunkLookup, FetchError, FetchResult, Materializer};
use lithos_rendering::{
    ChunkLight, ChunkMeshes, ChunkNeighborhood, LightPropagator, MeshOptions, SurfaceMesher,
};
use lithos_shared::ChunkPosition;

/// A built chunk: its meshes and the light they were lit with.
#[derive(Debug)]
pub struct ChunkRender {
    /// Every mesh tier.
    pub meshes: ChunkMeshes,
    /// Light used for the meshes.
    pub light: Arc<ChunkLight>,
}

/// Lights and meshes a chunk from its 3x3x3 neighbourhood.
#[derive(Debug)]
pub struct MeshMaterializer {
    mesher: SurfaceMesher,
    light: Arc<LightPropagator>,
    keep_radius: u32,
}

impl MeshMaterializer {
    /// Creates a materializer.
    ///
    /// Cached light further than `keep_radius` chunks from the chunk being
    /// built is dropped after each build.
    #[must_use]
    pub fn new(options: MeshOptions, light: Arc<LightPropagator>, keep_radius: u32) -> Self {
        Self {
            mesher: SurfaceMesher::new(options),
            light,
            keep_radius,
        }
    }

    /// The mesher.
    #[must_use]
    pub const fn mesher(&self) -> &SurfaceMesher {
        &self.mesher
    }
}

impl Materializer for MeshMaterializer {
    type Output = ChunkRender;

    fn dependencies(&self, position: ChunkPosition) -> Vec<ChunkPosition> {
        position.neighborhood().collect()
    }

    fn materialize(&self, position: ChunkPosition, chunks: &dyn ChunkLookup) -> FetchResult<ChunkRender> {
        if chunks.chunk(position).is_none() {
            return Err(FetchError::Materialize {
                position,
                reason: "chunk was not fetched".to_string(),
            });
        }
        let view = ChunkNeighborhood::from_chunks(
            position,
            self.mesher.options().chunk_size,
            self.dependencies(position)
                .into_iter()
                .filter_map(|p| chunks.chunk(p)),
        );

        let light = self.light.compute(&view, position);
        let meshes = self.mesher.build_mesh(&view, position, Some(&light));
        let keep = self.keep_radius;
        self.light.retain(|cached| cached.chebyshev_distance(position) <= keep);

        Ok(ChunkRender { meshes, light })
    }

    fn discarded(&self, position: ChunkPosition) {
        // The build lit pre-edit tiles.
        self.light.invalidate(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use lithos_core::{Chunk, ChunkExtent, Tile};
    use lithos_procedural::{ChunkSource, ChunkStreamingService, StreamingOptions, TileEdit};
    use lithos_shared::{GlobalTilePosition, LightModel};

    /// Air everywhere; the first fetch of `gate` waits for the test.
    struct GatedSource {
        gate: ChunkPosition,
        armed: AtomicBool,
        reached: Barrier,
        release: Barrier,
    }

    impl ChunkSource for GatedSource {
        fn fetch(&self, position: ChunkPosition) -> FetchResult<Chunk> {
            if position == self.gate && self.armed.swap(false, Ordering::SeqCst) {
                self.reached.wait();
                self.release.wait();
            }
            Ok(Chunk::uniform(position, 0, ChunkExtent::cube(8), Tile::Air))
        }
    }

    fn materializer(keep_radius: u32) -> MeshMaterializer {
        MeshMaterializer::new(
            MeshOptions::for_chunk_size(8),
            Arc::new(LightPropagator::new(LightModel::Propagated, 8)),
            keep_radius,
        )
    }

    #[test]
    fn test_depends_on_full_neighbourhood() {
        let deps = materializer(1).dependencies(ChunkPosition::new(2, 0, -1));
        assert_eq!(deps.len(), 27);
        assert!(deps.contains(&ChunkPosition::new(3, 1, 0)));
    }

    #[test]
    fn test_missing_centre_is_an_error() {
        let chunks: HashMap<ChunkPosition, Arc<Chunk>> = HashMap::new();
        let result = materializer(1).materialize(ChunkPosition::ORIGIN, &chunks);
        assert!(matches!(result, Err(FetchError::Materialize { .. })));
    }

    #[test]
    fn test_discarded_build_drops_its_light() {
        let m = materializer(1);
        let mut chunks: HashMap<ChunkPosition, Arc<Chunk>> = HashMap::new();
        chunks.insert(
            ChunkPosition::ORIGIN,
            Arc::new(Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Air)),
        );

        m.materialize(ChunkPosition::ORIGIN, &chunks).unwrap();
        assert!(m.light.chunk_light(ChunkPosition::ORIGIN).is_some());
        m.discarded(ChunkPosition::ORIGIN);
        assert!(m.light.chunk_light(ChunkPosition::ORIGIN).is_none());
    }

    #[test]
    fn test_edit_during_build_leaves_no_stale_light() {
        let source = Arc::new(GatedSource {
            gate: ChunkPosition::new(1, 1, 1),
            armed: AtomicBool::new(true),
            reached: Barrier::new(2),
            release: Barrier::new(2),
        });
        let light = Arc::new(LightPropagator::new(LightModel::Propagated, 8));
        let options = StreamingOptions {
            chunk_size: 8,
            border: 3,
            eviction_distance: 3,
            search_radius: 1,
            tick_interval: Duration::from_millis(1),
        };
        let service = ChunkStreamingService::new(
            Arc::clone(&source) as Arc<dyn ChunkSource>,
            MeshMaterializer::new(MeshOptions::for_chunk_size(8), Arc::clone(&light), 2),
            options,
        );

        thread::scope(|scope| {
            let worker = scope.spawn(|| service.tick());
            source.reached.wait();
            let edit = TileEdit::new(GlobalTilePosition::new(4, 4, 4), Tile::Lamp);
            assert_eq!(service.apply_edit(edit).unwrap(), vec![ChunkPosition::ORIGIN]);
            light.invalidate(ChunkPosition::ORIGIN);
            source.release.wait();
            assert_eq!(worker.join().unwrap().discarded, Some(ChunkPosition::ORIGIN));
        });
        assert!(light.chunk_light(ChunkPosition::ORIGIN).is_none());

        assert_eq!(service.tick().built, Some(ChunkPosition::ORIGIN));
        let cached = light.chunk_light(ChunkPosition::ORIGIN).unwrap();
        let render = service.materialized(ChunkPosition::ORIGIN).unwrap();
        assert!(Arc::ptr_eq(&cached, &render.light));
    }

    #[test]
    fn test_distant_light_is_dropped() {
        let m = materializer(1);
        let far = ChunkPosition::new(5, 0, 0);
        let mut chunks: HashMap<ChunkPosition, Arc<Chunk>> = HashMap::new();
        for position in [ChunkPosition::ORIGIN, far] {
            chunks.insert(
                position,
                Arc::new(Chunk::uniform(position, 0, ChunkExtent::cube(8), Tile::Ground)),
            );
        }

        m.materialize(far, &chunks).unwrap();
        let render = m.materialize(ChunkPosition::ORIGIN, &chunks).unwrap();
        assert_eq!(render.meshes.position, ChunkPosition::ORIGIN);
        assert!(m.light.chunk_light(ChunkPosition::ORIGIN).is_some());
        assert!(m.light.chunk_light(far).is_none());
    }
}
