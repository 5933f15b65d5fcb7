//! # Light Propagation
//!
//! Computes a [`TileLight`] for every tile of a chunk plus a margin around it,
//! so faces on the chunk border can sample the air in front of them.
//!
//! Two models are available, selected by [`LightModel`]:
//!
//! - **Column**: each vertical column is scanned top-down. Tiles are bright
//!   until the first solid tile, dim from there on. Cheap fake occlusion.
//! - **Propagated**: sunlit air (open sky above) and light sources are
//!   flood-filled through air. Every hop dims each channel by one; light
//!   stops after [`MAX_LIGHT_DISTANCE`] hops. Overlapping light keeps the
//!   brightest value per channel.
//!
//! Results are cached per chunk. [`LightPropagator::get_light`] reports a
//! scalar intensity clamped to [`AMBIENT_LIGHT_FLOOR`]; positions outside the
//! chunk, or chunks never computed, report 0.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use lithos_core::{Tile, TileLight};
use lithos_shared::constants::{COLUMN_LIGHT_BRIGHT, COLUMN_LIGHT_DIM};
use lithos_shared::{
    ChunkPosition, GlobalTilePosition, LightModel, LocalTilePosition, AMBIENT_LIGHT_FLOOR,
    MAX_LIGHT_DISTANCE,
};

use crate::view::WorldView;

/// Tiles computed on every side of the chunk.
///
/// Light from a source this far outside can still reach the chunk border.
#[allow(clippy::cast_possible_wrap)]
pub const LIGHT_MARGIN: i32 = MAX_LIGHT_DISTANCE as i32 + 1;

// =============================================================================
// REGION
// =============================================================================

/// Cubic block of tiles a strategy lights.
#[derive(Clone, Debug)]
pub struct LightRegion {
    min: GlobalTilePosition,
    span: i32,
    tiles: Vec<Tile>,
}

impl LightRegion {
    /// Snapshots the tiles of a chunk plus `margin` on every side.
    #[must_use]
    pub fn capture(view: &dyn WorldView, position: ChunkPosition, chunk_size: i32, margin: i32) -> Self {
        let origin = position.origin(chunk_size);
        let min = origin.offset(-margin, -margin, -margin);
        let span = chunk_size + 2 * margin;
        let mut tiles = Vec::with_capacity(Self::volume_of(span));
        for z in 0..span {
            for y in 0..span {
                for x in 0..span {
                    tiles.push(view.tile(min.offset(x, y, z)));
                }
            }
        }
        Self { min, span, tiles }
    }

    #[allow(clippy::cast_sign_loss)]
    const fn volume_of(span: i32) -> usize {
        let s = span as usize;
        s * s * s
    }

    /// Lowest corner, in world tiles.
    #[must_use]
    pub const fn min(&self) -> GlobalTilePosition {
        self.min
    }

    /// Edge length in tiles.
    #[must_use]
    pub const fn span(&self) -> i32 {
        self.span
    }

    /// Number of tiles.
    #[must_use]
    pub fn volume(&self) -> usize {
        self.tiles.len()
    }

    /// Flat index of a region-relative coordinate.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let s = self.span;
        if x < 0 || y < 0 || z < 0 || x >= s || y >= s || z >= s {
            return None;
        }
        Some((x + y * s + z * s * s) as usize)
    }

    /// Region-relative coordinate of a flat index.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn coords(&self, index: usize) -> (i32, i32, i32) {
        let s = self.span as usize;
        ((index % s) as i32, ((index / s) % s) as i32, (index / (s * s)) as i32)
    }

    /// Tile at a flat index.
    #[inline]
    #[must_use]
    pub fn tile(&self, index: usize) -> Tile {
        self.tiles.get(index).copied().unwrap_or(Tile::Air)
    }

    /// World position of a region-relative coordinate.
    #[inline]
    #[must_use]
    pub const fn global(&self, x: i32, y: i32, z: i32) -> GlobalTilePosition {
        self.min.offset(x, y, z)
    }
}

// =============================================================================
// STRATEGIES
// =============================================================================

/// A light model.
pub trait LightStrategy: Send + Sync {
    /// Light for every tile of `region`, in region index order.
    fn light(&self, region: &LightRegion, view: &dyn WorldView) -> Vec<TileLight>;
}

/// Bright above the first solid tile of each column, dim below.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColumnLight;

impl LightStrategy for ColumnLight {
    fn light(&self, region: &LightRegion, _view: &dyn WorldView) -> Vec<TileLight> {
        let mut values = vec![TileLight::DARK; region.volume()];
        let bright = TileLight::gray(COLUMN_LIGHT_BRIGHT).with_sun(true);
        let dim = TileLight::gray(COLUMN_LIGHT_DIM);

        for z in 0..region.span() {
            for x in 0..region.span() {
                let mut covered = false;
                for y in (0..region.span()).rev() {
                    let Some(index) = region.index(x, y, z) else {
                        continue;
                    };
                    covered |= region.tile(index).is_solid();
                    values[index] = if covered { dim } else { bright };
                }
            }
        }
        values
    }
}

/// Sunlight and coloured sources flood-filled through air.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagatedLight;

const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

impl LightStrategy for PropagatedLight {
    fn light(&self, region: &LightRegion, view: &dyn WorldView) -> Vec<TileLight> {
        let mut values = vec![TileLight::DARK; region.volume()];
        let mut queue = VecDeque::new();

        // Sky: air is sunlit down to the first solid tile of its column.
        for z in 0..region.span() {
            for x in 0..region.span() {
                for y in (0..region.span()).rev() {
                    let Some(index) = region.index(x, y, z) else {
                        continue;
                    };
                    if region.tile(index).is_solid() {
                        break;
                    }
                    values[index] = TileLight::SUN;
                    queue.push_back((index, 0u32));
                }
            }
        }

        // Emitting tiles and stored source flags.
        for index in 0..region.volume() {
            let tile = region.tile(index);
            let (x, y, z) = region.coords(index);
            let stored = view.stored_light(region.global(x, y, z));
            let emitted = match tile.emission() {
                Some((r, g, b)) => TileLight::source(r, g, b),
                None if stored.is_source() => stored,
                None => continue,
            };
            values[index] = values[index].combine_brightest(emitted);
            queue.push_back((index, 0));
        }

        while let Some((index, hops)) = queue.pop_front() {
            if hops >= MAX_LIGHT_DISTANCE {
                continue;
            }
            let next = values[index].dimmer();
            if next.is_dark() {
                continue;
            }
            let (x, y, z) = region.coords(index);
            for (dx, dy, dz) in NEIGHBORS {
                let Some(n) = region.index(x + dx, y + dy, z + dz) else {
                    continue;
                };
                if region.tile(n).is_solid() || values[n].covers(next) {
                    continue;
                }
                values[n] = values[n].combine_brightest(next);
                queue.push_back((n, hops + 1));
            }
        }
        values
    }
}

// =============================================================================
// CHUNK LIGHT
// =============================================================================

/// Computed light for one chunk and its margin.
#[derive(Clone, Debug)]
pub struct ChunkLight {
    position: ChunkPosition,
    chunk_size: i32,
    min: GlobalTilePosition,
    span: i32,
    values: Vec<TileLight>,
}

impl ChunkLight {
    /// Chunk this light belongs to.
    #[must_use]
    pub const fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Light at a world position, if inside the computed block.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn at(&self, position: GlobalTilePosition) -> Option<TileLight> {
        let (x, y, z) = (
            position.x - self.min.x,
            position.y - self.min.y,
            position.z - self.min.z,
        );
        let s = self.span;
        if x < 0 || y < 0 || z < 0 || x >= s || y >= s || z >= s {
            return None;
        }
        self.values.get((x + y * s + z * s * s) as usize).copied()
    }

    /// Light at a chunk-relative position. Coordinates may reach into the
    /// margin (negative or past the chunk size).
    #[must_use]
    pub fn at_local(&self, local: LocalTilePosition) -> Option<TileLight> {
        self.at(local.to_global(self.position, self.chunk_size))
    }
}

// =============================================================================
// PROPAGATOR
// =============================================================================

/// Light model plus a per-chunk cache of computed light.
pub struct LightPropagator {
    model: LightModel,
    chunk_size: i32,
    strategy: Box<dyn LightStrategy>,
    cache: RwLock<HashMap<ChunkPosition, Arc<ChunkLight>>>,
}

impl LightPropagator {
    /// Creates a propagator for the given model.
    #[must_use]
    pub fn new(model: LightModel, chunk_size: i32) -> Self {
        let strategy: Box<dyn LightStrategy> = match model {
            LightModel::Column => Box::new(ColumnLight),
            LightModel::Propagated => Box::new(PropagatedLight),
        };
        Self {
            model,
            chunk_size,
            strategy,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Selected model.
    #[must_use]
    pub const fn model(&self) -> LightModel {
        self.model
    }

    /// Chunk edge length in tiles.
    #[must_use]
    pub const fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Computes and caches light for one chunk, replacing any cached value.
    pub fn compute(&self, view: &dyn WorldView, position: ChunkPosition) -> Arc<ChunkLight> {
        let region = LightRegion::capture(view, position, self.chunk_size, LIGHT_MARGIN);
        let values = self.strategy.light(&region, view);
        let light = Arc::new(ChunkLight {
            position,
            chunk_size: self.chunk_size,
            min: region.min(),
            span: region.span(),
            values,
        });
        self.cache.write().insert(position, Arc::clone(&light));
        debug!(%position, model = ?self.model, "computed chunk light");
        light
    }

    /// Cached light for a chunk.
    #[must_use]
    pub fn chunk_light(&self, position: ChunkPosition) -> Option<Arc<ChunkLight>> {
        self.cache.read().get(&position).cloned()
    }

    /// Packed light at a tile of a computed chunk.
    #[must_use]
    pub fn light_at(&self, position: ChunkPosition, local: LocalTilePosition) -> Option<TileLight> {
        if !local.is_within(self.chunk_size) {
            return None;
        }
        self.chunk_light(position)?.at_local(local)
    }

    /// Scalar intensity at a tile.
    ///
    /// At least [`AMBIENT_LIGHT_FLOOR`] inside a computed chunk; 0 outside
    /// the chunk bounds or for a chunk that has not been computed.
    #[must_use]
    pub fn get_light(&self, position: ChunkPosition, local: LocalTilePosition) -> u8 {
        self.light_at(position, local)
            .map_or(0, |light| light.intensity().max(AMBIENT_LIGHT_FLOOR))
    }

    /// Drops a chunk's cached light. Returns true if it was cached.
    pub fn invalidate(&self, position: ChunkPosition) -> bool {
        self.cache.write().remove(&position).is_some()
    }

    /// Keeps only cached chunks for which `keep` returns true.
    pub fn retain(&self, mut keep: impl FnMut(ChunkPosition) -> bool) {
        self.cache.write().retain(|&position, _| keep(position));
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

impl std::fmt::Debug for LightPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightPropagator")
            .field("model", &self.model)
            .field("chunk_size", &self.chunk_size)
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}
