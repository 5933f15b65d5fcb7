//! # World Generator
//!
//! Turns a seed and a chunk position into a populated [`Chunk`].
//!
//! ## Density
//!
//! Every tile gets a density from its world height and the chunk's noise
//! field:
//!
//! ```text
//! density = |world_y| + 3 * noise
//!         - (0.2 * size - local_y) * 2     (only for local_y < 0.2 * size)
//! ground  = density < size / 3
//! ```
//!
//! `noise` is the raw field scaled into `[-8, 8]`. The ramp term pulls the
//! bottom fifth of every chunk towards ground so the flood fill below has
//! something to start from.
//!
//! ## Floater Removal
//!
//! Noise peaks leave disconnected blobs hanging in the air. After
//! thresholding, a 6-connected flood fill from the chunk origin keeps only the
//! ground reachable from there; every other ground tile becomes air. A chunk
//! whose origin is not ground comes out all air.

use std::collections::VecDeque;

use tracing::debug;

use lithos_core::{Chunk, Tile, VoxelGrid};
use lithos_shared::ChunkPosition;

use crate::noise::{NoiseField, WorldSeed};

/// Range the raw noise is scaled into before weighting.
const NOISE_RANGE: f32 = 8.0;

/// Weight of the noise term in the density.
const NOISE_WEIGHT: f32 = 3.0;

/// Fraction of the chunk height that receives the ground ramp.
const RAMP_FRACTION: f32 = 0.2;

/// Slope of the ground ramp.
const RAMP_SLOPE: f32 = 2.0;

/// The six face-adjacent directions.
const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Deterministic chunk generator.
///
/// Cheap to clone; holds no caches.
#[derive(Clone, Copy, Debug)]
pub struct WorldGenerator {
    seed: WorldSeed,
    chunk_size: u32,
}

impl WorldGenerator {
    /// Creates a generator for cubic chunks of `chunk_size` tiles.
    #[must_use]
    pub const fn new(seed: WorldSeed, chunk_size: u32) -> Self {
        Self { seed, chunk_size }
    }

    /// World seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Chunk edge length in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Generates one chunk.
    ///
    /// Pure function of `(seed, chunk_size, position)`.
    #[must_use]
    pub fn generate_chunk(&self, position: ChunkPosition) -> Chunk {
        let chunk_seed = self.seed.for_chunk(position);
        let raw = self.density_grid(chunk_seed, position);
        let (grid, dropped) = remove_floaters(&raw, (0, 0, 0));
        let chunk = Chunk::from_grid(position, chunk_seed.value(), grid);

        if dropped > 0 {
            debug!(%position, dropped, "removed floating ground");
        }
        debug!(
            %position,
            solid = chunk.solid_count(),
            uniform = chunk.is_uniform(),
            "generated chunk"
        );
        chunk
    }

    /// Thresholded density field, before floater removal.
    ///
    /// Ground tiles get a colour from how far below the threshold their
    /// density sits, so deeper material reads darker in the mesh.
    #[must_use]
    pub fn density_grid(&self, chunk_seed: WorldSeed, position: ChunkPosition) -> VoxelGrid {
        let size = self.chunk_size;
        let field = NoiseField::generate(chunk_seed, size, size, size);
        let mut grid = VoxelGrid::new(size, size, size);

        #[allow(clippy::cast_precision_loss)]
        let height = size as f32;
        let threshold = height / 3.0;
        let ramp_top = height * RAMP_FRACTION;
        let noise_scale = NOISE_RANGE / NoiseField::amplitude_sum();
        let base_y = i64::from(position.y) * i64::from(size);

        for (x, y, z) in grid.coords().collect::<Vec<_>>() {
            #[allow(clippy::cast_sign_loss)]
            let noise = field.get(x as usize, y as usize, z as usize) * noise_scale;
            #[allow(clippy::cast_precision_loss)]
            let world_y = (base_y + i64::from(y)).unsigned_abs() as f32;
            #[allow(clippy::cast_precision_loss)]
            let local_y = y as f32;

            let mut density = world_y + noise * NOISE_WEIGHT;
            if local_y < ramp_top {
                density -= (ramp_top - local_y) * RAMP_SLOPE;
            }

            if density < threshold {
                grid.set(x, y, z, Tile::Ground);
                grid.set_color(x, y, z, strata_color(threshold - density, threshold));
            }
        }
        grid
    }
}

/// Colour byte for a ground tile `margin` below the threshold.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn strata_color(margin: f32, threshold: f32) -> u8 {
    let t = (margin / threshold).clamp(0.0, 1.0);
    (1.0 + t * 126.0).round() as u8
}

/// Keeps only ground reachable from `origin` through 6-connected ground.
///
/// Returns the filtered grid and the number of ground tiles dropped. If
/// `origin` is not ground, every ground tile is dropped.
#[must_use]
pub fn remove_floaters(grid: &VoxelGrid, origin: (i32, i32, i32)) -> (VoxelGrid, usize) {
    let mut kept = VoxelGrid::new(grid.width(), grid.height(), grid.depth());
    let mut visited = vec![false; grid.volume()];
    let mut queue = VecDeque::new();

    let (ox, oy, oz) = origin;
    if grid.get(ox, oy, oz) == Tile::Ground {
        if let Some(index) = grid.index(ox, oy, oz) {
            visited[index] = true;
            queue.push_back(origin);
        }
    }

    let mut reached = 0usize;
    while let Some((x, y, z)) = queue.pop_front() {
        kept.set(x, y, z, Tile::Ground);
        kept.set_color(x, y, z, grid.color(x, y, z));
        reached += 1;

        for (dx, dy, dz) in NEIGHBORS {
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            let Some(index) = grid.index(nx, ny, nz) else {
                continue;
            };
            if !visited[index] && grid.get(nx, ny, nz) == Tile::Ground {
                visited[index] = true;
                queue.push_back((nx, ny, nz));
            }
        }
    }

    let total = grid
        .tile_bytes()
        .iter()
        .filter(|&&id| id == Tile::Ground.id())
        .count();
    (kept, total - reached)
}
