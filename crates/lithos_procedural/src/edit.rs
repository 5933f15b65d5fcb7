//! # World Edits
//!
//! An edit replaces one tile. Meshes read a border of tiles around their
//! chunk, so an edit near a chunk face also invalidates the neighbours that
//! can see it.

use lithos_core::Tile;
use lithos_shared::{ChunkPosition, GlobalTilePosition};

/// A single-tile change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileEdit {
    /// Tile being changed.
    pub position: GlobalTilePosition,
    /// New content.
    pub tile: Tile,
}

impl TileEdit {
    /// Creates an edit.
    #[must_use]
    pub const fn new(position: GlobalTilePosition, tile: Tile) -> Self {
        Self { position, tile }
    }
}

/// Chunks whose mesh depends on the tile at `position`.
///
/// The owning chunk comes first. A neighbour is included on each axis where
/// the tile lies within `border` tiles of that face; corners and edges
/// cascade diagonally.
#[must_use]
pub fn affected_chunks(position: GlobalTilePosition, chunk_size: i32, border: i32) -> Vec<ChunkPosition> {
    let (owner, local) = position.split(chunk_size);
    let axis = |value: i32| -> Vec<i32> {
        let mut offsets = vec![0];
        if value < border {
            offsets.push(-1);
        }
        if value >= chunk_size - border {
            offsets.push(1);
        }
        offsets
    };

    let (xs, ys, zs) = (axis(local.x), axis(local.y), axis(local.z));
    let mut chunks = Vec::with_capacity(xs.len() * ys.len() * zs.len());
    for &dz in &zs {
        for &dy in &ys {
            for &dx in &xs {
                chunks.push(owner.offset(dx, dy, dz));
            }
        }
    }
    chunks
}
