//! # World Views
//!
//! Meshing and lighting read tiles by global position across chunk borders.
//! A [`WorldView`] answers those reads; positions it knows nothing about are
//! air, dark and uncoloured.

use std::collections::HashMap;
use std::sync::Arc;

use lithos_core::{Chunk, Tile, TileLight};
use lithos_shared::{ChunkPosition, GlobalTilePosition};

/// Read-only tile access by global position.
pub trait WorldView {
    /// Tile at a position; [`Tile::Air`] where unknown.
    fn tile(&self, position: GlobalTilePosition) -> Tile;

    /// Colour byte at a position; 0 where unknown.
    fn color(&self, position: GlobalTilePosition) -> u8;

    /// Stored light at a position; dark where unknown.
    fn stored_light(&self, position: GlobalTilePosition) -> TileLight;
}

/// A chunk and whichever of its neighbours are loaded.
#[derive(Clone, Debug)]
pub struct ChunkNeighborhood {
    center: ChunkPosition,
    chunk_size: i32,
    chunks: HashMap<ChunkPosition, Arc<Chunk>>,
}

impl ChunkNeighborhood {
    /// Creates an empty neighbourhood around `center`.
    #[must_use]
    pub fn new(center: ChunkPosition, chunk_size: i32) -> Self {
        Self {
            center,
            chunk_size,
            chunks: HashMap::with_capacity(27),
        }
    }

    /// Builds a neighbourhood from any set of chunks.
    #[must_use]
    pub fn from_chunks(
        center: ChunkPosition,
        chunk_size: i32,
        chunks: impl IntoIterator<Item = Arc<Chunk>>,
    ) -> Self {
        let mut view = Self::new(center, chunk_size);
        for chunk in chunks {
            view.insert(chunk);
        }
        view
    }

    /// Adds or replaces a chunk.
    pub fn insert(&mut self, chunk: Arc<Chunk>) {
        self.chunks.insert(chunk.position(), chunk);
    }

    /// Chunk the neighbourhood is built around.
    #[must_use]
    pub const fn center(&self) -> ChunkPosition {
        self.center
    }

    /// Chunk edge length in tiles.
    #[must_use]
    pub const fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True if no chunk is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn locate(&self, position: GlobalTilePosition) -> Option<(&Chunk, lithos_shared::LocalTilePosition)> {
        let (chunk, local) = position.split(self.chunk_size);
        self.chunks.get(&chunk).map(|c| (c.as_ref(), local))
    }
}

impl WorldView for ChunkNeighborhood {
    fn tile(&self, position: GlobalTilePosition) -> Tile {
        self.locate(position)
            .map_or(Tile::Air, |(chunk, local)| chunk.tile(local))
    }

    fn color(&self, position: GlobalTilePosition) -> u8 {
        self.locate(position)
            .map_or(0, |(chunk, local)| chunk.color(local))
    }

    fn stored_light(&self, position: GlobalTilePosition) -> TileLight {
        self.locate(position)
            .map_or(TileLight::DARK, |(chunk, local)| chunk.stored_light(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_core::ChunkExtent;

    #[test]
    fn test_reads_cross_chunk_borders() {
        let ground = Arc::new(Chunk::uniform(ChunkPosition::new(0, -1, 0), 0, ChunkExtent::cube(8), Tile::Ground));
        let sky = Arc::new(Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Air));
        let view = ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, 8, [ground, sky]);

        assert_eq!(view.len(), 2);
        assert_eq!(view.tile(GlobalTilePosition::new(3, -1, 3)), Tile::Ground);
        assert_eq!(view.tile(GlobalTilePosition::new(3, 0, 3)), Tile::Air);
    }

    #[test]
    fn test_unknown_chunks_read_as_air() {
        let view = ChunkNeighborhood::new(ChunkPosition::ORIGIN, 8);
        assert!(view.is_empty());
        assert_eq!(view.tile(GlobalTilePosition::new(100, 0, 0)), Tile::Air);
        assert_eq!(view.color(GlobalTilePosition::new(100, 0, 0)), 0);
        assert_eq!(view.stored_light(GlobalTilePosition::new(100, 0, 0)), TileLight::DARK);
    }
}
