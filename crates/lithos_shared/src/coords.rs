//! # Coordinates
//!
//! Three integer coordinate spaces:
//!
//! - [`ChunkPosition`]: which chunk (in chunks, not tiles)
//! - [`LocalTilePosition`]: a tile relative to its chunk's origin
//! - [`GlobalTilePosition`]: a tile relative to the world origin
//!
//! Conversions use Euclidean division, so negative world coordinates map to
//! negative chunk indices without any bias constant, and a local position is
//! always in `0..chunk_size` on every axis.

/// Chunk coordinate (identifies a chunk in the world lattice).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPosition {
    /// X coordinate (in chunks).
    pub x: i32,
    /// Y coordinate (in chunks).
    pub y: i32,
    /// Z coordinate (in chunks).
    pub z: i32,
}

impl ChunkPosition {
    /// The chunk containing the world origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Creates a new chunk position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the chunk that owns a global tile.
    #[inline]
    #[must_use]
    pub const fn containing(tile: GlobalTilePosition, chunk_size: i32) -> Self {
        Self {
            x: tile.x.div_euclid(chunk_size),
            y: tile.y.div_euclid(chunk_size),
            z: tile.z.div_euclid(chunk_size),
        }
    }

    /// Returns the global position of this chunk's origin tile.
    #[inline]
    #[must_use]
    pub const fn origin(self, chunk_size: i32) -> GlobalTilePosition {
        GlobalTilePosition::new(
            self.x * chunk_size,
            self.y * chunk_size,
            self.z * chunk_size,
        )
    }

    /// Returns the chunk offset by the given number of chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chebyshev (chessboard) distance in chunks.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// Iterates this chunk and its 26 neighbours.
    pub fn neighborhood(self) -> impl Iterator<Item = Self> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.offset(dx, dy, dz)))
        })
    }
}

impl std::fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

/// Tile position relative to a chunk origin.
///
/// Signed so that meshing can address the smoothing border around a chunk;
/// values produced by [`GlobalTilePosition::split`] are always in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalTilePosition {
    /// Local X.
    pub x: i32,
    /// Local Y.
    pub y: i32,
    /// Local Z.
    pub z: i32,
}

impl LocalTilePosition {
    /// Creates a new local tile position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts back to a global position given the owning chunk.
    #[inline]
    #[must_use]
    pub const fn to_global(self, chunk: ChunkPosition, chunk_size: i32) -> GlobalTilePosition {
        let origin = chunk.origin(chunk_size);
        GlobalTilePosition::new(origin.x + self.x, origin.y + self.y, origin.z + self.z)
    }

    /// Returns true if every axis lies in `0..chunk_size`.
    #[inline]
    #[must_use]
    pub const fn is_within(self, chunk_size: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.z >= 0
            && self.x < chunk_size
            && self.y < chunk_size
            && self.z < chunk_size
    }
}

/// Tile position relative to the world origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlobalTilePosition {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl GlobalTilePosition {
    /// Creates a new global tile position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Splits into the owning chunk and the local offset inside it.
    #[inline]
    #[must_use]
    pub const fn split(self, chunk_size: i32) -> (ChunkPosition, LocalTilePosition) {
        let chunk = ChunkPosition::containing(self, chunk_size);
        let local = LocalTilePosition::new(
            self.x.rem_euclid(chunk_size),
            self.y.rem_euclid(chunk_size),
            self.z.rem_euclid(chunk_size),
        );
        (chunk, local)
    }

    /// Returns the tile offset by the given delta.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}
