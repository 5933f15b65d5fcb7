//! # Chunks
//!
//! A chunk is a fixed-size cuboid of the world: a [`VoxelGrid`] plus the
//! position and seed it was generated from. Chunks whose every tile is the
//! same (all air above the surface, all ground deep below it) keep a single
//! [`Tile`] instead of a grid and only allocate one when a different tile is
//! written into them.
//!
//! ## Record Format
//!
//! [`Chunk::to_bytes`] produces the opaque payload the chunk store
//! compresses. All integers are little-endian.
//!
//! ```text
//! [4 bytes: magic "LCHK"]
//! [1 byte:  version]
//! [12 bytes: position x, y, z (i32)]
//! [8 bytes: seed (u64)]
//! [12 bytes: width, height, depth (u32)]
//! [1 byte:  representation (0 = uniform, 1 = dense)]
//! uniform: [1 byte: tile id]
//! dense:   [N bytes: tiles][N bytes: colours][2N bytes: light (u16)]
//! ```

use lithos_shared::{ChunkPosition, LocalTilePosition};

use crate::error::{CodecError, CodecResult};
use crate::grid::VoxelGrid;
use crate::light::TileLight;
use crate::tile::Tile;

const MAGIC: &[u8; 4] = b"LCHK";
const VERSION: u8 = 1;
const TAG_UNIFORM: u8 = 0;
const TAG_DENSE: u8 = 1;

/// Dimensions of a chunk in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkExtent {
    /// X extent.
    pub width: u32,
    /// Y extent.
    pub height: u32,
    /// Z extent.
    pub depth: u32,
}

impl ChunkExtent {
    /// A cube of the given edge length.
    #[inline]
    #[must_use]
    pub const fn cube(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth: size,
        }
    }

    /// Number of tiles.
    #[inline]
    #[must_use]
    pub const fn volume(self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Number of tiles, or `None` if a dense record of this extent could not
    /// be addressed.
    #[must_use]
    pub fn checked_volume(self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.depth as usize)
            .filter(|volume| volume.checked_mul(4).is_some())
    }

    /// True if a local position lies inside the extent.
    #[inline]
    #[must_use]
    pub fn contains(self, local: LocalTilePosition) -> bool {
        let inside = |v: i32, max: u32| u32::try_from(v).is_ok_and(|v| v < max);
        inside(local.x, self.width) && inside(local.y, self.height) && inside(local.z, self.depth)
    }
}

/// Tile storage of a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkData {
    /// Every tile is the same; no grid is allocated.
    Uniform(Tile),
    /// Full per-tile storage.
    Dense(VoxelGrid),
}

/// A positioned region of the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    position: ChunkPosition,
    seed: u64,
    extent: ChunkExtent,
    data: ChunkData,
}

impl Chunk {
    /// Creates a constant-tile chunk.
    #[must_use]
    pub const fn uniform(position: ChunkPosition, seed: u64, extent: ChunkExtent, tile: Tile) -> Self {
        Self {
            position,
            seed,
            extent,
            data: ChunkData::Uniform(tile),
        }
    }

    /// Wraps a grid, collapsing it to a constant tile if it is uniform.
    #[must_use]
    pub fn from_grid(position: ChunkPosition, seed: u64, grid: VoxelGrid) -> Self {
        let extent = ChunkExtent {
            width: grid.width(),
            height: grid.height(),
            depth: grid.depth(),
        };
        let data = match grid.uniform_tile() {
            Some(tile) => ChunkData::Uniform(tile),
            None => ChunkData::Dense(grid),
        };
        Self {
            position,
            seed,
            extent,
            data,
        }
    }

    /// Position of this chunk in the chunk lattice.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Seed the chunk was generated from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Dimensions in tiles.
    #[inline]
    #[must_use]
    pub const fn extent(&self) -> ChunkExtent {
        self.extent
    }

    /// Underlying storage.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &ChunkData {
        &self.data
    }

    /// The dense grid, if one is allocated.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> Option<&VoxelGrid> {
        match &self.data {
            ChunkData::Dense(grid) => Some(grid),
            ChunkData::Uniform(_) => None,
        }
    }

    /// True if the chunk stores a single constant tile.
    #[inline]
    #[must_use]
    pub const fn is_uniform(&self) -> bool {
        matches!(self.data, ChunkData::Uniform(_))
    }

    /// Tile at a local position; [`Tile::Air`] outside the chunk.
    #[must_use]
    pub fn tile(&self, local: LocalTilePosition) -> Tile {
        match &self.data {
            ChunkData::Dense(grid) => grid.get(local.x, local.y, local.z),
            ChunkData::Uniform(tile) if self.extent.contains(local) => *tile,
            ChunkData::Uniform(_) => Tile::Air,
        }
    }

    /// Colour byte at a local position; 0 for constant chunks and outside the chunk.
    #[must_use]
    pub fn color(&self, local: LocalTilePosition) -> u8 {
        self.grid().map_or(0, |g| g.color(local.x, local.y, local.z))
    }

    /// Stored light at a local position; dark for constant chunks and outside the chunk.
    #[must_use]
    pub fn stored_light(&self, local: LocalTilePosition) -> TileLight {
        self.grid()
            .map_or(TileLight::DARK, |g| g.light(local.x, local.y, local.z))
    }

    /// Writes a tile. Out-of-bounds writes are ignored.
    ///
    /// Writing a different tile into a constant chunk allocates its grid.
    /// Returns true if the stored tile changed.
    pub fn set_tile(&mut self, local: LocalTilePosition, tile: Tile) -> bool {
        if !self.extent.contains(local) || self.tile(local) == tile {
            return false;
        }
        self.materialize();
        match &mut self.data {
            ChunkData::Dense(grid) => grid.set(local.x, local.y, local.z, tile),
            ChunkData::Uniform(_) => false,
        }
    }

    /// Writes a stored light value (e.g. a placed light source).
    pub fn set_stored_light(&mut self, local: LocalTilePosition, light: TileLight) {
        if !self.extent.contains(local) || self.stored_light(local) == light {
            return;
        }
        self.materialize();
        if let ChunkData::Dense(grid) = &mut self.data {
            grid.set_light(local.x, local.y, local.z, light);
        }
    }

    /// Collapses the grid to a constant tile if it became uniform.
    pub fn compact(&mut self) {
        if let ChunkData::Dense(grid) = &self.data {
            if let Some(tile) = grid.uniform_tile() {
                self.data = ChunkData::Uniform(tile);
            }
        }
    }

    /// Number of non-air tiles.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        match &self.data {
            ChunkData::Dense(grid) => grid.count_solid(),
            ChunkData::Uniform(tile) if tile.is_solid() => self.extent.volume(),
            ChunkData::Uniform(_) => 0,
        }
    }

    /// True if both chunks hold the same tile at every position.
    #[must_use]
    pub fn tiles_equal(&self, other: &Self) -> bool {
        if self.extent != other.extent {
            return false;
        }
        match (&self.data, &other.data) {
            (ChunkData::Uniform(a), ChunkData::Uniform(b)) => a == b,
            (ChunkData::Dense(a), ChunkData::Dense(b)) => a.tile_bytes() == b.tile_bytes(),
            (ChunkData::Uniform(t), ChunkData::Dense(g)) | (ChunkData::Dense(g), ChunkData::Uniform(t)) => {
                g.tile_bytes().iter().all(|&id| id == t.id())
            }
        }
    }

    fn materialize(&mut self) {
        if let ChunkData::Uniform(tile) = self.data {
            let ChunkExtent { width, height, depth } = self.extent;
            self.data = ChunkData::Dense(VoxelGrid::filled(width, height, depth, tile));
        }
    }

    // =========================================================================
    // CODEC
    // =========================================================================

    /// Serializes the chunk into its binary record.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = match &self.data {
            ChunkData::Uniform(_) => 1,
            ChunkData::Dense(_) => self.extent.volume() * 4,
        };
        let mut buf = Vec::with_capacity(38 + body);
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&self.position.x.to_le_bytes());
        buf.extend_from_slice(&self.position.y.to_le_bytes());
        buf.extend_from_slice(&self.position.z.to_le_bytes());
        buf.extend_from_slice(&self.seed.to_le_bytes());
        buf.extend_from_slice(&self.extent.width.to_le_bytes());
        buf.extend_from_slice(&self.extent.height.to_le_bytes());
        buf.extend_from_slice(&self.extent.depth.to_le_bytes());

        match &self.data {
            ChunkData::Uniform(tile) => {
                buf.push(TAG_UNIFORM);
                buf.push(tile.id());
            }
            ChunkData::Dense(grid) => {
                buf.push(TAG_DENSE);
                buf.extend_from_slice(grid.tile_bytes());
                buf.extend_from_slice(grid.color_bytes());
                for light in grid.light_values() {
                    buf.extend_from_slice(&light.bits().to_le_bytes());
                }
            }
        }
        buf
    }

    /// Decodes a binary record produced by [`Chunk::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the record is truncated, malformed or
    /// names unknown tiles.
    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let mut reader = Reader { data, offset: 0 };

        if reader.take(4)? != MAGIC {
            return Err(CodecError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let position = ChunkPosition::new(reader.i32()?, reader.i32()?, reader.i32()?);
        let seed = reader.u64()?;
        let extent = ChunkExtent {
            width: reader.u32()?,
            height: reader.u32()?,
            depth: reader.u32()?,
        };
        let volume = extent.checked_volume().ok_or(CodecError::ExtentTooLarge {
            width: extent.width,
            height: extent.height,
            depth: extent.depth,
        })?;

        let chunk = match reader.u8()? {
            TAG_UNIFORM => {
                let id = reader.u8()?;
                let tile = Tile::from_id(id).ok_or(CodecError::UnknownTile(id))?;
                Self::uniform(position, seed, extent, tile)
            }
            TAG_DENSE => {
                let tiles = reader.take(volume)?.to_vec();
                if let Some(&bad) = tiles.iter().find(|&&id| Tile::from_id(id).is_none()) {
                    return Err(CodecError::UnknownTile(bad));
                }
                let colors = reader.take(volume)?.to_vec();
                let light = reader
                    .take(volume * 2)?
                    .chunks_exact(2)
                    .map(|pair| TileLight::from_bits(u16::from_le_bytes([pair[0], pair[1]])))
                    .collect();
                let grid = VoxelGrid::from_parts(
                    (extent.width, extent.height, extent.depth),
                    tiles,
                    colors,
                    light,
                )
                .ok_or(CodecError::DimensionMismatch {
                    width: extent.width,
                    height: extent.height,
                    depth: extent.depth,
                })?;
                Self {
                    position,
                    seed,
                    extent,
                    data: ChunkData::Dense(grid),
                }
            }
            tag => return Err(CodecError::UnknownRepresentation(tag)),
        };

        let rest = data.len() - reader.offset;
        if rest != 0 {
            return Err(CodecError::TrailingBytes(rest));
        }
        Ok(chunk)
    }
}

/// Cursor over a record being decoded.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(CodecError::Truncated {
                offset: self.offset,
                needed: len,
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }
}
