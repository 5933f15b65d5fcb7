//! # Tiles
//!
//! A tile is the content of one voxel cell. Grids store tiles as raw bytes;
//! [`Tile::from_id`] maps unknown bytes to `None` so decoders can reject them.

/// Content of a single voxel cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tile {
    /// Empty space.
    #[default]
    Air = 0,
    /// Soil; the tile the world generator produces.
    Ground = 1,
    /// Bare stone.
    Rock = 2,
    /// Masonry; never smoothed.
    Brick = 3,
    /// Timber.
    Wood = 4,
    /// Loose sand.
    Sand = 5,
    /// Light-emitting block.
    Lamp = 6,
}

impl Tile {
    /// Every tile, in id order.
    pub const ALL: [Self; 7] = [
        Self::Air,
        Self::Ground,
        Self::Rock,
        Self::Brick,
        Self::Wood,
        Self::Sand,
        Self::Lamp,
    ];

    /// Returns the tile's byte id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Maps a byte id back to a tile.
    #[inline]
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Air),
            1 => Some(Self::Ground),
            2 => Some(Self::Rock),
            3 => Some(Self::Brick),
            4 => Some(Self::Wood),
            5 => Some(Self::Sand),
            6 => Some(Self::Lamp),
            _ => None,
        }
    }

    /// Returns true if this is an air tile.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// Returns true if this tile occupies its cell.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !self.is_air()
    }

    /// Light emitted by this tile as (r, g, b), if it is a source.
    #[inline]
    #[must_use]
    pub const fn emission(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Lamp => Some((15, 12, 8)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for tile in Tile::ALL {
            assert_eq!(Tile::from_id(tile.id()), Some(tile));
        }
        assert_eq!(Tile::from_id(200), None);
    }

    #[test]
    fn test_air() {
        assert!(Tile::Air.is_air());
        assert!(Tile::Brick.is_solid());
        assert_eq!(Tile::default(), Tile::Air);
    }
}
