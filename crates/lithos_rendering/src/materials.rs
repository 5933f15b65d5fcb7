//! # Materials
//!
//! Per-tile surface rules for the mesher:
//!
//! - **Textures**: each solid tile has one or more texture variants. A face
//!   picks a variant from its z-index, so large flat areas do not tile
//!   visibly. Texture index 0 is reserved for "no texture" (blank layer).
//! - **Max smooths**: how many smoothing iterations may move a vertex of
//!   this material. Rigid materials use 0 and keep their hard edges.

use lithos_core::Tile;

/// Texture index of a blank layer.
pub const BLANK_TEXTURE: u32 = 0;

/// Surface rules for one tile type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialDef {
    /// Texture array indices; empty for air.
    pub textures: Vec<u32>,
    /// Smoothing iterations allowed to move this material's vertices.
    pub max_smooths: u32,
}

impl MaterialDef {
    /// Creates a material definition.
    #[must_use]
    pub fn new(textures: &[u32], max_smooths: u32) -> Self {
        Self {
            textures: textures.to_vec(),
            max_smooths,
        }
    }
}

/// Surface rules for every tile type, indexed by tile id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialTable {
    defs: Vec<MaterialDef>,
}

impl MaterialTable {
    /// Overrides one tile's definition.
    #[must_use]
    pub fn with(mut self, tile: Tile, def: MaterialDef) -> Self {
        self.defs[usize::from(tile.id())] = def;
        self
    }

    /// Overrides one tile's smoothing budget.
    #[must_use]
    pub fn with_max_smooths(mut self, tile: Tile, max_smooths: u32) -> Self {
        self.defs[usize::from(tile.id())].max_smooths = max_smooths;
        self
    }

    /// Definition for a tile.
    #[inline]
    #[must_use]
    pub fn get(&self, tile: Tile) -> &MaterialDef {
        &self.defs[usize::from(tile.id())]
    }

    /// Smoothing budget for a tile.
    #[inline]
    #[must_use]
    pub fn max_smooths(&self, tile: Tile) -> u32 {
        self.get(tile).max_smooths
    }

    /// Texture for a face of `tile`, picked by `variant_seed`.
    ///
    /// Returns [`BLANK_TEXTURE`] for tiles without textures.
    #[must_use]
    pub fn texture_for(&self, tile: Tile, variant_seed: u32) -> u32 {
        let textures = &self.get(tile).textures;
        if textures.is_empty() {
            return BLANK_TEXTURE;
        }
        textures[variant_seed as usize % textures.len()]
    }

    /// Highest texture index in use; texture arrays need this many + 1 slots.
    #[must_use]
    pub fn max_texture(&self) -> u32 {
        self.defs
            .iter()
            .flat_map(|def| def.textures.iter().copied())
            .max()
            .unwrap_or(BLANK_TEXTURE)
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        let mut defs = vec![MaterialDef::new(&[], 0); Tile::ALL.len()];
        let mut set = |tile: Tile, textures: &[u32], max_smooths: u32| {
            defs[usize::from(tile.id())] = MaterialDef::new(textures, max_smooths);
        };
        set(Tile::Ground, &[1, 2, 3], 3);
        set(Tile::Rock, &[4, 5], 1);
        set(Tile::Brick, &[6], 0);
        set(Tile::Wood, &[7], 0);
        set(Tile::Sand, &[8, 9], 3);
        set(Tile::Lamp, &[10], 0);
        Self { defs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_solid_tile_has_a_texture() {
        let table = MaterialTable::default();
        for tile in Tile::ALL {
            let texture = table.texture_for(tile, 7);
            if tile.is_solid() {
                assert_ne!(texture, BLANK_TEXTURE, "{tile:?}");
            } else {
                assert_eq!(texture, BLANK_TEXTURE);
            }
        }
        assert_eq!(table.max_texture(), 10);
    }

    #[test]
    fn test_rigid_materials_never_smooth() {
        let table = MaterialTable::default();
        assert_eq!(table.max_smooths(Tile::Brick), 0);
        assert_eq!(table.max_smooths(Tile::Wood), 0);
        assert!(table.max_smooths(Tile::Ground) > 0);
    }

    #[test]
    fn test_variants_follow_seed() {
        let table = MaterialTable::default();
        assert_eq!(table.texture_for(Tile::Ground, 0), 1);
        assert_eq!(table.texture_for(Tile::Ground, 4), 2);
        assert_eq!(table.texture_for(Tile::Brick, 99), 6);
    }

    #[test]
    fn test_overrides() {
        let table = MaterialTable::default()
            .with_max_smooths(Tile::Ground, 0)
            .with(Tile::Rock, MaterialDef::new(&[42], 2));
        assert_eq!(table.max_smooths(Tile::Ground), 0);
        assert_eq!(table.texture_for(Tile::Rock, 3), 42);
        assert_eq!(table.max_smooths(Tile::Rock), 2);
    }
}
