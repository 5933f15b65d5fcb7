//! # Voxel Grid
//!
//! A dense `width x height x depth` tile array stored as one byte per tile,
//! indexed `x + y * width + z * width * height`. Two side buffers run in
//! parallel with the tiles: a colour byte (0-127) and a [`TileLight`].
//!
//! All accessors take signed coordinates and are bounds-checked: reads outside
//! the grid return [`Tile::Air`] (or dark / zero), writes outside it do
//! nothing. Neighbour lookups therefore never need their own range checks.

use crate::light::TileLight;
use crate::tile::Tile;

/// Largest colour value stored in the colour side buffer.
pub const MAX_COLOR: u8 = 127;

/// Dense tile grid with colour and light side buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    width: u32,
    height: u32,
    depth: u32,
    tiles: Vec<u8>,
    colors: Vec<u8>,
    light: Vec<TileLight>,
}

impl VoxelGrid {
    /// Creates an all-air grid.
    #[must_use]
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self::filled(width, height, depth, Tile::Air)
    }

    /// Creates a grid where every cell holds `tile`.
    #[must_use]
    pub fn filled(width: u32, height: u32, depth: u32, tile: Tile) -> Self {
        let volume = width as usize * height as usize * depth as usize;
        Self {
            width,
            height,
            depth,
            tiles: vec![tile.id(); volume],
            colors: vec![0; volume],
            light: vec![TileLight::DARK; volume],
        }
    }

    /// Rebuilds a grid from raw buffers.
    ///
    /// Returns `None` if any buffer length disagrees with the dimensions.
    #[must_use]
    pub fn from_parts(
        dims: (u32, u32, u32),
        tiles: Vec<u8>,
        colors: Vec<u8>,
        light: Vec<TileLight>,
    ) -> Option<Self> {
        let (width, height, depth) = dims;
        let volume = width as usize * height as usize * depth as usize;
        if tiles.len() != volume || colors.len() != volume || light.len() != volume {
            return None;
        }
        Some(Self {
            width,
            height,
            depth,
            tiles,
            colors,
            light,
        })
    }

    /// Width (x extent).
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height (y extent).
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Depth (z extent).
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> usize {
        self.tiles.len()
    }

    /// Linear index of a cell, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let (x, y, z) = (
            u32::try_from(x).ok()?,
            u32::try_from(y).ok()?,
            u32::try_from(z).ok()?,
        );
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        let (w, h) = (self.width as usize, self.height as usize);
        Some(x as usize + y as usize * w + z as usize * w * h)
    }

    /// True if the coordinates lie inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.index(x, y, z).is_some()
    }

    /// Tile at a cell; [`Tile::Air`] outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Tile {
        self.index(x, y, z)
            .and_then(|i| Tile::from_id(self.tiles[i]))
            .unwrap_or(Tile::Air)
    }

    /// Writes a tile. Out-of-bounds writes are ignored.
    ///
    /// Returns true if the cell was inside the grid.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, tile: Tile) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.tiles[i] = tile.id();
                true
            }
            None => false,
        }
    }

    /// Colour byte at a cell; 0 outside the grid.
    #[inline]
    #[must_use]
    pub fn color(&self, x: i32, y: i32, z: i32) -> u8 {
        self.index(x, y, z).map_or(0, |i| self.colors[i])
    }

    /// Writes a colour byte, clamped to [`MAX_COLOR`]. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_color(&mut self, x: i32, y: i32, z: i32, color: u8) {
        if let Some(i) = self.index(x, y, z) {
            self.colors[i] = color.min(MAX_COLOR);
        }
    }

    /// Stored light at a cell; dark outside the grid.
    #[inline]
    #[must_use]
    pub fn light(&self, x: i32, y: i32, z: i32) -> TileLight {
        self.index(x, y, z).map_or(TileLight::DARK, |i| self.light[i])
    }

    /// Writes a light value. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_light(&mut self, x: i32, y: i32, z: i32, light: TileLight) {
        if let Some(i) = self.index(x, y, z) {
            self.light[i] = light;
        }
    }

    /// Raw tile bytes in index order.
    #[must_use]
    pub fn tile_bytes(&self) -> &[u8] {
        &self.tiles
    }

    /// Raw colour bytes in index order.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        &self.colors
    }

    /// Raw light values in index order.
    #[must_use]
    pub fn light_values(&self) -> &[TileLight] {
        &self.light
    }

    /// Number of non-air cells.
    #[must_use]
    pub fn count_solid(&self) -> usize {
        self.tiles.iter().filter(|&&id| id != Tile::Air.id()).count()
    }

    /// If every cell holds the same tile and the side buffers are blank,
    /// returns that tile.
    #[must_use]
    pub fn uniform_tile(&self) -> Option<Tile> {
        let first = *self.tiles.first()?;
        let same = self.tiles.iter().all(|&id| id == first);
        let blank = self.colors.iter().all(|&c| c == 0)
            && self.light.iter().all(|&l| l == TileLight::DARK);
        if same && blank {
            Tile::from_id(first)
        } else {
            None
        }
    }

    /// Iterates `(x, y, z)` over every cell in index order.
    pub fn coords(&self) -> impl Iterator<Item = (i32, i32, i32)> {
        let (w, h, d) = (
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
            i32::try_from(self.depth).unwrap_or(i32::MAX),
        );
        (0..d).flat_map(move |z| (0..h).flat_map(move |y| (0..w).map(move |x| (x, y, z))))
    }
}
