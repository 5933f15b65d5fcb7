//! # Lithos Core
//!
//! The voxel data model shared by generation, persistence, lighting and
//! meshing.
//!
//! ## Rules
//!
//! 1. **Bounds-safe access** - every grid read outside the allocation returns
//!    [`Tile::Air`], every write outside it is a no-op
//! 2. **Compact storage** - one byte per tile; uniform chunks allocate no grid
//! 3. **Plain data** - nothing here knows about threads, files or meshes
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithos_core::{Tile, VoxelGrid};
//!
//! let mut grid = VoxelGrid::new(16, 16, 16);
//! grid.set(1, 2, 3, Tile::Rock);
//! assert_eq!(grid.get(1, 2, 3), Tile::Rock);
//! assert_eq!(grid.get(-1, 0, 0), Tile::Air);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod error;
pub mod grid;
pub mod light;
pub mod tile;

pub use chunk::{Chunk, ChunkData, ChunkExtent};
pub use error::{CodecError, CodecResult};
pub use grid::VoxelGrid;
pub use light::TileLight;
pub use tile::Tile;
