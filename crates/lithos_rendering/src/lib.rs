//! # Lithos Rendering
//!
//! CPU side of the renderer: light and geometry for streamed chunks.
//!
//! ## Design Principles
//!
//! 1. **Seam-free**: meshes read a border of neighbouring tiles, so adjacent
//!    chunks smooth and light identically along their shared faces
//! 2. **Rigid where it matters**: smoothing is budgeted per material
//! 3. **Owned state**: light and UV-mapping caches live on their owners,
//!    never in globals
//!
//! ## Core Components
//!
//! - `LightPropagator`: column or propagated light, cached per chunk
//! - `MaterialTable`: texture variants and smoothing budgets
//! - `SurfaceMesher`: extract, weld, smooth, normals, texture layers
//! - `WorldView`: cross-chunk tile reads
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithos_rendering::{ChunkNeighborhood, MeshOptions, SurfaceMesher};
//!
//! let view = ChunkNeighborhood::from_chunks(position, 32, chunks);
//! let meshes = SurfaceMesher::new(MeshOptions::for_chunk_size(32)).build_mesh(&view, position, None);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod light;
pub mod materials;
pub mod mesher;
pub mod view;

pub use light::{ChunkLight, ColumnLight, LightPropagator, LightRegion, LightStrategy, PropagatedLight};
pub use materials::{MaterialDef, MaterialTable, BLANK_TEXTURE};
pub use mesher::{
    resolve_layer_uv, ChunkMeshes, CubeVertex, HighDetailVertex, LowDetailVertex, MeshBuffers,
    MeshGraph, MeshOptions, MeshStats, Quad, SurfaceMesher, UvMapping,
};
pub use view::{ChunkNeighborhood, WorldView};
