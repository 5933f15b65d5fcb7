//! # LITHOS
//!
//! The main crate, wiring every unit into one [`World`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              LITHOS WORLD                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   Shared        │     │   Core          │     │   Procedural    │   │
//! │  │                 │────>│                 │────>│                 │   │
//! │  │  • Coordinates  │     │  • Tiles        │     │  • Noise        │   │
//! │  │  • Constants    │     │  • Grids        │     │  • Generator    │   │
//! │  │  • Config       │     │  • Chunks       │     │  • Chunk store  │   │
//! │  └─────────────────┘     └─────────────────┘     │  • Streaming    │   │
//! │                                                  └────────┬────────┘   │
//! │                          ┌─────────────────┐              │            │
//! │                          │   Rendering     │<─────────────┘            │
//! │                          │                 │   MeshMaterializer        │
//! │                          │  • Light        │                           │
//! │                          │  • Materials    │                           │
//! │                          │  • Mesher       │                           │
//! │                          └─────────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `world`: the context object
//! - `materializer`: lights and meshes streamed chunks
//! - `error`: world-level errors

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod materializer;
pub mod world;

// Re-export the units
pub use lithos_core as core;
pub use lithos_procedural as procedural;
pub use lithos_rendering as rendering;
pub use lithos_shared as shared;

// Re-export commonly used types
pub use error::{WorldError, WorldResult};
pub use materializer::{ChunkRender, MeshMaterializer};
pub use world::World;
