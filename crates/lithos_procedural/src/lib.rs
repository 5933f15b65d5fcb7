//! # Lithos Procedural
//!
//! Where chunks come from and where they go.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed and position always produce the same chunk
//! 2. **Absence is normal**: a chunk missing from disk is simply generated
//! 3. **Debounced**: bursts of edits cost one write per chunk
//! 4. **Throttled**: the streaming worker builds at most one chunk per tick
//!
//! ## Core Components
//!
//! - `NoiseField`: multi-octave lattice noise
//! - `WorldGenerator`: density threshold plus floater removal
//! - `ChunkStore`: lz4-compressed chunk files behind a pending-write queue
//! - `ChunkStreamingService`: deduplicated fetches, proximity builds, eviction
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithos_procedural::{WorldGenerator, WorldSeed};
//! use lithos_shared::ChunkPosition;
//!
//! let generator = WorldGenerator::new(WorldSeed::new(42), 32);
//! let chunk = generator.generate_chunk(ChunkPosition::ORIGIN);
//! assert!(chunk.solid_count() > 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod edit;
pub mod error;
pub mod generator;
pub mod noise;
pub mod store;
pub mod streaming;

pub use clock::{Clock, ManualClock, SystemClock};
pub use edit::{affected_chunks, TileEdit};
pub use error::{FetchError, FetchResult, StoreError, StoreResult};
pub use generator::{remove_floaters, WorldGenerator};
pub use noise::{NoiseField, WorldSeed};
pub use store::{ChunkStore, StoreOptions, StoreStats, WorldInfo};
pub use streaming::{
    ChunkCache, ChunkLookup, ChunkSource, ChunkStreamingService, Materializer, ServiceState,
    StoreBackedSource, StreamingOptions, StreamingStats, TickReport,
};
