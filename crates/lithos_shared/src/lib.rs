//! # Lithos Shared
//!
//! Common types used by the generator, the store, the mesher and the game
//! crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on another lithos crate. Anything that needs
//! tiles or grids belongs in `lithos_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod constants;
pub mod coords;
pub mod math;

pub use config::{ConfigError, ConfigResult, LightModel, WorldConfig};
pub use constants::{
    AMBIENT_LIGHT_FLOOR, DEFAULT_CHUNK_SIZE, MAX_LIGHT_DISTANCE, MAX_TEXTURE_LAYERS,
    SMOOTHING_BORDER, SMOOTHING_ITERATIONS,
};
pub use coords::{ChunkPosition, GlobalTilePosition, LocalTilePosition};
pub use math::{Vec2, Vec3};
