//! # World Constants
//!
//! Values baked into the binary. Anything an operator may want to tune lives
//! in [`WorldConfig`](crate::WorldConfig) instead.

use std::time::Duration;

// =============================================================================
// CHUNK GEOMETRY
// =============================================================================

/// Default chunk edge length in tiles.
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Extra tiles read on every side of a chunk while meshing.
///
/// Smoothing moves information one tile per iteration, so the border must be
/// at least as wide as the number of smoothing iterations.
pub const SMOOTHING_BORDER: i32 = 3;

/// Number of smoothing iterations run by the surface mesher.
pub const SMOOTHING_ITERATIONS: u32 = SMOOTHING_BORDER as u32;

/// Maximum texture layers blended at one vertex.
pub const MAX_TEXTURE_LAYERS: usize = 5;

// =============================================================================
// LIGHT
// =============================================================================

/// Largest value a single light channel can hold (4 bits).
pub const MAX_LIGHT_CHANNEL: u8 = 15;

/// Maximum number of hops light travels away from a source.
pub const MAX_LIGHT_DISTANCE: u32 = 15;

/// Column model: light above the first solid tile of a column.
pub const COLUMN_LIGHT_BRIGHT: u8 = 15;

/// Column model: light at and below the first solid tile of a column.
pub const COLUMN_LIGHT_DIM: u8 = 6;

/// Lowest intensity reported for an in-range tile.
pub const AMBIENT_LIGHT_FLOOR: u8 = 2;

// =============================================================================
// PERSISTENCE & STREAMING
// =============================================================================

/// Default minimum delay between marking a chunk dirty and writing it.
pub const DEFAULT_MIN_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval of the streaming worker loop.
pub const DEFAULT_STREAM_TICK: Duration = Duration::from_millis(50);

/// Default Chebyshev distance (in chunks) beyond which chunks are evicted.
pub const DEFAULT_RENDER_DISTANCE: u32 = 3;

/// Radius of the outermost search ring of the streaming worker (5x5x5).
pub const STREAM_SEARCH_RADIUS: i32 = 2;
