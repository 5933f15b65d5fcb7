//! World-level errors.

use thiserror::Error;

use lithos_procedural::{FetchError, StoreError};
use lithos_shared::ConfigError;

/// Errors surfaced by [`World`](crate::World).
#[derive(Debug, Error)]
pub enum WorldError {
    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The chunk store failed.
    #[error("chunk store error: {0}")]
    Store(#[from] StoreError),

    /// A chunk could not be fetched or built.
    #[error("chunk fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The streaming worker thread could not be spawned.
    #[error("failed to spawn streaming worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
