//! # Error Types
//!
//! Storage and fetch failures.
//!
//! A chunk that is simply not on disk, or whose file is corrupt, is not an
//! error: the store reports it as absent and the caller generates it.

use std::path::PathBuf;

use thiserror::Error;

use lithos_shared::ChunkPosition;

/// Errors raised by the chunk store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A file could not be written or the world directory created.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The store was already shut down.
    #[error("chunk store is shut down")]
    ShutDown,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while fetching or materializing a chunk.
///
/// Cloneable so that every caller waiting on a deduplicated fetch receives
/// the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The authoritative source could not provide the chunk.
    #[error("chunk {position} unavailable: {reason}")]
    Unavailable {
        /// Requested chunk.
        position: ChunkPosition,
        /// What went wrong.
        reason: String,
    },

    /// The chunk was fetched but turning it into its consumer form failed.
    #[error("failed to materialize chunk {position}: {reason}")]
    Materialize {
        /// Chunk being materialized.
        position: ChunkPosition,
        /// What went wrong.
        reason: String,
    },
}

impl FetchError {
    /// Chunk the failure refers to.
    #[must_use]
    pub fn position(&self) -> ChunkPosition {
        match self {
            Self::Unavailable { position, .. } | Self::Materialize { position, .. } => *position,
        }
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
