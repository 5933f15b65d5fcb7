//! # Codec Error Types
//!
//! Everything that can go wrong while decoding a serialized chunk.

use thiserror::Error;

/// Errors raised by the chunk codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The record ended before all fields were read.
    #[error("chunk record truncated: needed {needed} bytes at offset {offset}")]
    Truncated {
        /// Offset where the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
    },

    /// The record does not start with the chunk magic.
    #[error("not a chunk record (bad magic)")]
    BadMagic,

    /// The record was written by an unknown codec version.
    #[error("unsupported chunk record version {0}")]
    UnsupportedVersion(u8),

    /// The representation tag is neither uniform nor dense.
    #[error("unknown chunk representation tag {0}")]
    UnknownRepresentation(u8),

    /// A tile byte does not name a known tile.
    #[error("unknown tile id {0}")]
    UnknownTile(u8),

    /// Buffer lengths disagree with the recorded dimensions.
    #[error("chunk dimensions {width}x{height}x{depth} do not match payload")]
    DimensionMismatch {
        /// Recorded width.
        width: u32,
        /// Recorded height.
        height: u32,
        /// Recorded depth.
        depth: u32,
    },

    /// The recorded dimensions overflow the addressable tile count.
    #[error("chunk dimensions {width}x{height}x{depth} are too large")]
    ExtentTooLarge {
        /// Recorded width.
        width: u32,
        /// Recorded height.
        height: u32,
        /// Recorded depth.
        depth: u32,
    },

    /// Bytes were left over after the record.
    #[error("{0} trailing bytes after chunk record")]
    TrailingBytes(usize),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
