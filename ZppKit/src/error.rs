//! Error types for `zppkit`

use thiserror::Error;

/// The error type for `zppkit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A computed offset exceeds the resource buffer.
    #[error("read of {len} bytes at offset {offset:#x} exceeds bank size {size:#x}")]
    OutOfBounds {
        /// Offset the read started at.
        offset: usize,
        /// Number of bytes requested.
        len: usize,
        /// Total size of the bank image.
        size: usize,
    },

    /// The blob is too small to contain the fixed bank layout.
    #[error("bank too small: {size} bytes (need at least {needed})")]
    BankTooSmall {
        /// Actual size of the blob after the outer header.
        size: usize,
        /// Minimum size required by the fixed layout.
        needed: usize,
    },

    /// A clip header describes a data region that folds back on itself.
    #[error("clip at {offset:#x} has invalid data region (end {data_end:#x})")]
    InvalidClipRegion {
        /// Offset of the clip header.
        offset: usize,
        /// The `data_end` field read from the header.
        data_end: usize,
    },

    /// The audio-encode collaborator failed.
    #[error("encode failed for {name}: {message}")]
    Encode {
        /// Output asset name.
        name: String,
        /// Collaborator error message.
        message: String,
    },
}

/// A specialized Result type for `zppkit` operations.
pub type Result<T> = std::result::Result<T, Error>;
