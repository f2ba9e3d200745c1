//! # Hunk Error Types

use thiserror::Error;

/// Errors raised by hunk construction and access.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkError {
    /// A coordinate lies outside the hunk's extents.
    #[error("voxel ({x}, {y}, {z}) out of bounds for {width}x{height}x{depth} hunk")]
    OutOfBounds {
        /// Requested X.
        x: usize,
        /// Requested Y.
        y: usize,
        /// Requested Z.
        z: usize,
        /// Hunk width.
        width: usize,
        /// Hunk height.
        height: usize,
        /// Hunk depth.
        depth: usize,
    },

    /// A hunk was requested with a zero-sized dimension.
    #[error("hunk extents must be non-zero, got {width}x{height}x{depth}")]
    ZeroExtent {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Requested depth.
        depth: usize,
    },

    /// The voxel count or its byte size overflows the address space.
    #[error("hunk extents {width}x{height}x{depth} are too large to allocate")]
    TooLarge {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Requested depth.
        depth: usize,
    },
}

/// Result type for hunk operations.
pub type HunkResult<T> = Result<T, HunkError>;
