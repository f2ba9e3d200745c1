//! # Generation Error Types

use lithos_core::HunkError;
use thiserror::Error;

/// Failure inside an external sample source (noise, biome data).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    /// A sample could not be produced at a column.
    #[error("sample source failed at ({x}, {z}): {reason}")]
    Failed {
        /// World X of the column.
        x: i32,
        /// World Z of the column.
        z: i32,
        /// Human-readable cause.
        reason: String,
    },

    /// A biome referenced by key is not registered.
    #[error("unknown biome: {0}")]
    UnknownBiome(String),

    /// A sample came back as NaN or infinity.
    #[error("non-finite {what} sample at ({x}, {z})")]
    NonFinite {
        /// Which stream produced it.
        what: &'static str,
        /// World X of the column.
        x: i32,
        /// World Z of the column.
        z: i32,
    },
}

/// Errors raised while actuating terrain into a hunk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuateError {
    /// A write fell outside the hunk. This is a programming error.
    #[error(transparent)]
    Hunk(#[from] HunkError),

    /// The sample source failed.
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// A section task panicked during parallel actuation.
    #[error("section actuation panicked")]
    SectionPanicked,
}

/// Result type for sample source queries.
pub type SampleResult<T> = Result<T, SampleError>;

/// Result type for actuation.
pub type ActuateResult<T> = Result<T, ActuateError>;
