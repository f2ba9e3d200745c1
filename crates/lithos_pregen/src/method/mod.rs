//! # Generation Methods
//!
//! A generation method realizes one chunk coordinate. Two implementations:
//!
//! - [`HeadlessMethod`](headless::HeadlessMethod): runs the engine in memory
//!   and measures the result; nothing is persisted
//! - [`HybridMethod`](hybrid::HybridMethod): hands the coordinate to a live
//!   world, whose writes happen on a dedicated write thread
//!
//! Both may be called concurrently for different coordinates. Calling with
//! the same coordinate concurrently is the caller's problem.

pub mod headless;
pub mod hybrid;

use std::fmt;

use lithos_procedural::ChunkCoord;

use crate::error::MethodResult;
use crate::task::WorldIdentity;

/// Why a coordinate was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The chunk already exists.
    AlreadyGenerated,
    /// The chunk lies outside the world border.
    OutsideBorder,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyGenerated => "already generated",
            Self::OutsideBorder => "outside world border",
        })
    }
}

/// Successful outcome for one coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Generated {
    /// The chunk was generated.
    Success,
    /// Nothing was done.
    Skipped(SkipReason),
}

/// Per-coordinate generation strategy.
pub trait GenerationMethod: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The world this method is bound to.
    fn identity(&self) -> &WorldIdentity;

    /// Preferred number of concurrent callers.
    fn concurrency(&self) -> usize;

    /// Realizes one chunk.
    ///
    /// # Errors
    ///
    /// Returns a [`MethodError`](crate::MethodError) describing why the chunk
    /// could not be produced. The scheduler records it and carries on.
    fn generate(&self, coord: ChunkCoord) -> MethodResult<Generated>;
}
