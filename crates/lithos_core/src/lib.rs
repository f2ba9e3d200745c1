//! # LITHOS Core
//!
//! Volumetric buffers ("hunks") for terrain generation.
//!
//! A hunk stores one value per voxel of a `width x height x depth` region.
//! Two storage strategies are available, selected at construction:
//!
//! - **Exclusive**: a plain boxed slice, written through `&mut`
//! - **Atomic**: one atomic cell per voxel, writable through `&` from many
//!   threads at once without a lock
//!
//! Atomic writes are per cell only. A multi-voxel write (a whole column, a
//! fill) is never atomic as a unit.
//!
//! ## Example
//!
//! ```rust
//! use lithos_core::{ExclusiveHunk, HunkResult};
//!
//! fn demo() -> HunkResult<()> {
//!     let mut hunk = ExclusiveHunk::new(16, 256, 16, 0u16)?;
//!     hunk.set(3, 64, 7, 42)?;
//!     assert_eq!(hunk.get(3, 64, 7)?, 42);
//!     assert!(hunk.get(16, 0, 0).is_err());
//!     Ok(())
//! }
//! # demo().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod hunk;

pub use bytemuck;

pub use error::{HunkError, HunkResult};
pub use hunk::{
    AtomicHunk, AtomicStorage, AtomicVoxel, ColumnRegion, ColumnRegions, ExclusiveHunk,
    ExclusiveStorage, Extent, Hunk, HunkStorage, SharedHunkWriter, SharedStorage, StorageMode,
    VoxelSink,
};
