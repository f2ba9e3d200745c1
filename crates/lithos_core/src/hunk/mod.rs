//! # Hunks
//!
//! A hunk is a 3D buffer over a `width x height x depth` voxel region.
//!
//! ## Layout
//!
//! ```text
//! index = z * width * height + y * width + x
//! ```
//!
//! Z is the outermost axis, then Y, then X. Actuation walks one column at a
//! time (fixed X/Z, descending Y), so a column's voxels are a fixed stride
//! apart and neighbouring columns along X are adjacent in memory.
//!
//! ## Storage
//!
//! The storage strategy is a type parameter:
//!
//! - [`ExclusiveHunk`]: written through `&mut`, one owner at a time
//! - [`AtomicHunk`]: additionally written through `&` by many threads
//!
//! Writers that should work with both go through [`VoxelSink`].

mod atomic;
mod region;
mod storage;

use std::marker::PhantomData;

use crate::error::{HunkError, HunkResult};

pub use atomic::AtomicVoxel;
pub use region::{ColumnRegion, ColumnRegions};
pub use storage::{AtomicStorage, ExclusiveStorage, HunkStorage, SharedStorage, StorageMode};

/// Dimensions of a hunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Size along X.
    pub width: usize,
    /// Size along Y.
    pub height: usize,
    /// Size along Z.
    pub depth: usize,
}

impl Extent {
    /// Creates an extent.
    #[inline]
    #[must_use]
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total number of voxels, saturating at `usize::MAX`.
    ///
    /// Exact for the extent of any constructed hunk.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.width.saturating_mul(self.height).saturating_mul(self.depth)
    }

    /// Total number of voxels, or `None` if it overflows `usize`.
    #[inline]
    #[must_use]
    pub const fn checked_volume(&self) -> Option<usize> {
        match self.width.checked_mul(self.height) {
            Some(area) => area.checked_mul(self.depth),
            None => None,
        }
    }

    /// Returns true if the coordinate lies inside the extent.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.depth
    }

    /// Linear index of an in-bounds coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] if any coordinate is outside.
    #[inline]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> HunkResult<usize> {
        if self.contains(x, y, z) {
            Ok(z * self.width * self.height + y * self.width + x)
        } else {
            Err(HunkError::OutOfBounds {
                x,
                y,
                z,
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
        }
    }
}

/// A 3D voxel buffer with storage strategy `S`.
pub struct Hunk<T, S = ExclusiveStorage<T>> {
    extent: Extent,
    storage: S,
    _voxel: PhantomData<fn() -> T>,
}

/// Hunk with a single writer.
pub type ExclusiveHunk<T> = Hunk<T, ExclusiveStorage<T>>;

/// Hunk whose cells may be written concurrently through shared references.
pub type AtomicHunk<T> = Hunk<T, AtomicStorage<T>>;

impl<T: Copy, S: HunkStorage<T>> Hunk<T, S> {
    /// Creates a hunk with every voxel set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::ZeroExtent`] if any dimension is zero, or
    /// [`HunkError::TooLarge`] if the buffer cannot be addressed.
    pub fn new(width: usize, height: usize, depth: usize, fill: T) -> HunkResult<Self> {
        Self::with_extent(Extent::new(width, height, depth), fill)
    }

    /// Creates a hunk from an extent with every voxel set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::ZeroExtent`] if any dimension is zero, or
    /// [`HunkError::TooLarge`] if the buffer cannot be addressed.
    pub fn with_extent(extent: Extent, fill: T) -> HunkResult<Self> {
        if extent.width == 0 || extent.height == 0 || extent.depth == 0 {
            return Err(HunkError::ZeroExtent {
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
            });
        }

        // Allocations are capped at isize::MAX bytes.
        let volume = extent
            .checked_volume()
            .filter(|&n| {
                n.checked_mul(std::mem::size_of::<T>().max(1))
                    .is_some_and(|bytes| isize::try_from(bytes).is_ok())
            })
            .ok_or(HunkError::TooLarge {
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
            })?;

        Ok(Self {
            extent,
            storage: S::filled(volume, fill),
            _voxel: PhantomData,
        })
    }

    /// The hunk's dimensions.
    #[inline]
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Size along X.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.extent.width
    }

    /// Size along Y.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.extent.height
    }

    /// Size along Z.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.extent.depth
    }

    /// The storage write mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> StorageMode {
        S::MODE
    }

    /// Returns true if the hunk may be written concurrently.
    #[inline]
    #[must_use]
    pub const fn is_concurrent(&self) -> bool {
        matches!(S::MODE, StorageMode::Concurrent)
    }

    /// Reads one voxel.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] outside the extent.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> HunkResult<T> {
        let index = self.extent.index(x, y, z)?;
        Ok(self.storage.read(index))
    }

    /// Writes one voxel.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] outside the extent.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) -> HunkResult<()> {
        let index = self.extent.index(x, y, z)?;
        self.storage.write(index, value);
        Ok(())
    }

    /// Sets every voxel to `value`.
    pub fn fill(&mut self, value: T) {
        for index in 0..self.storage.len() {
            self.storage.write(index, value);
        }
    }

    /// Reads the column at `(x, z)`, bottom to top.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] if the column is outside.
    pub fn column(&self, x: usize, z: usize) -> HunkResult<Vec<T>> {
        (0..self.extent.height).map(|y| self.get(x, y, z)).collect()
    }

    /// Iterates `(x, y, z, value)` in linear index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, T)> + '_ {
        let Extent { width, height, .. } = self.extent;
        (0..self.storage.len()).map(move |index| {
            let x = index % width;
            let y = (index / width) % height;
            let z = index / (width * height);
            (x, y, z, self.storage.read(index))
        })
    }

    /// Counts voxels matching `predicate`.
    pub fn count(&self, mut predicate: impl FnMut(T) -> bool) -> usize {
        (0..self.storage.len())
            .filter(|&index| predicate(self.storage.read(index)))
            .count()
    }

    /// Tiles the column plane into regions of at most `size x size`.
    #[must_use]
    pub fn regions(&self, size: usize) -> ColumnRegions {
        ColumnRegions::new(self.extent, size)
    }
}

impl<T: Copy, S: SharedStorage<T>> Hunk<T, S> {
    /// Writes one voxel through a shared reference.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] outside the extent.
    #[inline]
    pub fn set_shared(&self, x: usize, y: usize, z: usize, value: T) -> HunkResult<()> {
        let index = self.extent.index(x, y, z)?;
        self.storage.write_shared(index, value);
        Ok(())
    }

    /// Replaces one voxel if it currently equals `current`.
    ///
    /// The outer `Result` reports bounds; the inner one reports whether the
    /// exchange happened (`Err` carries the value actually found).
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] outside the extent.
    pub fn compare_exchange(
        &self,
        x: usize,
        y: usize,
        z: usize,
        current: T,
        new: T,
    ) -> HunkResult<Result<T, T>> {
        let index = self.extent.index(x, y, z)?;
        Ok(self.storage.compare_exchange(index, current, new))
    }

    /// A [`VoxelSink`] writing through a shared reference.
    #[must_use]
    pub fn writer(&self) -> SharedHunkWriter<'_, T, S> {
        SharedHunkWriter { hunk: self }
    }
}

impl<T: Copy> ExclusiveHunk<T> {
    /// The voxels in linear index order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }
}

impl<T: AtomicVoxel> AtomicHunk<T> {
    /// Converts into an exclusive hunk once all concurrent writers are done.
    #[must_use]
    pub fn into_exclusive(self) -> ExclusiveHunk<T> {
        Hunk {
            extent: self.extent,
            storage: self.storage.into_exclusive(),
            _voxel: PhantomData,
        }
    }
}

impl<T: Copy + std::fmt::Debug, S: HunkStorage<T>> std::fmt::Debug for Hunk<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hunk")
            .field("extent", &self.extent)
            .field("mode", &S::MODE)
            .finish_non_exhaustive()
    }
}

impl<T: Copy, S: HunkStorage<T> + Clone> Clone for Hunk<T, S> {
    fn clone(&self) -> Self {
        Self {
            extent: self.extent,
            storage: self.storage.clone(),
            _voxel: PhantomData,
        }
    }
}

/// Destination for voxel writes, implemented by every hunk flavour.
pub trait VoxelSink<T> {
    /// Dimensions of the destination.
    fn extent(&self) -> Extent;

    /// Writes one voxel.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] outside the extent.
    fn put(&mut self, x: usize, y: usize, z: usize, value: T) -> HunkResult<()>;
}

impl<T: Copy, S: HunkStorage<T>> VoxelSink<T> for Hunk<T, S> {
    #[inline]
    fn extent(&self) -> Extent {
        self.extent
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, z: usize, value: T) -> HunkResult<()> {
        self.set(x, y, z, value)
    }
}

/// Writes into a concurrent hunk through a shared reference.
///
/// Cheap to create; each thread actuating part of a shared hunk holds its own.
pub struct SharedHunkWriter<'a, T, S> {
    hunk: &'a Hunk<T, S>,
}

impl<T: Copy, S: SharedStorage<T>> VoxelSink<T> for SharedHunkWriter<'_, T, S> {
    #[inline]
    fn extent(&self) -> Extent {
        self.hunk.extent
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, z: usize, value: T) -> HunkResult<()> {
        self.hunk.set_shared(x, y, z, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_then_get() {
        let mut hunk = ExclusiveHunk::new(4, 5, 6, 0u32).unwrap();
        for z in 0..6 {
            for y in 0..5 {
                for x in 0..4 {
                    let value = (x + y * 10 + z * 100) as u32;
                    hunk.set(x, y, z, value).unwrap();
                    assert_eq!(hunk.get(x, y, z).unwrap(), value);
                }
            }
        }
    }

    #[test]
    fn test_linear_index_layout() {
        let extent = Extent::new(3, 4, 5);
        assert_eq!(extent.index(0, 0, 0), Ok(0));
        assert_eq!(extent.index(1, 0, 0), Ok(1));
        assert_eq!(extent.index(0, 1, 0), Ok(3));
        assert_eq!(extent.index(0, 0, 1), Ok(12));
        assert_eq!(extent.index(2, 3, 4), Ok(59));

        let mut hunk = ExclusiveHunk::with_extent(extent, 0u8).unwrap();
        hunk.set(2, 1, 3, 7).unwrap();
        assert_eq!(hunk.as_slice()[3 * 12 + 3 + 2], 7);
    }

    #[test]
    fn test_out_of_bounds_every_axis() {
        let mut hunk = ExclusiveHunk::new(2, 3, 4, 0u8).unwrap();
        for (x, y, z) in [(2, 0, 0), (0, 3, 0), (0, 0, 4), (9, 9, 9)] {
            assert!(matches!(hunk.get(x, y, z), Err(HunkError::OutOfBounds { .. })));
            assert!(matches!(hunk.set(x, y, z, 1), Err(HunkError::OutOfBounds { .. })));
        }
        assert_eq!(hunk.count(|v| v != 0), 0);
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(matches!(
            ExclusiveHunk::new(0, 1, 1, 0u8),
            Err(HunkError::ZeroExtent { .. })
        ));
        assert!(AtomicHunk::new(1, 0, 1, 0u8).is_err());
    }

    #[test]
    fn test_overflowing_extent_rejected() {
        assert_eq!(Extent::new(usize::MAX, 2, 2).checked_volume(), None);
        assert_eq!(Extent::new(usize::MAX, 2, 2).volume(), usize::MAX);
        assert!(matches!(
            ExclusiveHunk::new(usize::MAX, 2, 2, 0u8),
            Err(HunkError::TooLarge { .. })
        ));
        assert!(matches!(
            AtomicHunk::new(usize::MAX / 2, 1, 1, 0u32),
            Err(HunkError::TooLarge { .. })
        ));
        assert_eq!(Extent::new(16, 64, 16).checked_volume(), Some(16 * 64 * 16));
    }

    #[test]
    fn test_modes() {
        let exclusive = ExclusiveHunk::new(1, 1, 1, 0u8).unwrap();
        let atomic = AtomicHunk::new(1, 1, 1, 0u8).unwrap();
        assert!(!exclusive.is_concurrent());
        assert!(atomic.is_concurrent());
        assert_eq!(atomic.mode(), StorageMode::Concurrent);
    }

    #[test]
    fn test_column_and_iter() {
        let mut hunk = ExclusiveHunk::new(2, 3, 2, 0u8).unwrap();
        hunk.set(1, 2, 1, 5).unwrap();
        assert_eq!(hunk.column(1, 1).unwrap(), vec![0, 0, 5]);

        let found: Vec<_> = hunk.iter().filter(|&(.., v)| v == 5).collect();
        assert_eq!(found, vec![(1, 2, 1, 5)]);
    }

    #[test]
    fn test_concurrent_writers_disjoint_columns() {
        let hunk = Arc::new(AtomicHunk::new(8, 16, 8, 0u32).unwrap());

        std::thread::scope(|scope| {
            for x in 0..8 {
                let hunk = Arc::clone(&hunk);
                scope.spawn(move || {
                    let mut writer = hunk.writer();
                    for z in 0..8 {
                        for y in 0..16 {
                            writer.put(x, y, z, (x + 1) as u32).unwrap();
                        }
                    }
                });
            }
        });

        for (x, _, _, value) in hunk.iter() {
            assert_eq!(value, (x + 1) as u32);
        }
    }

    #[test]
    fn test_concurrent_writers_overlapping_cells_never_tear() {
        let hunk = AtomicHunk::new(4, 4, 4, 0u64).unwrap();
        let patterns = [u64::MAX, 0x5555_5555_5555_5555, 0xAAAA_AAAA_AAAA_AAAA];

        std::thread::scope(|scope| {
            for pattern in patterns {
                let hunk = &hunk;
                scope.spawn(move || {
                    for _ in 0..50 {
                        for (x, y, z, _) in hunk.iter().collect::<Vec<_>>() {
                            hunk.set_shared(x, y, z, pattern).unwrap();
                        }
                    }
                });
            }
        });

        for (.., value) in hunk.iter() {
            assert!(patterns.contains(&value), "torn value {value:#x}");
        }
    }

    #[test]
    fn test_compare_exchange_single_winner() {
        let hunk = AtomicHunk::new(1, 1, 1, 0u32).unwrap();
        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=8u32)
                .map(|id| {
                    let hunk = &hunk;
                    scope.spawn(move || hunk.compare_exchange(0, 0, 0, 0, id).unwrap().is_ok())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(winners, 1);
        assert_ne!(hunk.get(0, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_into_exclusive_keeps_values() {
        let hunk = AtomicHunk::new(2, 2, 2, 1u16).unwrap();
        hunk.set_shared(1, 1, 1, 9).unwrap();
        let exclusive = hunk.into_exclusive();
        assert_eq!(exclusive.get(1, 1, 1).unwrap(), 9);
        assert_eq!(exclusive.count(|v| v == 1), 7);
    }
}
