//! # Hunk Storage Strategies
//!
//! The backing memory of a hunk. Indexing and bounds checks live in
//! [`Hunk`](super::Hunk); storages only ever see valid linear indices.

use std::fmt;

use super::atomic::AtomicVoxel;

/// How a hunk's cells may be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageMode {
    /// Single writer through `&mut`.
    Exclusive,
    /// Many writers through `&`, each cell written atomically.
    Concurrent,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclusive => f.write_str("exclusive"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

/// Linear storage for hunk cells.
pub trait HunkStorage<T: Copy> {
    /// The write mode this storage supports.
    const MODE: StorageMode;

    /// Allocates `len` cells, each holding `value`.
    fn filled(len: usize, value: T) -> Self;

    /// Number of cells.
    fn len(&self) -> usize;

    /// Returns true if there are no cells.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the cell at `index`.
    fn read(&self, index: usize) -> T;

    /// Writes the cell at `index`.
    fn write(&mut self, index: usize, value: T);
}

/// Storage that may be written through a shared reference.
pub trait SharedStorage<T: Copy>: HunkStorage<T> + Sync {
    /// Atomically writes the cell at `index`.
    fn write_shared(&self, index: usize, value: T);

    /// Atomically replaces the cell at `index` if it equals `current`.
    ///
    /// # Errors
    ///
    /// Returns the actual cell value when it did not equal `current`.
    fn compare_exchange(&self, index: usize, current: T, new: T) -> Result<T, T>;
}

/// Plain boxed-slice storage for a single writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExclusiveStorage<T> {
    cells: Box<[T]>,
}

impl<T: Copy> ExclusiveStorage<T> {
    /// Returns the cells in linear order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T: Copy> HunkStorage<T> for ExclusiveStorage<T> {
    const MODE: StorageMode = StorageMode::Exclusive;

    fn filled(len: usize, value: T) -> Self {
        Self {
            cells: vec![value; len].into_boxed_slice(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn read(&self, index: usize) -> T {
        self.cells[index]
    }

    #[inline]
    fn write(&mut self, index: usize, value: T) {
        self.cells[index] = value;
    }
}

/// One atomic cell per voxel; safe for concurrent writers.
pub struct AtomicStorage<T: AtomicVoxel> {
    cells: Box<[T::Cell]>,
}

impl<T: AtomicVoxel> AtomicStorage<T> {
    /// Converts into exclusive storage, taking each cell's final value.
    #[must_use]
    pub fn into_exclusive(self) -> ExclusiveStorage<T> {
        let cells: Vec<T> = self.cells.into_vec().into_iter().map(T::into_inner).collect();
        ExclusiveStorage {
            cells: cells.into_boxed_slice(),
        }
    }
}

impl<T: AtomicVoxel> fmt::Debug for AtomicStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicStorage")
            .field("len", &self.cells.len())
            .finish()
    }
}

impl<T: AtomicVoxel> HunkStorage<T> for AtomicStorage<T> {
    const MODE: StorageMode = StorageMode::Concurrent;

    fn filled(len: usize, value: T) -> Self {
        Self {
            cells: (0..len).map(|_| T::new_cell(value)).collect(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn read(&self, index: usize) -> T {
        T::load(&self.cells[index])
    }

    #[inline]
    fn write(&mut self, index: usize, value: T) {
        T::store(&self.cells[index], value);
    }
}

impl<T: AtomicVoxel> SharedStorage<T> for AtomicStorage<T> {
    #[inline]
    fn write_shared(&self, index: usize, value: T) {
        T::store(&self.cells[index], value);
    }

    #[inline]
    fn compare_exchange(&self, index: usize, current: T, new: T) -> Result<T, T> {
        T::compare_exchange(&self.cells[index], current, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_filled() {
        let storage = ExclusiveStorage::filled(4, 9u8);
        assert_eq!(storage.as_slice(), &[9, 9, 9, 9]);
        assert_eq!(<ExclusiveStorage<u8> as HunkStorage<u8>>::MODE, StorageMode::Exclusive);
    }

    #[test]
    fn test_atomic_into_exclusive() {
        let mut storage = AtomicStorage::filled(3, 0u32);
        storage.write(1, 5);
        storage.write_shared(2, 6);
        assert_eq!(storage.into_exclusive().as_slice(), &[0, 5, 6]);
    }
}
