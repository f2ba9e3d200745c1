//! # Atomic Voxel Cells
//!
//! Maps a voxel value type onto a lock-free atomic cell.
//!
//! Integer voxels map directly onto the matching `std::sync::atomic` type.
//! Plain-old-data voxels (for example a packed `{ id, meta }` block) map onto
//! an atomic integer of the same size through [`packed_atomic_voxel!`].

use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

/// A voxel value that can live in a lock-free atomic cell.
///
/// Every operation acts on exactly one cell. Readers never observe a torn
/// value: a load returns either the previous or the new value of a store.
pub trait AtomicVoxel: Copy + PartialEq + Send + Sync + 'static {
    /// The atomic cell type backing one voxel.
    type Cell: Send + Sync;

    /// Creates a cell holding `value`.
    fn new_cell(value: Self) -> Self::Cell;

    /// Loads the current value of a cell.
    fn load(cell: &Self::Cell) -> Self;

    /// Stores `value` into a cell.
    fn store(cell: &Self::Cell, value: Self);

    /// Replaces the cell value with `new` if it currently equals `current`.
    ///
    /// # Errors
    ///
    /// Returns the actual value if it did not equal `current`.
    fn compare_exchange(cell: &Self::Cell, current: Self, new: Self) -> Result<Self, Self>;

    /// Consumes a cell, returning its value.
    fn into_inner(cell: Self::Cell) -> Self;
}

macro_rules! integer_atomic_voxel {
    ($($int:ty => $atomic:ty),* $(,)?) => {
        $(
            impl AtomicVoxel for $int {
                type Cell = $atomic;

                #[inline]
                fn new_cell(value: Self) -> Self::Cell {
                    <$atomic>::new(value)
                }

                #[inline]
                fn load(cell: &Self::Cell) -> Self {
                    cell.load(Ordering::Acquire)
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self) {
                    cell.store(value, Ordering::Release);
                }

                #[inline]
                fn compare_exchange(
                    cell: &Self::Cell,
                    current: Self,
                    new: Self,
                ) -> Result<Self, Self> {
                    cell.compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
                }

                #[inline]
                fn into_inner(cell: Self::Cell) -> Self {
                    cell.into_inner()
                }
            }
        )*
    };
}

integer_atomic_voxel! {
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
}

/// Implements [`AtomicVoxel`] for a `Pod` type by packing it into an atomic
/// integer of identical size.
///
/// ```rust
/// use lithos_core::{bytemuck, packed_atomic_voxel};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
/// #[repr(C)]
/// struct Cell { id: u16, meta: u16 }
///
/// packed_atomic_voxel!(Cell, u32, std::sync::atomic::AtomicU32);
/// ```
#[macro_export]
macro_rules! packed_atomic_voxel {
    ($ty:ty, $bits:ty, $atomic:ty) => {
        impl $crate::AtomicVoxel for $ty {
            type Cell = $atomic;

            #[inline]
            fn new_cell(value: Self) -> Self::Cell {
                <$atomic>::new($crate::bytemuck::cast::<$ty, $bits>(value))
            }

            #[inline]
            fn load(cell: &Self::Cell) -> Self {
                $crate::bytemuck::cast::<$bits, $ty>(cell.load(::std::sync::atomic::Ordering::Acquire))
            }

            #[inline]
            fn store(cell: &Self::Cell, value: Self) {
                cell.store(
                    $crate::bytemuck::cast::<$ty, $bits>(value),
                    ::std::sync::atomic::Ordering::Release,
                );
            }

            #[inline]
            fn compare_exchange(cell: &Self::Cell, current: Self, new: Self) -> Result<Self, Self> {
                cell.compare_exchange(
                    $crate::bytemuck::cast::<$ty, $bits>(current),
                    $crate::bytemuck::cast::<$ty, $bits>(new),
                    ::std::sync::atomic::Ordering::AcqRel,
                    ::std::sync::atomic::Ordering::Acquire,
                )
                .map($crate::bytemuck::cast::<$bits, $ty>)
                .map_err($crate::bytemuck::cast::<$bits, $ty>)
            }

            #[inline]
            fn into_inner(cell: Self::Cell) -> Self {
                $crate::bytemuck::cast::<$bits, $ty>(cell.into_inner())
            }
        }
    };
}
