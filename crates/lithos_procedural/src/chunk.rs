//! # Chunk Coordinates
//!
//! The world is partitioned into 16x16-column chunks; chunks are grouped
//! into 32x32-chunk regions, the usual unit of region files on disk.
//!
//! A chunk's voxels are held in a [`ChunkHunk`] sized
//! `CHUNK_SIZE x dimension height x CHUNK_SIZE`.

use lithos_core::ExclusiveHunk;

use crate::material::Block;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Region width/depth in chunks.
pub const REGION_SIZE: i32 = 32;

/// A generated chunk's voxels.
pub type ChunkHunk = ExclusiveHunk<Block>;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to the containing chunk.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_SIZE as i32),
            z: block_z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World X of the chunk's origin column.
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE as i32
    }

    /// World Z of the chunk's origin column.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE as i32
    }

    /// The region containing this chunk, in region coordinates.
    #[inline]
    #[must_use]
    pub const fn region(self) -> (i32, i32) {
        (self.x.div_euclid(REGION_SIZE), self.z.div_euclid(REGION_SIZE))
    }

    /// Chebyshev (ring) distance to another chunk.
    #[inline]
    #[must_use]
    pub const fn ring_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        if dx > dz {
            dx
        } else {
            dz
        }
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from((x, z): (i32, i32)) -> Self {
        Self::new(x, z)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
