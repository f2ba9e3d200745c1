//! # Materials
//!
//! The voxel value written by the terrain actuator.
//!
//! A block is a packed `{ id, meta }` pair; it fits one `AtomicU32`, so
//! chunk hunks can use either storage mode.

use std::sync::atomic::AtomicU32;

use bytemuck::{Pod, Zeroable};
use lithos_core::packed_atomic_voxel;
use serde::{Deserialize, Serialize};

/// A single block in the world.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Block {
    /// Block type ID.
    pub id: u16,
    /// Block metadata (variant, orientation, etc.).
    #[serde(default)]
    pub meta: u16,
}

packed_atomic_voxel!(Block, u32, AtomicU32);

impl Block {
    /// Air block (empty).
    pub const AIR: Self = Self::new(0);
    /// Grass block.
    pub const GRASS: Self = Self::new(1);
    /// Stone block.
    pub const STONE: Self = Self::new(2);
    /// Dirt block.
    pub const DIRT: Self = Self::new(3);
    /// Bedrock block.
    pub const BEDROCK: Self = Self::new(7);
    /// Water block.
    pub const WATER: Self = Self::new(10);
    /// Sand block.
    pub const SAND: Self = Self::new(11);
    /// Gravel block.
    pub const GRAVEL: Self = Self::new(13);
    /// Snow block.
    pub const SNOW: Self = Self::new(14);
    /// Lava block.
    pub const LAVA: Self = Self::new(15);

    /// Creates a block with the given ID.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self { id, meta: 0 }
    }

    /// Creates a block with ID and metadata.
    #[inline]
    #[must_use]
    pub const fn with_meta(id: u16, meta: u16) -> Self {
        Self { id, meta }
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }
}
