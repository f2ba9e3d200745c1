//! # Live Worlds
//!
//! The platform side of the Hybrid method. A [`WorldHandle`] is owned by a
//! single write thread; every call happens there.
//!
//! [`MemoryWorld`] is an in-memory platform backed by an engine. It keeps
//! generated chunks in a map, optionally enforces a world border, and
//! remembers which threads wrote to it. A [`WorldView`] reads its contents
//! from other threads.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lithos_procedural::{Block, ChunkCoord, ChunkHunk, Engine, TerrainActuator};
use parking_lot::{Mutex, RwLock};

use crate::error::{MethodError, MethodResult};
use crate::task::WorldIdentity;

/// A live world that chunks can be generated into.
pub trait WorldHandle: Send {
    /// The world's identity.
    fn identity(&self) -> WorldIdentity;

    /// Returns true if `coord` lies inside the world border.
    fn in_border(&self, coord: ChunkCoord) -> bool;

    /// Returns true if `coord` already exists.
    fn is_generated(&self, coord: ChunkCoord) -> bool;

    /// Generates and stores the chunk at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::Commit`] if the world refuses the write, or the
    /// actuation error.
    fn generate_chunk(&mut self, coord: ChunkCoord) -> MethodResult<()>;
}

#[derive(Default)]
struct Stored {
    chunks: RwLock<HashMap<ChunkCoord, ChunkHunk>>,
    writers: Mutex<HashSet<String>>,
}

/// Read access to a [`MemoryWorld`] from any thread.
#[derive(Clone)]
pub struct WorldView {
    stored: Arc<Stored>,
}

impl WorldView {
    /// Number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stored.chunks.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `coord` is stored.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.stored.chunks.read().contains_key(&coord)
    }

    /// Reads one block of a stored chunk, local coordinates.
    #[must_use]
    pub fn block(&self, coord: ChunkCoord, x: usize, y: usize, z: usize) -> Option<Block> {
        self.stored
            .chunks
            .read()
            .get(&coord)
            .and_then(|chunk| chunk.get(x, y, z).ok())
    }

    /// Names of every thread that stored a chunk.
    #[must_use]
    pub fn writer_threads(&self) -> HashSet<String> {
        self.stored.writers.lock().clone()
    }
}

/// Engine-backed in-memory world.
pub struct MemoryWorld {
    identity: WorldIdentity,
    engine: Engine,
    actuator: TerrainActuator,
    border: Option<(ChunkCoord, u32)>,
    locked: HashSet<ChunkCoord>,
    stored: Arc<Stored>,
}

impl MemoryWorld {
    /// Creates an empty world named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, engine: Engine) -> Self {
        Self {
            identity: WorldIdentity::new(name, engine.seed()),
            actuator: engine.actuator(),
            engine,
            border: None,
            locked: HashSet::new(),
            stored: Arc::new(Stored::default()),
        }
    }

    /// Limits the world to chunks within `radius` (Chebyshev) of `center`.
    #[must_use]
    pub fn with_border(mut self, center: ChunkCoord, radius: u32) -> Self {
        self.border = Some((center, radius));
        self
    }

    /// Marks chunks as protected; writes to them fail.
    #[must_use]
    pub fn with_locked(mut self, coords: impl IntoIterator<Item = ChunkCoord>) -> Self {
        self.locked.extend(coords);
        self
    }

    /// A reader for this world's contents.
    #[must_use]
    pub fn view(&self) -> WorldView {
        WorldView {
            stored: Arc::clone(&self.stored),
        }
    }
}

impl WorldHandle for MemoryWorld {
    fn identity(&self) -> WorldIdentity {
        self.identity.clone()
    }

    fn in_border(&self, coord: ChunkCoord) -> bool {
        self.border
            .map_or(true, |(center, radius)| coord.ring_distance(center) <= radius)
    }

    fn is_generated(&self, coord: ChunkCoord) -> bool {
        self.stored.chunks.read().contains_key(&coord)
    }

    fn generate_chunk(&mut self, coord: ChunkCoord) -> MethodResult<()> {
        if self.locked.contains(&coord) {
            return Err(MethodError::Commit {
                coord,
                reason: "chunk is protected".to_string(),
            });
        }

        let chunk = self.engine.generate_chunk(&mut self.actuator, coord)?;
        self.stored.chunks.write().insert(coord, chunk);

        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        let mut writers = self.stored.writers.lock();
        if !writers.contains(name) {
            writers.insert(name.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_procedural::{Dimension, FlatSource, WorldSeed};

    fn world() -> MemoryWorld {
        let engine = Engine::flat(WorldSeed::new(8), Dimension::default(), FlatSource::default());
        MemoryWorld::new("mem", engine)
    }

    #[test]
    fn test_generate_stores_chunk() {
        let mut world = world();
        let view = world.view();
        world.generate_chunk(ChunkCoord::new(1, 2)).unwrap();

        assert!(world.is_generated(ChunkCoord::new(1, 2)));
        assert_eq!(view.len(), 1);
        assert_eq!(view.block(ChunkCoord::new(1, 2), 0, 64, 0), Some(Block::GRASS));
        assert_eq!(view.block(ChunkCoord::new(0, 0), 0, 64, 0), None);
    }

    #[test]
    fn test_border_and_locks() {
        let mut world = world()
            .with_border(ChunkCoord::new(0, 0), 2)
            .with_locked([ChunkCoord::new(1, 1)]);
        assert!(world.in_border(ChunkCoord::new(-2, 2)));
        assert!(!world.in_border(ChunkCoord::new(3, 0)));
        assert!(matches!(
            world.generate_chunk(ChunkCoord::new(1, 1)),
            Err(MethodError::Commit { .. })
        ));
    }
}
