//! # Headless Generation
//!
//! Runs the engine with no world attached. Each chunk is actuated into a
//! fresh hunk, measured, and dropped. Useful for throughput measurement and
//! for warming caches ahead of a real run.
//!
//! Actuators are checked out of an [`ActuatorPool`] so concurrent calls never
//! share one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lithos_procedural::{Block, ChunkCoord, ChunkHunk, Engine, TerrainActuator};
use parking_lot::Mutex;

use super::{GenerationMethod, Generated, SkipReason};
use crate::error::MethodResult;
use crate::task::WorldIdentity;

/// Free-list pool of actuators.
///
/// Holds up to `capacity` idle actuators. A loan takes an idle one or
/// creates a fresh one; a returned actuator is kept only while the pool is
/// below capacity.
pub struct ActuatorPool {
    engine: Engine,
    free: Mutex<Vec<TerrainActuator>>,
    capacity: usize,
    created: AtomicU64,
}

impl ActuatorPool {
    /// Creates a pool with `capacity` actuators ready to hand out.
    #[must_use]
    pub fn new(engine: Engine, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let free = (0..capacity).map(|_| engine.actuator()).collect();
        Self {
            engine,
            free: Mutex::new(free),
            capacity,
            created: AtomicU64::new(capacity as u64),
        }
    }

    /// Runs `f` with an actuator on loan from the pool.
    pub fn with_actuator<R>(&self, f: impl FnOnce(&mut TerrainActuator) -> R) -> R {
        let mut actuator = self.free.lock().pop().unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            self.engine.actuator()
        });
        let out = f(&mut actuator);
        self.checkin(actuator);
        out
    }

    /// Idle actuators.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Most idle actuators kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Actuators created over the pool's lifetime.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    fn checkin(&self, actuator: TerrainActuator) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(actuator);
        }
    }
}

/// Headless method settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Concurrency reported to the scheduler (and pool capacity).
    pub threads: usize,
    /// Chebyshev radius of the world border in chunks; `None` for no border.
    pub border_radius: Option<u32>,
    /// Border center.
    pub border_center: ChunkCoord,
    /// Actuate each chunk in concurrent sections.
    pub parallel_sections: bool,
    /// Section edge length in columns.
    pub section_size: usize,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            border_radius: None,
            border_center: ChunkCoord::new(0, 0),
            parallel_sections: false,
            section_size: 8,
        }
    }
}

/// Counters of what the headless method produced.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    /// Chunks generated.
    pub chunks: AtomicU64,
    /// Voxels written (chunk volume sum).
    pub voxels: AtomicU64,
    /// Voxels that are not air.
    pub solid_voxels: AtomicU64,
}

impl HeadlessStats {
    fn record(&self, chunk: &ChunkHunk) {
        let solid = chunk.count(|b| b != Block::AIR) as u64;
        self.chunks.fetch_add(1, Ordering::Relaxed);
        self.voxels
            .fetch_add(chunk.extent().volume() as u64, Ordering::Relaxed);
        self.solid_voxels.fetch_add(solid, Ordering::Relaxed);
    }
}

/// In-memory generation with no world attached.
pub struct HeadlessMethod {
    identity: WorldIdentity,
    engine: Engine,
    pool: ActuatorPool,
    config: HeadlessConfig,
    done: Mutex<HashSet<ChunkCoord>>,
    stats: Arc<HeadlessStats>,
}

impl HeadlessMethod {
    /// Creates a headless method for the world `name` driven by `engine`.
    #[must_use]
    pub fn new(name: impl Into<String>, engine: Engine, config: HeadlessConfig) -> Self {
        let identity = WorldIdentity::new(name, engine.seed());
        let pool = ActuatorPool::new(engine.clone(), config.threads);
        Self {
            identity,
            engine,
            pool,
            config,
            done: Mutex::new(HashSet::new()),
            stats: Arc::new(HeadlessStats::default()),
        }
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<HeadlessStats> {
        Arc::clone(&self.stats)
    }

    /// The actuator pool.
    #[must_use]
    pub const fn pool(&self) -> &ActuatorPool {
        &self.pool
    }

    /// Returns true if `coord` has been generated by this method.
    #[must_use]
    pub fn is_generated(&self, coord: ChunkCoord) -> bool {
        self.done.lock().contains(&coord)
    }

    fn in_border(&self, coord: ChunkCoord) -> bool {
        self.config
            .border_radius
            .map_or(true, |r| coord.ring_distance(self.config.border_center) <= r)
    }
}

impl GenerationMethod for HeadlessMethod {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn identity(&self) -> &WorldIdentity {
        &self.identity
    }

    fn concurrency(&self) -> usize {
        self.config.threads.max(1)
    }

    fn generate(&self, coord: ChunkCoord) -> MethodResult<Generated> {
        if !self.in_border(coord) {
            return Ok(Generated::Skipped(SkipReason::OutsideBorder));
        }
        if self.is_generated(coord) {
            return Ok(Generated::Skipped(SkipReason::AlreadyGenerated));
        }

        let chunk = if self.config.parallel_sections {
            self.engine
                .generate_chunk_parallel(coord, self.config.section_size)?
        } else {
            self.pool
                .with_actuator(|actuator| self.engine.generate_chunk(actuator, coord))?
        };

        self.stats.record(&chunk);
        self.done.lock().insert(coord);
        tracing::trace!(%coord, "headless chunk generated");

        Ok(Generated::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_procedural::{Dimension, FlatSource, WorldSeed};

    fn engine() -> Engine {
        Engine::flat(WorldSeed::new(3), Dimension::default(), FlatSource::default())
    }

    #[test]
    fn test_pool_reuses_actuators() {
        let pool = ActuatorPool::new(engine(), 2);
        pool.with_actuator(|_| {
            pool.with_actuator(|_| {
                pool.with_actuator(|_| assert_eq!(pool.available(), 0));
            });
        });
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.created(), 3);

        pool.with_actuator(|_| ());
        assert_eq!(pool.created(), 3);
    }

    #[test]
    fn test_skips_repeat_and_border() {
        let method = HeadlessMethod::new(
            "w",
            engine(),
            HeadlessConfig {
                border_radius: Some(1),
                ..HeadlessConfig::default()
            },
        );
        assert_eq!(method.generate(ChunkCoord::new(1, -1)), Ok(Generated::Success));
        assert_eq!(
            method.generate(ChunkCoord::new(1, -1)),
            Ok(Generated::Skipped(SkipReason::AlreadyGenerated))
        );
        assert_eq!(
            method.generate(ChunkCoord::new(2, 0)),
            Ok(Generated::Skipped(SkipReason::OutsideBorder))
        );
        assert_eq!(method.stats().chunks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_stats_count_solid_voxels() {
        let method = HeadlessMethod::new(
            "w",
            engine(),
            HeadlessConfig {
                parallel_sections: true,
                section_size: 4,
                ..HeadlessConfig::default()
            },
        );
        method.generate(ChunkCoord::new(0, 0)).unwrap();

        let stats = method.stats();
        assert_eq!(stats.voxels.load(Ordering::Relaxed), 16 * 256 * 16);
        assert_eq!(stats.solid_voxels.load(Ordering::Relaxed), 16 * 65 * 16);
    }
}
