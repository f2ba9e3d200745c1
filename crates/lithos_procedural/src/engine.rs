//! # Engine
//!
//! The shared world context: seed, dimension, sample source and biome data.
//! It is cheap to clone (everything lives behind `Arc`) and is handed to
//! every worker, which then creates its own [`TerrainActuator`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use lithos_core::AtomicHunk;
use rayon::prelude::*;

use crate::actuator::TerrainActuator;
use crate::biome::BiomeRegistry;
use crate::chunk::{ChunkCoord, ChunkHunk, CHUNK_SIZE};
use crate::dimension::Dimension;
use crate::error::{ActuateError, ActuateResult};
use crate::material::Block;
use crate::seed::WorldSeed;
use crate::source::{ColumnSampleSource, FlatSource, NoiseSource};

/// World generation context shared by all workers.
#[derive(Clone)]
pub struct Engine {
    seed: WorldSeed,
    dimension: Arc<Dimension>,
    source: Arc<dyn ColumnSampleSource>,
    biomes: Arc<BiomeRegistry>,
}

impl Engine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        seed: WorldSeed,
        dimension: Dimension,
        source: impl ColumnSampleSource + 'static,
        biomes: BiomeRegistry,
    ) -> Self {
        Self {
            seed,
            dimension: Arc::new(dimension),
            source: Arc::new(source),
            biomes: Arc::new(biomes),
        }
    }

    /// A flat world using the standard biomes.
    #[must_use]
    pub fn flat(seed: WorldSeed, dimension: Dimension, source: FlatSource) -> Self {
        Self::new(seed, dimension, source, BiomeRegistry::standard())
    }

    /// Noise terrain for `dimension` using the standard biomes.
    #[must_use]
    pub fn noise(seed: WorldSeed, dimension: Dimension) -> Self {
        let source = NoiseSource::new(seed, &dimension);
        Self::new(seed, dimension, source, BiomeRegistry::standard())
    }

    /// World seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Dimension rules.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    /// Sample source.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &dyn ColumnSampleSource {
        self.source.as_ref()
    }

    /// Biome data context.
    #[inline]
    #[must_use]
    pub fn biomes(&self) -> &BiomeRegistry {
        &self.biomes
    }

    /// Creates a fresh actuator. Each worker thread needs its own.
    #[must_use]
    pub fn actuator(&self) -> TerrainActuator {
        TerrainActuator::new(self.clone())
    }

    /// Generates one chunk with `actuator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension height is zero or actuation fails.
    pub fn generate_chunk(
        &self,
        actuator: &mut TerrainActuator,
        coord: ChunkCoord,
    ) -> ActuateResult<ChunkHunk> {
        let mut hunk = ChunkHunk::new(CHUNK_SIZE, self.dimension.height, CHUNK_SIZE, Block::AIR)?;
        actuator.actuate(coord.world_x(), coord.world_z(), &mut hunk)?;
        Ok(hunk)
    }

    /// Generates one chunk by actuating `section_size x section_size`
    /// column sections concurrently over an atomic hunk.
    ///
    /// Sections run as tasks on the rayon pool, each with its own actuator,
    /// so the result differs from [`generate_chunk`](Self::generate_chunk)
    /// wherever the RNG is consulted.
    ///
    /// # Errors
    ///
    /// Returns the first section's error, or
    /// [`ActuateError::SectionPanicked`] if a section panicked.
    pub fn generate_chunk_parallel(
        &self,
        coord: ChunkCoord,
        section_size: usize,
    ) -> ActuateResult<ChunkHunk> {
        let hunk = AtomicHunk::new(CHUNK_SIZE, self.dimension.height, CHUNK_SIZE, Block::AIR)?;
        let (origin_x, origin_z) = (coord.world_x(), coord.world_z());
        let sections: Vec<_> = hunk.regions(section_size).collect();

        panic::catch_unwind(AssertUnwindSafe(|| {
            sections.par_iter().try_for_each(|&region| {
                let mut actuator = self.actuator();
                let mut writer = hunk.writer();
                actuator.actuate_region(origin_x, origin_z, &mut writer, region)
            })
        }))
        .map_err(|_| ActuateError::SectionPanicked)??;

        Ok(hunk.into_exclusive())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("seed", &self.seed)
            .field("dimension", &self.dimension.name)
            .field("biomes", &self.biomes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::ActuatorRng;
    use crate::biome::Biome;
    use crate::error::SampleResult;

    /// Flat terrain that panics east of `x = 8`.
    struct Brittle(FlatSource);

    impl ColumnSampleSource for Brittle {
        fn height_at(&self, x: i32, z: i32) -> SampleResult<f64> {
            assert!(x < 8, "column out of range");
            self.0.height_at(x, z)
        }

        fn fluid_level_at(&self, x: i32, z: i32) -> SampleResult<f64> {
            self.0.fluid_level_at(x, z)
        }

        fn rock_material_at(&self, x: i32, y: i32, z: i32) -> Block {
            self.0.rock_material_at(x, y, z)
        }

        fn fluid_material_at(&self, x: i32, y: i32, z: i32) -> Block {
            self.0.fluid_material_at(x, y, z)
        }

        fn biome_at<'a>(
            &self,
            x: i32,
            z: i32,
            biomes: &'a BiomeRegistry,
        ) -> SampleResult<&'a dyn Biome> {
            self.0.biome_at(x, z, biomes)
        }

        fn is_carved(&self, x: i32, y: i32, z: i32, rng: &mut ActuatorRng, surface: i32) -> bool {
            self.0.is_carved(x, y, z, rng, surface)
        }

        fn undercarriage_at(&self, x: i32, z: i32) -> SampleResult<Option<f64>> {
            self.0.undercarriage_at(x, z)
        }
    }

    #[test]
    fn test_chunk_has_dimension_height() {
        let engine = Engine::flat(
            WorldSeed::new(2),
            Dimension {
                height: 96,
                ..Dimension::default()
            },
            FlatSource::default(),
        );
        let chunk = engine
            .generate_chunk(&mut engine.actuator(), ChunkCoord::new(3, -1))
            .unwrap();
        assert_eq!(chunk.height(), 96);
        assert_eq!(chunk.width(), CHUNK_SIZE);
    }

    #[test]
    fn test_parallel_matches_flat_sequential() {
        let engine = Engine::flat(WorldSeed::new(2), Dimension::default(), FlatSource::default());
        let coord = ChunkCoord::new(-4, 9);
        let sequential = engine.generate_chunk(&mut engine.actuator(), coord).unwrap();
        let parallel = engine.generate_chunk_parallel(coord, 4).unwrap();
        assert_eq!(sequential.as_slice(), parallel.as_slice());
    }

    #[test]
    fn test_parallel_section_panic_is_reported() {
        let engine = Engine::new(
            WorldSeed::new(2),
            Dimension::default(),
            Brittle(FlatSource::default()),
            BiomeRegistry::standard(),
        );
        assert!(matches!(
            engine.generate_chunk_parallel(ChunkCoord::new(0, 0), 4),
            Err(ActuateError::SectionPanicked)
        ));
        // Columns west of the panic line still generate.
        assert!(engine.generate_chunk_parallel(ChunkCoord::new(-1, 0), 4).is_ok());
    }

    #[test]
    fn test_zero_height_dimension_fails() {
        let engine = Engine::flat(
            WorldSeed::new(2),
            Dimension {
                height: 0,
                ..Dimension::default()
            },
            FlatSource::default(),
        );
        assert!(matches!(
            engine.generate_chunk(&mut engine.actuator(), ChunkCoord::new(0, 0)),
            Err(ActuateError::Hunk(_))
        ));
    }
}
