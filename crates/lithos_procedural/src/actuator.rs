//! # Terrain Actuator
//!
//! Fills a hunk with terrain, one (x, z) column at a time.
//!
//! For each column the actuator resolves four levels from the sample source:
//!
//! | level | source |
//! |-------|--------|
//! | floor | undercarriage sample, or 0 without an undercarriage |
//! | surface | height sample, capped at the hunk height |
//! | fluid ceiling | fluid level, never below the surface |
//! | biome | biome sample |
//!
//! It then walks from the fluid ceiling down to the floor. The floor voxel is
//! bedrock when the dimension asks for it; carved voxels are left untouched;
//! voxels above the surface are fluid; everything else is the biome layer at
//! that depth, or rock once the layers run out.
//!
//! ## Threading
//!
//! The actuator owns a ChaCha RNG seeded from the world seed. It is not
//! shared: every worker creates its own with [`Engine::actuator`].

use std::time::Instant;

use lithos_core::{ColumnRegion, HunkError, VoxelSink};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::engine::Engine;
use crate::error::{ActuateResult, SampleError, SampleResult};
use crate::material::Block;

/// RNG type owned by each actuator.
pub type ActuatorRng = ChaCha8Rng;

/// Seed stream reserved for actuator RNGs.
const ACTUATOR_STREAM: u64 = 0xAC7;

/// Rounds half-way values up (`floor(v + 0.5)`).
///
/// Values beyond the `i32` range saturate.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn finite(what: &'static str, value: f64, x: i32, z: i32) -> SampleResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SampleError::NonFinite { what, x, z })
    }
}

/// Column-by-column terrain writer.
pub struct TerrainActuator {
    engine: Engine,
    rng: ActuatorRng,
    has_undercarriage: bool,
}

impl TerrainActuator {
    /// Creates an actuator for `engine`, seeding its RNG from the world seed.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        let rng = ActuatorRng::seed_from_u64(engine.seed().derive(ACTUATOR_STREAM).value());
        let has_undercarriage = engine.dimension().has_undercarriage();
        Self {
            engine,
            rng,
            has_undercarriage,
        }
    }

    /// The engine this actuator samples from.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Actuates every column of `sink`, whose local (0, 0) column sits at
    /// world `(origin_x, origin_z)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a sample fails or a write falls outside `sink`.
    pub fn actuate<K>(&mut self, origin_x: i32, origin_z: i32, sink: &mut K) -> ActuateResult<()>
    where
        K: VoxelSink<Block> + ?Sized,
    {
        let region = ColumnRegion::full(sink.extent());
        self.actuate_region(origin_x, origin_z, sink, region)
    }

    /// Actuates the columns of `region` only.
    ///
    /// # Errors
    ///
    /// Returns [`HunkError::OutOfBounds`] if the region does not fit the sink,
    /// or the sample source's error.
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn actuate_region<K>(
        &mut self,
        origin_x: i32,
        origin_z: i32,
        sink: &mut K,
        region: ColumnRegion,
    ) -> ActuateResult<()>
    where
        K: VoxelSink<Block> + ?Sized,
    {
        let extent = sink.extent();
        if !region.fits(extent) {
            return Err(HunkError::OutOfBounds {
                x: region.x + region.width.saturating_sub(1),
                y: 0,
                z: region.z + region.depth.saturating_sub(1),
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
            }
            .into());
        }

        let start = Instant::now();
        let top = extent.height.saturating_sub(1) as i32;
        #[allow(clippy::cast_precision_loss)]
        let buffer_height = extent.height as f64;

        let Self {
            engine,
            rng,
            has_undercarriage,
        } = self;
        let source = engine.source();
        let biomes = engine.biomes();
        let bedrock = engine.dimension().bedrock;

        for (xf, zf) in region.columns() {
            let real_x = origin_x + xf as i32;
            let real_z = origin_z + zf as i32;

            // Unclamped: a floor above the buffer must still skip the column.
            let mut floor_level = 0;
            if *has_undercarriage {
                if let Some(level) = source.undercarriage_at(real_x, real_z)? {
                    let level = finite("undercarriage", level, real_x, real_z)?;
                    floor_level = round_half_up(level);
                }
            }

            let height = finite("height", source.height_at(real_x, real_z)?, real_x, real_z)?;
            let surface = round_half_up(height.min(buffer_height)).clamp(0, top);

            let fluid = finite("fluid", source.fluid_level_at(real_x, real_z)?, real_x, real_z)?;
            let fluid_ceiling =
                round_half_up(fluid.min(buffer_height).max(f64::from(surface))).clamp(0, top);

            let biome = source.biome_at(real_x, real_z, biomes)?;

            if fluid_ceiling < floor_level {
                continue;
            }
            let floor = floor_level.max(0);

            let mut layers: Option<Vec<Block>> = None;

            for y in (floor..=fluid_ceiling).rev() {
                let value = if y == floor && bedrock {
                    Block::BEDROCK
                } else if source.is_carved(real_x, y, real_z, rng, surface) {
                    continue;
                } else if y > surface {
                    source.fluid_material_at(real_x, y, real_z)
                } else {
                    let depth = (surface - y) as usize;
                    let layers = layers.get_or_insert_with(|| {
                        biome.generate_layers(real_x, real_z, rng, surface, surface, biomes)
                    });
                    match layers.get(depth) {
                        Some(block) => *block,
                        None => source.rock_material_at(real_x, y, real_z),
                    }
                };

                sink.put(xf, y as usize, zf, value)?;
            }
        }

        tracing::trace!(
            origin_x,
            origin_z,
            columns = region.column_count(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "actuated terrain"
        );

        Ok(())
    }
}

impl std::fmt::Debug for TerrainActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainActuator")
            .field("seed", &self.engine.seed())
            .field("has_undercarriage", &self.has_undercarriage)
            .finish_non_exhaustive()
    }
}
