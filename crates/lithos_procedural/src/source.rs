//! # Column Sample Sources
//!
//! The actuator never evaluates noise itself. Everything it needs about a
//! column (surface height, fluid level, biome, rock, carving, floor) comes
//! from a [`ColumnSampleSource`].
//!
//! Two sources ship with the crate:
//!
//! - [`FlatSource`]: constant samples, for tests and superflat worlds
//! - [`NoiseSource`]: fractal terrain with a temperature/humidity climate
//!   model picking biomes, 3D cave noise and a noisy undercarriage

use crate::actuator::ActuatorRng;
use crate::biome::{Biome, BiomeRegistry};
use crate::dimension::{CaveConfig, Dimension, Undercarriage};
use crate::error::{SampleError, SampleResult};
use crate::material::Block;
use crate::seed::{Field2, Field3, WorldSeed};

/// Per-column samples consumed by the terrain actuator.
///
/// Implementations are shared read-only between worker threads.
pub trait ColumnSampleSource: Send + Sync {
    /// Terrain surface height at world `(x, z)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] if the sample cannot be produced.
    fn height_at(&self, x: i32, z: i32) -> SampleResult<f64>;

    /// Fluid level at world `(x, z)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] if the sample cannot be produced.
    fn fluid_level_at(&self, x: i32, z: i32) -> SampleResult<f64>;

    /// Material used below the biome layers.
    fn rock_material_at(&self, x: i32, y: i32, z: i32) -> Block;

    /// Material used between the surface and the fluid level.
    fn fluid_material_at(&self, x: i32, y: i32, z: i32) -> Block;

    /// Biome of the column, chosen from `biomes`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::UnknownBiome`] if the chosen key is missing.
    fn biome_at<'a>(&self, x: i32, z: i32, biomes: &'a BiomeRegistry)
        -> SampleResult<&'a dyn Biome>;

    /// Returns true if the voxel should be left untouched (a cave).
    fn is_carved(&self, x: i32, y: i32, z: i32, rng: &mut ActuatorRng, surface: i32) -> bool;

    /// Floor level of the column, or `None` for a floor at 0.
    ///
    /// Only consulted when the dimension has a non-flat undercarriage.
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] if the sample cannot be produced.
    fn undercarriage_at(&self, x: i32, z: i32) -> SampleResult<Option<f64>>;
}

/// Constant samples everywhere.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatSource {
    /// Surface height.
    pub surface: f64,
    /// Fluid level.
    pub fluid_level: f64,
    /// Rock material.
    pub rock: Block,
    /// Fluid material.
    pub fluid: Block,
    /// Biome key looked up in the registry.
    pub biome: String,
    /// Floor level when the dimension has an undercarriage.
    pub floor: Option<f64>,
}

impl Default for FlatSource {
    fn default() -> Self {
        Self {
            surface: 64.0,
            fluid_level: 0.0,
            rock: Block::STONE,
            fluid: Block::WATER,
            biome: "meadow".to_string(),
            floor: None,
        }
    }
}

impl FlatSource {
    /// A flat world with its surface at `surface`.
    #[must_use]
    pub fn at(surface: f64) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }
}

impl ColumnSampleSource for FlatSource {
    fn height_at(&self, _x: i32, _z: i32) -> SampleResult<f64> {
        Ok(self.surface)
    }

    fn fluid_level_at(&self, _x: i32, _z: i32) -> SampleResult<f64> {
        Ok(self.fluid_level)
    }

    fn rock_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        self.rock
    }

    fn fluid_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        self.fluid
    }

    fn biome_at<'a>(
        &self,
        _x: i32,
        _z: i32,
        biomes: &'a BiomeRegistry,
    ) -> SampleResult<&'a dyn Biome> {
        biomes
            .get(&self.biome)
            .ok_or_else(|| SampleError::UnknownBiome(self.biome.clone()))
    }

    fn is_carved(&self, _x: i32, _y: i32, _z: i32, _rng: &mut ActuatorRng, _surface: i32) -> bool {
        false
    }

    fn undercarriage_at(&self, _x: i32, _z: i32) -> SampleResult<Option<f64>> {
        Ok(self.floor)
    }
}

/// Fractal terrain driven by the world seed.
///
/// Heights are `base_height + amplitude * elevation`, where elevation is an
/// fBm field in roughly [-1, 1]. Biomes follow a small climate model:
///
/// - below the fluid level: `ocean`
/// - high and cold: `snowy_peaks`, high: `mountains`
/// - hot and dry: `desert`
/// - otherwise `plains`
pub struct NoiseSource {
    elevation: Field2,
    temperature: Field2,
    humidity: Field2,
    caves: Option<(CaveConfig, Field3)>,
    floor: Option<(Undercarriage, Field2)>,
    base_height: f64,
    amplitude: f64,
    fluid_height: f64,
    rock: Block,
    fluid: Block,
}

impl NoiseSource {
    const TEMPERATURE_FREQUENCY: f64 = 0.002;
    const HUMIDITY_FREQUENCY: f64 = 0.003;
    const ELEVATION_FREQUENCY: f64 = 0.005;

    /// Creates a source for `dimension`.
    #[must_use]
    pub fn new(seed: WorldSeed, dimension: &Dimension) -> Self {
        Self {
            elevation: Field2::new(seed.derive(1), 5, Self::ELEVATION_FREQUENCY),
            temperature: Field2::new(seed.derive(2), 2, Self::TEMPERATURE_FREQUENCY),
            humidity: Field2::new(seed.derive(3), 2, Self::HUMIDITY_FREQUENCY),
            caves: dimension
                .caves
                .clone()
                .map(|caves| {
                    let field = Field3::new(seed.derive(4), 2, caves.frequency);
                    (caves, field)
                }),
            floor: dimension.undercarriage.clone().map(|under| {
                let field = Field2::new(seed.derive(5), 2, under.frequency);
                (under, field)
            }),
            base_height: dimension.fluid_height + 6.0,
            amplitude: 40.0,
            fluid_height: dimension.fluid_height,
            rock: Block::STONE,
            fluid: Block::WATER,
        }
    }

    /// Overrides the terrain shape.
    #[must_use]
    pub const fn with_terrain(mut self, base_height: f64, amplitude: f64) -> Self {
        self.base_height = base_height;
        self.amplitude = amplitude;
        self
    }

    fn elevation(&self, x: i32, z: i32) -> f64 {
        self.elevation.sample(x, z).clamp(-1.0, 1.0)
    }

    fn biome_key(&self, x: i32, z: i32) -> &'static str {
        let elevation = self.elevation(x, z);
        if self.base_height + self.amplitude * elevation < self.fluid_height {
            return "ocean";
        }

        let temperature = self.temperature.sample(x, z) - elevation.max(0.0) * 0.5;
        let humidity = self.humidity.sample(x, z);

        if elevation > 0.55 {
            if temperature < -0.1 {
                "snowy_peaks"
            } else {
                "mountains"
            }
        } else if temperature > 0.25 && humidity < -0.1 {
            "desert"
        } else {
            "plains"
        }
    }
}

impl ColumnSampleSource for NoiseSource {
    fn height_at(&self, x: i32, z: i32) -> SampleResult<f64> {
        Ok(self.base_height + self.amplitude * self.elevation(x, z))
    }

    fn fluid_level_at(&self, _x: i32, _z: i32) -> SampleResult<f64> {
        Ok(self.fluid_height)
    }

    fn rock_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        self.rock
    }

    fn fluid_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        self.fluid
    }

    fn biome_at<'a>(
        &self,
        x: i32,
        z: i32,
        biomes: &'a BiomeRegistry,
    ) -> SampleResult<&'a dyn Biome> {
        let key = self.biome_key(x, z);
        biomes
            .get(key)
            .ok_or_else(|| SampleError::UnknownBiome(key.to_string()))
    }

    fn is_carved(&self, x: i32, y: i32, z: i32, _rng: &mut ActuatorRng, surface: i32) -> bool {
        match &self.caves {
            Some((config, field)) if config.in_band(y, surface) => {
                field.sample(x, y, z) > config.threshold
            }
            _ => false,
        }
    }

    fn undercarriage_at(&self, x: i32, z: i32) -> SampleResult<Option<f64>> {
        Ok(self
            .floor
            .as_ref()
            .map(|(under, field)| under.level(field.sample(x, z))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_source_unknown_biome() {
        let source = FlatSource {
            biome: "void".to_string(),
            ..FlatSource::default()
        };
        let err = source.biome_at(0, 0, &BiomeRegistry::standard()).err();
        assert_eq!(err, Some(SampleError::UnknownBiome("void".to_string())));
    }

    #[test]
    fn test_noise_source_is_deterministic() {
        let dimension = Dimension {
            caves: Some(CaveConfig::default()),
            ..Dimension::default()
        };
        let a = NoiseSource::new(WorldSeed::new(5), &dimension);
        let b = NoiseSource::new(WorldSeed::new(5), &dimension);
        let biomes = BiomeRegistry::standard();

        for i in -20..20 {
            let (x, z) = (i * 37, i * -11);
            assert_eq!(
                a.height_at(x, z).unwrap().to_bits(),
                b.height_at(x, z).unwrap().to_bits()
            );
            assert_eq!(
                a.biome_at(x, z, &biomes).unwrap().key(),
                b.biome_at(x, z, &biomes).unwrap().key()
            );
        }
    }

    #[test]
    fn test_noise_heights_stay_in_range() {
        let source = NoiseSource::new(WorldSeed::new(1), &Dimension::default())
            .with_terrain(100.0, 20.0);
        for i in 0..200 {
            let h = source.height_at(i * 7, i * 3).unwrap();
            assert!((80.0..=120.0).contains(&h));
        }
    }

    #[test]
    fn test_caves_respect_cover() {
        let dimension = Dimension {
            caves: Some(CaveConfig {
                threshold: -2.0,
                ..CaveConfig::default()
            }),
            ..Dimension::default()
        };
        let source = NoiseSource::new(WorldSeed::new(3), &dimension);
        let mut rng = <ActuatorRng as rand::SeedableRng>::seed_from_u64(0);

        assert!(source.is_carved(0, 30, 0, &mut rng, 64));
        assert!(!source.is_carved(0, 60, 0, &mut rng, 64));
        assert!(!source.is_carved(0, 2, 0, &mut rng, 64));
    }
}
