//! # Biomes
//!
//! A biome decides what lies beneath a column's surface. The actuator asks
//! it once per column for a layer sequence indexed by depth (0 is the
//! surface voxel); anything deeper than the sequence is rock.
//!
//! Biomes are looked up by key in a [`BiomeRegistry`], which is also the data
//! context handed to [`Biome::generate_layers`].

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorRng;
use crate::material::Block;

/// Sub-surface layer provider.
pub trait Biome: Send + Sync {
    /// Registry key.
    fn key(&self) -> &str;

    /// Produces the layer sequence for the column at world `(x, z)`.
    ///
    /// Index 0 is the surface voxel. The sequence may be shorter than
    /// `max_depth + 1`; missing depths fall through to rock.
    fn generate_layers(
        &self,
        x: i32,
        z: i32,
        rng: &mut ActuatorRng,
        max_depth: i32,
        height: i32,
        data: &BiomeRegistry,
    ) -> Vec<Block>;
}

/// One band of a layered biome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeLayer {
    /// Material of the band.
    pub material: Block,
    /// Minimum thickness in voxels.
    #[serde(default = "BiomeLayer::default_thickness")]
    pub min_thickness: u32,
    /// Maximum thickness in voxels (inclusive).
    #[serde(default = "BiomeLayer::default_thickness")]
    pub max_thickness: u32,
}

impl BiomeLayer {
    /// A band of exactly `thickness` voxels.
    #[must_use]
    pub const fn fixed(material: Block, thickness: u32) -> Self {
        Self {
            material,
            min_thickness: thickness,
            max_thickness: thickness,
        }
    }

    /// A band whose thickness is drawn from `min..=max`.
    #[must_use]
    pub const fn ranged(material: Block, min: u32, max: u32) -> Self {
        Self {
            material,
            min_thickness: min,
            max_thickness: max,
        }
    }

    const fn default_thickness() -> u32 {
        1
    }

    fn thickness(&self, rng: &mut ActuatorRng) -> u32 {
        if self.max_thickness <= self.min_thickness {
            self.min_thickness
        } else {
            rng.gen_range(self.min_thickness..=self.max_thickness)
        }
    }
}

/// A biome made of stacked bands, top to bottom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeredBiome {
    /// Registry key.
    pub key: String,
    /// Bands from the surface down.
    #[serde(default)]
    pub layers: Vec<BiomeLayer>,
}

impl LayeredBiome {
    /// Creates a layered biome.
    #[must_use]
    pub fn new(key: impl Into<String>, layers: Vec<BiomeLayer>) -> Self {
        Self {
            key: key.into(),
            layers,
        }
    }
}

impl Biome for LayeredBiome {
    fn key(&self) -> &str {
        &self.key
    }

    fn generate_layers(
        &self,
        _x: i32,
        _z: i32,
        rng: &mut ActuatorRng,
        max_depth: i32,
        _height: i32,
        _data: &BiomeRegistry,
    ) -> Vec<Block> {
        let limit = usize::try_from(max_depth).map_or(0, |d| d + 1);
        let mut out = Vec::with_capacity(limit.min(16));

        for layer in &self.layers {
            for _ in 0..layer.thickness(rng) {
                if out.len() >= limit {
                    return out;
                }
                out.push(layer.material);
            }
        }

        out
    }
}

/// Keyed collection of biomes.
#[derive(Clone, Default)]
pub struct BiomeRegistry {
    biomes: Vec<Arc<dyn Biome>>,
    by_key: HashMap<String, usize>,
}

impl BiomeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in biome set used by the reference sample sources.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(LayeredBiome::new(
            "plains",
            vec![
                BiomeLayer::fixed(Block::GRASS, 1),
                BiomeLayer::ranged(Block::DIRT, 2, 4),
            ],
        ));
        registry.register(LayeredBiome::new(
            "meadow",
            vec![BiomeLayer::fixed(Block::GRASS, 1)],
        ));
        registry.register(LayeredBiome::new(
            "desert",
            vec![BiomeLayer::ranged(Block::SAND, 3, 6)],
        ));
        registry.register(LayeredBiome::new(
            "ocean",
            vec![
                BiomeLayer::ranged(Block::GRAVEL, 1, 2),
                BiomeLayer::ranged(Block::SAND, 1, 3),
            ],
        ));
        registry.register(LayeredBiome::new(
            "mountains",
            vec![BiomeLayer::ranged(Block::GRAVEL, 0, 1)],
        ));
        registry.register(LayeredBiome::new(
            "snowy_peaks",
            vec![
                BiomeLayer::fixed(Block::SNOW, 1),
                BiomeLayer::ranged(Block::DIRT, 1, 2),
            ],
        ));
        registry
    }

    /// Adds a biome, replacing any biome with the same key.
    pub fn register(&mut self, biome: impl Biome + 'static) {
        let key = biome.key().to_string();
        let biome: Arc<dyn Biome> = Arc::new(biome);
        match self.by_key.get(&key) {
            Some(&index) => self.biomes[index] = biome,
            None => {
                self.by_key.insert(key, self.biomes.len());
                self.biomes.push(biome);
            }
        }
    }

    /// Looks a biome up by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Biome> {
        self.by_key.get(key).map(|&index| self.biomes[index].as_ref())
    }

    /// Number of registered biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl std::fmt::Debug for BiomeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.biomes.iter().map(|b| b.key()))
            .finish()
    }
}
