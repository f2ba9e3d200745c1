//! # LITHOS Procedural Generation
//!
//! Fills voxel hunks with terrain, one column at a time.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: a fixed seed, dimension and sample source always
//!    produce the same voxels for the same iteration order
//! 2. **Columnar**: each (x, z) column is resolved independently from height,
//!    fluid, biome and rock samples
//! 3. **Worker-owned state**: an actuator's RNG is never shared between threads
//!
//! ## Core Components
//!
//! - `Dimension`: world generation rules (height, fluid level, bedrock, caves)
//! - `ColumnSampleSource`: per-column height, fluid, rock and biome samples
//! - `Biome`: sub-surface layer sequences
//! - `TerrainActuator`: the column fill algorithm
//! - `Engine`: shared world context that creates actuators and chunks
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithos_procedural::{ChunkCoord, Dimension, Engine, FlatSource, WorldSeed};
//!
//! let engine = Engine::flat(WorldSeed::new(42), Dimension::default(), FlatSource::default());
//! let mut actuator = engine.actuator();
//! let chunk = engine.generate_chunk(&mut actuator, ChunkCoord::new(0, 0))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod actuator;
pub mod biome;
pub mod chunk;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod material;
pub mod seed;
pub mod source;

pub use actuator::{round_half_up, ActuatorRng, TerrainActuator};
pub use biome::{Biome, BiomeLayer, BiomeRegistry, LayeredBiome};
pub use chunk::{ChunkCoord, ChunkHunk, CHUNK_SIZE, REGION_SIZE};
pub use dimension::{CaveConfig, Dimension, Undercarriage};
pub use engine::Engine;
pub use error::{ActuateError, ActuateResult, SampleError, SampleResult};
pub use material::Block;
pub use seed::WorldSeed;
pub use source::{ColumnSampleSource, FlatSource, NoiseSource};
