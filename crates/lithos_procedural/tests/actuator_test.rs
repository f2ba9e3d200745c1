//! # Terrain Actuator Tests
//!
//! Column fill behaviour against hand-built sample sources.

use lithos_core::{ColumnRegion, ExclusiveHunk};
use lithos_procedural::{
    ActuateError, ActuatorRng, Biome, BiomeLayer, BiomeRegistry, Block, CaveConfig,
    ChunkCoord, ColumnSampleSource, Dimension, Engine, FlatSource, LayeredBiome, SampleError,
    SampleResult, Undercarriage, WorldSeed, CHUNK_SIZE,
};

/// Flat source that carves a fixed band and fails on one column.
struct BandSource {
    carve: std::ops::RangeInclusive<i32>,
    poisoned: Option<(i32, i32)>,
}

impl ColumnSampleSource for BandSource {
    fn height_at(&self, x: i32, z: i32) -> SampleResult<f64> {
        if self.poisoned == Some((x, z)) {
            return Err(SampleError::Failed {
                x,
                z,
                reason: "poisoned".to_string(),
            });
        }
        Ok(20.0)
    }

    fn fluid_level_at(&self, _x: i32, _z: i32) -> SampleResult<f64> {
        Ok(0.0)
    }

    fn rock_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        Block::STONE
    }

    fn fluid_material_at(&self, _x: i32, _y: i32, _z: i32) -> Block {
        Block::WATER
    }

    fn biome_at<'a>(
        &self,
        _x: i32,
        _z: i32,
        biomes: &'a BiomeRegistry,
    ) -> SampleResult<&'a dyn Biome> {
        biomes
            .get("meadow")
            .ok_or_else(|| SampleError::UnknownBiome("meadow".to_string()))
    }

    fn is_carved(&self, _x: i32, y: i32, _z: i32, _rng: &mut ActuatorRng, _surface: i32) -> bool {
        self.carve.contains(&y)
    }

    fn undercarriage_at(&self, _x: i32, _z: i32) -> SampleResult<Option<f64>> {
        Ok(None)
    }
}

fn meadow() -> BiomeRegistry {
    let mut biomes = BiomeRegistry::new();
    biomes.register(LayeredBiome::new(
        "meadow",
        vec![BiomeLayer::fixed(Block::GRASS, 1)],
    ));
    biomes
}

#[test]
fn test_flat_world_column() {
    let engine = Engine::new(
        WorldSeed::new(42),
        Dimension::default(),
        FlatSource::at(64.0),
        meadow(),
    );
    let mut actuator = engine.actuator();
    let mut hunk = ExclusiveHunk::new(16, 256, 16, Block::AIR).unwrap();
    actuator.actuate(0, 0, &mut hunk).unwrap();

    for x in 0..16 {
        for z in 0..16 {
            assert_eq!(hunk.get(x, 0, z).unwrap(), Block::BEDROCK);
            for y in 1..64 {
                assert_eq!(hunk.get(x, y, z).unwrap(), Block::STONE, "y={y}");
            }
            assert_eq!(hunk.get(x, 64, z).unwrap(), Block::GRASS);
            for y in 65..256 {
                assert_eq!(hunk.get(x, y, z).unwrap(), Block::AIR);
            }
        }
    }
}

#[test]
fn test_fluid_fills_above_surface() {
    let source = FlatSource {
        surface: 40.0,
        fluid_level: 62.0,
        ..FlatSource::default()
    };
    let engine = Engine::new(WorldSeed::new(1), Dimension::default(), source, meadow());
    let chunk = engine
        .generate_chunk(&mut engine.actuator(), ChunkCoord::new(0, 0))
        .unwrap();

    let column = chunk.column(5, 5).unwrap();
    assert_eq!(column[40], Block::GRASS);
    assert!(column[41..=62].iter().all(|b| *b == Block::WATER));
    assert_eq!(column[63], Block::AIR);
}

#[test]
fn test_no_bedrock_when_disabled() {
    let dimension = Dimension {
        bedrock: false,
        ..Dimension::default()
    };
    let engine = Engine::new(WorldSeed::new(1), dimension, FlatSource::at(8.0), meadow());
    let mut hunk = ExclusiveHunk::new(1, 16, 1, Block::AIR).unwrap();
    engine.actuator().actuate(0, 0, &mut hunk).unwrap();
    assert_eq!(hunk.get(0, 0, 0).unwrap(), Block::STONE);
}

#[test]
fn test_carved_voxels_are_untouched() {
    let source = BandSource {
        carve: 5..=9,
        poisoned: None,
    };
    let engine = Engine::new(WorldSeed::new(1), Dimension::default(), source, meadow());
    let mut hunk = ExclusiveHunk::new(2, 32, 2, Block::LAVA).unwrap();
    engine.actuator().actuate(0, 0, &mut hunk).unwrap();

    let column = hunk.column(1, 1).unwrap();
    assert!(column[5..=9].iter().all(|b| *b == Block::LAVA));
    assert_eq!(column[4], Block::STONE);
    assert_eq!(column[10], Block::STONE);
    assert_eq!(column[20], Block::GRASS);
    assert_eq!(column[21], Block::LAVA);
}

#[test]
fn test_sample_failure_propagates() {
    let source = BandSource {
        carve: 0..=-1,
        poisoned: Some((17, 3)),
    };
    let engine = Engine::new(WorldSeed::new(1), Dimension::default(), source, meadow());
    let result = engine.generate_chunk(&mut engine.actuator(), ChunkCoord::new(1, 0));
    assert!(matches!(
        result,
        Err(ActuateError::Sample(SampleError::Failed { x: 17, z: 3, .. }))
    ));
}

#[test]
fn test_unknown_biome_propagates() {
    let engine = Engine::new(
        WorldSeed::new(1),
        Dimension::default(),
        FlatSource::default(),
        BiomeRegistry::new(),
    );
    let result = engine.generate_chunk(&mut engine.actuator(), ChunkCoord::new(0, 0));
    assert!(matches!(
        result,
        Err(ActuateError::Sample(SampleError::UnknownBiome(_)))
    ));
}

#[test]
fn test_same_seed_same_chunks() {
    let dimension = Dimension {
        caves: Some(CaveConfig::default()),
        ..Dimension::default()
    };
    let a = Engine::noise(WorldSeed::new(77), dimension.clone());
    let b = Engine::noise(WorldSeed::new(77), dimension);
    let (mut actuator_a, mut actuator_b) = (a.actuator(), b.actuator());

    for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 5), ChunkCoord::new(40, -2)] {
        let chunk_a = a.generate_chunk(&mut actuator_a, coord).unwrap();
        let chunk_b = b.generate_chunk(&mut actuator_b, coord).unwrap();
        assert_eq!(chunk_a.as_slice(), chunk_b.as_slice(), "chunk {coord}");
    }
}

#[test]
fn test_noise_chunk_has_floor_and_air() {
    let engine = Engine::noise(WorldSeed::new(9), Dimension::default());
    let chunk = engine
        .generate_chunk(&mut engine.actuator(), ChunkCoord::new(2, 2))
        .unwrap();

    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            assert_eq!(chunk.get(x, 0, z).unwrap(), Block::BEDROCK);
            assert_eq!(chunk.get(x, 255, z).unwrap(), Block::AIR);
        }
    }
}

#[test]
fn test_section_actuation_covers_only_region() {
    let engine = Engine::new(WorldSeed::new(1), Dimension::default(), FlatSource::at(4.0), meadow());
    let mut hunk = ExclusiveHunk::new(8, 8, 8, Block::AIR).unwrap();
    engine
        .actuator()
        .actuate_region(0, 0, &mut hunk, ColumnRegion::new(0, 0, 4, 8))
        .unwrap();

    assert_eq!(hunk.get(3, 4, 7).unwrap(), Block::GRASS);
    assert_eq!(hunk.get(4, 4, 0).unwrap(), Block::AIR);
    assert_eq!(hunk.count(|b| b == Block::GRASS), 4 * 8);
}

#[test]
fn test_floor_above_buffer_leaves_column_untouched() {
    let dimension = Dimension {
        height: 16,
        undercarriage: Some(Undercarriage {
            min: 0.0,
            max: 32.0,
            frequency: 0.05,
        }),
        ..Dimension::default()
    };
    let source = FlatSource {
        surface: 500.0,
        floor: Some(20.0),
        ..FlatSource::default()
    };
    let engine = Engine::new(WorldSeed::new(3), dimension, source, meadow());
    let mut hunk = ExclusiveHunk::new(4, 16, 4, Block::SAND).unwrap();
    engine.actuator().actuate(0, 0, &mut hunk).unwrap();

    assert_eq!(hunk.count(|b| b == Block::SAND), 4 * 16 * 4);
}
