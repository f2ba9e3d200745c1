//! # Dimensions
//!
//! A dimension is the configuration describing one world's generation rules:
//! its height, fluid level, whether a bedrock floor is laid, the shape of the
//! undercarriage (the floor beneath the terrain) and cave carving.
//!
//! Dimensions are plain data and deserialize from TOML:
//!
//! ```toml
//! name = "overworld"
//! height = 256
//! fluid_height = 62
//! bedrock = true
//!
//! [undercarriage]
//! min = 0
//! max = 4
//!
//! [caves]
//! threshold = 0.55
//! ```

use serde::{Deserialize, Serialize};

/// One world's generation rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// Voxel height of a chunk column.
    pub height: usize,
    /// Fluid (sea) level. Columns whose surface lies below it are flooded.
    pub fluid_height: f64,
    /// Whether the lowest voxel of each column is bedrock.
    pub bedrock: bool,
    /// Shape of the floor beneath the terrain; `None` means a flat floor at 0.
    pub undercarriage: Option<Undercarriage>,
    /// Cave carving; `None` disables carving.
    pub caves: Option<CaveConfig>,
}

impl Default for Dimension {
    fn default() -> Self {
        Self {
            name: "overworld".to_string(),
            height: 256,
            fluid_height: 62.0,
            bedrock: true,
            undercarriage: None,
            caves: None,
        }
    }
}

impl Dimension {
    /// Returns true if the undercarriage varies by column.
    ///
    /// A missing or flat undercarriage puts every column's floor at 0.
    #[must_use]
    pub fn has_undercarriage(&self) -> bool {
        self.undercarriage.as_ref().is_some_and(|u| !u.is_flat())
    }
}

/// The floor generator beneath the terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Undercarriage {
    /// Lowest floor level.
    pub min: f64,
    /// Highest floor level.
    pub max: f64,
    /// Horizontal frequency of the floor noise.
    pub frequency: f64,
}

impl Default for Undercarriage {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 4.0,
            frequency: 0.05,
        }
    }
}

impl Undercarriage {
    /// Returns true if the floor never varies.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        (self.max - self.min).abs() < f64::EPSILON
    }

    /// Maps a noise value in [-1, 1] onto the floor range.
    #[must_use]
    pub fn level(&self, noise: f64) -> f64 {
        let t = (noise.clamp(-1.0, 1.0) + 1.0) * 0.5;
        self.min + (self.max - self.min) * t
    }
}

/// Cave carving rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Noise value above which a voxel is carved.
    pub threshold: f64,
    /// Noise frequency.
    pub frequency: f64,
    /// Voxels this close to the surface are never carved.
    pub min_cover: i32,
    /// Voxels at or below this level are never carved.
    pub floor: i32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            threshold: 0.55,
            frequency: 0.04,
            min_cover: 6,
            floor: 4,
        }
    }
}

impl CaveConfig {
    /// Returns true if `y` lies in the band caves may occupy below `surface`.
    #[must_use]
    pub const fn in_band(&self, y: i32, surface: i32) -> bool {
        y > self.floor && y < surface - self.min_cover
    }
}
