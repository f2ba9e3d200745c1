//! # LITHOS Configuration
//!
//! Loaded once at startup from a TOML file. Every section and every key is
//! optional; missing values take the defaults below.
//!
//! ```toml
//! [world]
//! name = "world"
//! seed = 1337
//!
//! [concurrency]
//! pregen_threads = -1      # <0: cpus / |n|, 0: cpus, >0: exactly n
//!
//! [pregen]
//! max_failures = 16
//! max_failure_rate = 0.25
//! tick_interval_ms = 500
//! rate_window_secs = 10
//!
//! [border]                 # shared by the headless and world methods
//! radius = 0               # 0: no border
//! center = { x = 0, z = 0 }
//!
//! [headless]
//! parallel_sections = false
//! section_size = 8
//!
//! [dimension]
//! fluid_height = 62
//! bedrock = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use lithos_pregen::{FailurePolicy, HeadlessConfig, JobConfig, RegionTask, WorldIdentity};
use lithos_procedural::{ChunkCoord, Dimension, Engine, WorldSeed};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has wrongly typed keys.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// World identity settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    /// World name.
    pub name: String,
    /// World seed.
    pub seed: WorldSeed,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            seed: WorldSeed::default(),
        }
    }
}

/// Thread counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencySection {
    /// Pregeneration workers; see [`resolve_threads`].
    pub pregen_threads: i32,
}

impl Default for ConcurrencySection {
    fn default() -> Self {
        Self { pregen_threads: -1 }
    }
}

/// Scheduler settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregenSection {
    /// Largest tolerated number of failed chunks.
    pub max_failures: Option<u64>,
    /// Largest tolerated fraction of failed chunks.
    pub max_failure_rate: Option<f64>,
    /// Progress tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Throughput window in seconds.
    pub rate_window_secs: u64,
}

impl Default for PregenSection {
    fn default() -> Self {
        Self {
            max_failures: None,
            max_failure_rate: None,
            tick_interval_ms: 500,
            rate_window_secs: 10,
        }
    }
}

/// World border applied by every generation method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderSection {
    /// Chebyshev radius in chunks; 0 disables the border.
    pub radius: u32,
    /// Border center.
    pub center: ChunkCoord,
}

impl Default for BorderSection {
    fn default() -> Self {
        Self {
            radius: 0,
            center: ChunkCoord::new(0, 0),
        }
    }
}

impl BorderSection {
    /// The radius, or `None` when the border is disabled.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        if self.radius > 0 {
            Some(self.radius)
        } else {
            None
        }
    }
}

/// Headless method settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessSection {
    /// Actuate each chunk in concurrent sections.
    pub parallel_sections: bool,
    /// Section edge length in columns.
    pub section_size: usize,
}

impl Default for HeadlessSection {
    fn default() -> Self {
        Self {
            parallel_sections: false,
            section_size: 8,
        }
    }
}

/// The full configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LithosConfig {
    /// `[world]`
    pub world: WorldSection,
    /// `[concurrency]`
    pub concurrency: ConcurrencySection,
    /// `[pregen]`
    pub pregen: PregenSection,
    /// `[border]`
    pub border: BorderSection,
    /// `[headless]`
    pub headless: HeadlessSection,
    /// `[dimension]`
    pub dimension: Dimension,
}

impl LithosConfig {
    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise see
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), world = %config.world.name, "Loaded config");
        Ok(config)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(rate) = self.pregen.max_failure_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "pregen.max_failure_rate must be within [0, 1], got {rate}"
                )));
            }
        }
        if self.pregen.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "pregen.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.pregen.rate_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "pregen.rate_window_secs must be positive".to_string(),
            ));
        }
        if self.headless.section_size == 0 {
            return Err(ConfigError::Invalid(
                "headless.section_size must be positive".to_string(),
            ));
        }
        if self.dimension.height == 0 {
            return Err(ConfigError::Invalid(
                "dimension.height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Pregeneration worker count on this machine.
    #[must_use]
    pub fn threads(&self) -> usize {
        resolve_threads(self.concurrency.pregen_threads, num_cpus::get())
    }

    /// The world this config describes.
    #[must_use]
    pub fn identity(&self) -> WorldIdentity {
        WorldIdentity::new(self.world.name.clone(), self.world.seed)
    }

    /// Failure tolerance.
    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        FailurePolicy {
            max_failures: self.pregen.max_failures,
            max_failure_rate: self.pregen.max_failure_rate,
        }
    }

    /// Scheduler settings with the resolved thread count.
    #[must_use]
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            threads: self.threads(),
            policy: self.policy(),
            tick_interval: Duration::from_millis(self.pregen.tick_interval_ms),
            rate_window: Duration::from_secs(self.pregen.rate_window_secs),
            ..JobConfig::default()
        }
    }

    /// Headless method settings.
    #[must_use]
    pub fn headless_config(&self) -> HeadlessConfig {
        HeadlessConfig {
            threads: self.threads(),
            border_radius: self.border.limit(),
            border_center: self.border.center,
            parallel_sections: self.headless.parallel_sections,
            section_size: self.headless.section_size,
        }
    }

    /// Noise terrain engine for the configured world.
    #[must_use]
    pub fn engine(&self) -> Engine {
        Engine::noise(self.world.seed, self.dimension.clone())
    }

    /// Square task of `radius` around `center` in this world.
    #[must_use]
    pub fn radius_task(&self, center: ChunkCoord, radius: u32) -> RegionTask {
        RegionTask::radius(self.identity(), center, radius)
    }
}

/// Resolves a configured thread count against `cpus`.
///
/// Negative values divide the CPU count (`-2` on 8 CPUs gives 4), zero uses
/// every CPU and positive values are taken as is. The result is at least 1.
#[must_use]
pub fn resolve_threads(configured: i32, cpus: usize) -> usize {
    let cpus = cpus.max(1);
    let threads = match configured {
        0 => cpus,
        n if n < 0 => cpus / n.unsigned_abs() as usize,
        n => n.unsigned_abs() as usize,
    };
    threads.max(1)
}
