//! # LITHOS
//!
//! Voxel terrain generation and region pregeneration.
//!
//! This crate ties the workspace together:
//!
//! - [`core`]: voxel hunks with exclusive and atomic storage
//! - [`procedural`]: the terrain actuator, biomes and sample sources
//! - [`pregen`]: region tasks, generation methods and the job scheduler
//! - [`config`]: TOML configuration
//! - [`toolbelt`]: one-call pregeneration entry points
//!
//! ```rust,ignore
//! use lithos::{config::LithosConfig, toolbelt};
//!
//! let config = LithosConfig::load("lithos.toml")?;
//! let engine = config.engine();
//! let task = config.radius_task((0, 0).into(), 16);
//! let job = toolbelt::pregenerate_headless(task, engine, &config, Vec::new())?;
//! println!("{:?}", job.wait().state);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub use lithos_core as core;
pub use lithos_pregen as pregen;
pub use lithos_procedural as procedural;

pub mod config;
pub mod toolbelt;

pub use config::{resolve_threads, ConfigError, ConfigResult, LithosConfig};
pub use toolbelt::{pregenerate, pregenerate_headless, pregenerate_world, PregenSlot, Sinks};
