//! # LITHOS Pregeneration
//!
//! Generates large regions of chunks ahead of time.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   claim   ┌────────────┐  generate  ┌──────────────────┐
//! │ RegionTask │ ────────▶ │  workers   │ ─────────▶ │ GenerationMethod │
//! │ (ordered)  │           │ (N threads)│            │ Headless/Hybrid  │
//! └────────────┘           └─────┬──────┘            └──────────────────┘
//!                                │ results (channel)
//!                          ┌─────▼──────┐
//!                          │ supervisor │ ──▶ counters, rate, sinks, state
//!                          └────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lithos_pregen::{HeadlessMethod, JobConfig, PregenJob, RegionTask};
//!
//! let method = Arc::new(HeadlessMethod::new("world", engine, Default::default()));
//! let task = RegionTask::radius(method.identity().clone(), (0, 0).into(), 8);
//! let job = PregenJob::new(task, method, JobConfig::default())?;
//! job.start()?;
//! let report = job.wait();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod job;
pub mod method;
pub mod policy;
pub mod progress;
pub mod task;
pub mod world;

pub use error::{MethodError, MethodResult, PregenError, PregenResult};
pub use job::{JobConfig, PregenJob};
pub use method::headless::{ActuatorPool, HeadlessConfig, HeadlessMethod, HeadlessStats};
pub use method::hybrid::HybridMethod;
pub use method::{GenerationMethod, Generated, SkipReason};
pub use policy::FailurePolicy;
pub use progress::{JobReport, JobState, ProgressSink, ProgressSnapshot, RateWindow};
pub use task::{Coords, Order, RegionTask, Shape, WorldIdentity};
pub use world::{MemoryWorld, WorldHandle, WorldView};
