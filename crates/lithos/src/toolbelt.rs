//! # Toolbelt
//!
//! One-call entry points that build a method, wrap it in a job and start it.
//! Progress sinks are attached before the job starts, so they observe the
//! `Running` transition and every tick. The returned job is already running;
//! call [`PregenJob::wait`] for the report.

use std::sync::Arc;

use lithos_pregen::{
    GenerationMethod, HeadlessMethod, HybridMethod, JobConfig, PregenError, PregenJob,
    PregenResult, ProgressSink, RegionTask, WorldHandle,
};
use lithos_procedural::Engine;
use parking_lot::Mutex;

use crate::config::LithosConfig;

/// Progress sinks attached to a job before it starts.
pub type Sinks = Vec<Box<dyn ProgressSink>>;

/// Starts `task` on `method`, reporting to `sinks`.
///
/// # Errors
///
/// Returns [`PregenError::WorldMismatch`] if the task and method disagree on
/// the world, or [`PregenError::Spawn`] if the workers cannot start.
pub fn pregenerate(
    task: RegionTask,
    method: Arc<dyn GenerationMethod>,
    config: JobConfig,
    sinks: Sinks,
) -> PregenResult<PregenJob> {
    tracing::info!(
        world = %task.world,
        method = method.name(),
        order = %task.order,
        chunks = task.len(),
        "Starting pregeneration"
    );
    let job = PregenJob::new(task, method, config)?;
    for sink in sinks {
        job.add_boxed_sink(sink);
    }
    job.start()?;
    Ok(job)
}

/// Starts `task` in memory on a headless method driven by `engine`.
///
/// # Errors
///
/// See [`pregenerate`]. The engine's seed must match the task's world.
pub fn pregenerate_headless(
    task: RegionTask,
    engine: Engine,
    config: &LithosConfig,
    sinks: Sinks,
) -> PregenResult<PregenJob> {
    let method = HeadlessMethod::new(task.world.name.clone(), engine, config.headless_config());
    pregenerate(task, Arc::new(method), config.job_config(), sinks)
}

/// Starts `task` against a live world through a hybrid method.
///
/// # Errors
///
/// See [`pregenerate`]; also fails if the world's write thread cannot start.
pub fn pregenerate_world(
    task: RegionTask,
    world: impl WorldHandle + 'static,
    config: &LithosConfig,
    sinks: Sinks,
) -> PregenResult<PregenJob> {
    let method = HybridMethod::new(world, config.threads())?;
    pregenerate(task, Arc::new(method), config.job_config(), sinks)
}

/// Caller-owned "is a pregeneration running" state.
///
/// Holds at most one live job. A job that has reached a terminal state frees
/// the slot.
#[derive(Default)]
pub struct PregenSlot {
    job: Mutex<Option<Arc<PregenJob>>>,
}

impl PregenSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `start` and keeps its job, unless a live job is already held.
    ///
    /// `start` is not called while the slot is busy.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::Busy`] if a job is still active, or the error
    /// returned by `start`.
    pub fn start(
        &self,
        start: impl FnOnce() -> PregenResult<PregenJob>,
    ) -> PregenResult<Arc<PregenJob>> {
        let mut held = self.job.lock();
        if let Some(job) = held.as_ref() {
            let state = job.state();
            if !state.is_terminal() {
                return Err(PregenError::Busy(state));
            }
        }

        let job = Arc::new(start()?);
        *held = Some(Arc::clone(&job));
        Ok(job)
    }

    /// The held job, if any, including a finished one.
    #[must_use]
    pub fn current(&self) -> Option<Arc<PregenJob>> {
        self.job.lock().clone()
    }

    /// Returns true if the held job has not finished.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.job
            .lock()
            .as_ref()
            .is_some_and(|job| !job.state().is_terminal())
    }

    /// Cancels the held job. Returns false if there was nothing to cancel.
    ///
    /// # Errors
    ///
    /// Propagates [`PregenError::InvalidTransition`] for a job that was
    /// never started.
    pub fn cancel(&self) -> PregenResult<bool> {
        let Some(job) = self.current() else {
            return Ok(false);
        };
        match job.cancel() {
            Ok(()) => Ok(true),
            Err(PregenError::InvalidTransition { from, .. }) if from.is_terminal() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Releases a finished job. An active job is left in place.
    pub fn clear(&self) -> Option<Arc<PregenJob>> {
        let mut held = self.job.lock();
        if held.as_ref().is_some_and(|job| job.state().is_terminal()) {
            held.take()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for PregenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PregenSlot")
            .field("state", &self.current().map(|job| job.state()))
            .finish()
    }
}
