//! # Pregeneration Jobs
//!
//! A [`PregenJob`] runs a [`RegionTask`] through a [`GenerationMethod`] on a
//! fixed pool of worker threads.
//!
//! ## Threads
//!
//! - `lithos-pregen-<n>`: claim the next coordinate, generate it, send the
//!   result. Claims follow the task order; completions arrive in any order.
//! - `lithos-pregen-supervisor`: receives results, keeps the counters and the
//!   rate window, applies the failure policy, fires progress callbacks on
//!   every result and every tick, and decides the terminal state.
//!
//! Pause and cancel are cooperative: they take effect at the next claim.
//! A coordinate already in flight always runs to completion.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use lithos_procedural::ChunkCoord;
use parking_lot::{Condvar, Mutex};

use crate::error::{MethodError, MethodResult, PregenError, PregenResult};
use crate::method::{GenerationMethod, Generated};
use crate::policy::FailurePolicy;
use crate::progress::{JobReport, JobState, ProgressSink, ProgressSnapshot, RateWindow};
use crate::task::{Coords, RegionTask};

/// Job settings.
#[derive(Clone, Debug)]
pub struct JobConfig {
    /// Worker threads; 0 uses the method's concurrency.
    pub threads: usize,
    /// When failures fail the run.
    pub policy: FailurePolicy,
    /// Interval between progress ticks.
    pub tick_interval: Duration,
    /// Length of the throughput window.
    pub rate_window: Duration,
    /// Coordinates already done in an earlier run; never dispatched.
    pub skip: HashSet<ChunkCoord>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            policy: FailurePolicy::default(),
            tick_interval: Duration::from_millis(500),
            rate_window: Duration::from_secs(10),
            skip: HashSet::new(),
        }
    }
}

struct Outcome {
    coord: ChunkCoord,
    result: MethodResult<Generated>,
}

struct Control {
    state: JobState,
    coords: Option<Coords>,
    finished: bool,
    started: Option<Instant>,
    elapsed: Option<Duration>,
    error: Option<PregenError>,
}

struct Shared {
    control: Mutex<Control>,
    resumed: Condvar,
    finished: Condvar,
    policy: FailurePolicy,
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    failed_coords: Mutex<Vec<(ChunkCoord, MethodError)>>,
    completed_coords: Mutex<Vec<ChunkCoord>>,
    rate: Mutex<RateWindow>,
    sinks: Mutex<Vec<Box<dyn ProgressSink>>>,
}

impl Shared {
    /// Next coordinate to generate, or `None` when the worker should exit.
    fn claim(&self) -> Option<ChunkCoord> {
        let mut control = self.control.lock();
        loop {
            match control.state {
                JobState::Running => {
                    let next = control.coords.as_mut().and_then(Iterator::next);
                    if next.is_none() {
                        control.coords = None;
                    }
                    return next;
                }
                JobState::Paused if control.coords.is_some() => {
                    self.resumed.wait(&mut control);
                }
                _ => return None,
            }
        }
    }

    fn record(&self, Outcome { coord, result }: Outcome) {
        match result {
            Ok(generated) => {
                if let Generated::Skipped(reason) = generated {
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(%coord, %reason, "chunk skipped");
                }
                self.completed.fetch_add(1, Ordering::AcqRel);
                self.completed_coords.lock().push(coord);
            }
            Err(error) => {
                let failed = self.failed.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::warn!(%coord, %error, failed, "chunk generation failed");
                self.failed_coords.lock().push((coord, error));
                if self.policy.breached_early(failed) {
                    self.fail();
                }
            }
        }

        self.rate.lock().record(Instant::now());

        let done = self.completed.load(Ordering::Acquire) + self.failed.load(Ordering::Acquire);
        if done >= self.total.load(Ordering::Acquire) {
            self.conclude();
        }
    }

    /// Moves an active job to Failed after a count breach.
    fn fail(&self) {
        let changed = {
            let mut control = self.control.lock();
            if control.state.is_active() {
                control.state = JobState::Failed;
                control.coords = None;
                control.error = Some(self.threshold_error());
                true
            } else {
                false
            }
        };
        self.resumed.notify_all();
        if changed {
            self.notify_state(JobState::Failed);
        }
    }

    /// Decides the terminal state of a job whose coordinates all have results.
    fn conclude(&self) {
        let failed = self.failed.load(Ordering::Acquire);
        let total = self.total.load(Ordering::Acquire);

        let changed = {
            let mut control = self.control.lock();
            control.coords = None;
            if control.state.is_active() {
                if self.policy.breached_final(failed, total) {
                    control.state = JobState::Failed;
                    control.error = Some(self.threshold_error());
                } else {
                    control.state = JobState::Completed;
                }
                Some(control.state)
            } else {
                None
            }
        };
        self.resumed.notify_all();
        if let Some(state) = changed {
            self.notify_state(state);
        }
    }

    fn finish(&self) {
        let state = {
            let mut control = self.control.lock();
            control.finished = true;
            control.elapsed = control.started.map(|s| s.elapsed());
            control.state
        };
        self.emit_progress();
        self.finished.notify_all();

        tracing::info!(
            %state,
            total = self.total.load(Ordering::Relaxed),
            completed = self.completed.load(Ordering::Relaxed),
            failed = self.failed.load(Ordering::Relaxed),
            skipped = self.skipped.load(Ordering::Relaxed),
            "pregeneration finished"
        );
    }

    fn threshold_error(&self) -> PregenError {
        PregenError::ThresholdExceeded {
            failed: self.failed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }

    fn notify_state(&self, state: JobState) {
        tracing::info!(%state, "pregeneration state changed");
        for sink in self.sinks.lock().iter_mut() {
            sink.on_state(state);
        }
    }

    fn emit_progress(&self) -> ProgressSnapshot {
        let snapshot = self.snapshot();
        for sink in self.sinks.lock().iter_mut() {
            sink.on_progress(&snapshot);
        }
        snapshot
    }

    fn snapshot(&self) -> ProgressSnapshot {
        let (state, elapsed) = {
            let control = self.control.lock();
            let elapsed = control
                .elapsed
                .or_else(|| control.started.map(|s| s.elapsed()))
                .unwrap_or_default();
            (control.state, elapsed)
        };

        let total = self.total.load(Ordering::Acquire);
        let completed = self.completed.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);
        let rate = self.rate.lock().rate(Instant::now());
        let remaining = total.saturating_sub(completed + failed);

        ProgressSnapshot {
            state,
            total,
            completed,
            failed,
            skipped: self.skipped.load(Ordering::Acquire),
            percent: ProgressSnapshot::percent_of(completed + failed, total),
            rate,
            eta: ProgressSnapshot::eta_for(remaining, rate),
            elapsed,
        }
    }
}

fn run_worker(shared: &Shared, method: &dyn GenerationMethod, results: &Sender<Outcome>) {
    while let Some(coord) = shared.claim() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| method.generate(coord)))
            .unwrap_or(Err(MethodError::Panicked(coord)));
        if results.send(Outcome { coord, result }).is_err() {
            break;
        }
    }
}

fn supervise(
    shared: &Shared,
    results: &Receiver<Outcome>,
    workers: Vec<JoinHandle<()>>,
    tick: Duration,
) {
    loop {
        match results.recv_timeout(tick) {
            Ok(outcome) => {
                shared.record(outcome);
                shared.emit_progress();
            }
            Err(RecvTimeoutError::Timeout) => {
                let snapshot = shared.emit_progress();
                tracing::debug!(progress = %snapshot, "pregeneration progress");
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("pregeneration worker panicked");
        }
    }

    // Every worker has exited; anything still active has nothing left to do.
    shared.conclude();
    shared.finish();
}

/// A pregeneration run.
///
/// Created idle; [`start`](Self::start) enumerates the task and spawns the
/// workers. Control calls may come from any thread.
pub struct PregenJob {
    task: RegionTask,
    method: Arc<dyn GenerationMethod>,
    config: JobConfig,
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl PregenJob {
    /// Creates an idle job.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::WorldMismatch`] if the task and the method name
    /// different worlds.
    pub fn new(
        task: RegionTask,
        method: Arc<dyn GenerationMethod>,
        config: JobConfig,
    ) -> PregenResult<Self> {
        if &task.world != method.identity() {
            return Err(PregenError::WorldMismatch {
                task: task.world.clone(),
                method: method.identity().clone(),
            });
        }

        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                state: JobState::Idle,
                coords: None,
                finished: false,
                started: None,
                elapsed: None,
                error: None,
            }),
            resumed: Condvar::new(),
            finished: Condvar::new(),
            policy: config.policy,
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed_coords: Mutex::new(Vec::new()),
            completed_coords: Mutex::new(Vec::new()),
            rate: Mutex::new(RateWindow::new(config.rate_window, Instant::now())),
            sinks: Mutex::new(Vec::new()),
        });

        Ok(Self {
            task,
            method,
            config,
            shared,
            supervisor: Mutex::new(None),
        })
    }

    /// Registers a progress sink.
    ///
    /// A sink added before [`start`](Self::start) sees every state change.
    pub fn add_sink(&self, sink: impl ProgressSink + 'static) {
        self.add_boxed_sink(Box::new(sink));
    }

    /// Registers an already boxed progress sink.
    pub fn add_boxed_sink(&self, sink: Box<dyn ProgressSink>) {
        self.shared.sinks.lock().push(sink);
    }

    /// The task being run.
    #[must_use]
    pub const fn task(&self) -> &RegionTask {
        &self.task
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.shared.control.lock().state
    }

    fn ensure_idle(&self) -> PregenResult<()> {
        let state = self.state();
        if state == JobState::Idle {
            Ok(())
        } else {
            Err(PregenError::InvalidTransition {
                from: state,
                action: "start",
            })
        }
    }

    fn worker_count(&self, total: u64) -> usize {
        let wanted = if self.config.threads == 0 {
            self.method.concurrency()
        } else {
            self.config.threads
        };
        wanted
            .max(1)
            .min(usize::try_from(total).unwrap_or(usize::MAX))
    }

    /// Idle → Running.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::InvalidTransition`] unless the job is idle, or
    /// [`PregenError::Spawn`] if a thread cannot start (the job then ends
    /// Failed once any started workers drain).
    pub fn start(&self) -> PregenResult<()> {
        let shared = &self.shared;
        self.ensure_idle()?;

        // Counted without the control lock so state queries stay responsive.
        let total = if self.config.skip.is_empty() {
            self.task.len()
        } else {
            self.task.coords_excluding(&self.config.skip).count() as u64
        };

        {
            let mut control = shared.control.lock();
            if control.state != JobState::Idle || control.started.is_some() {
                return Err(PregenError::InvalidTransition {
                    from: control.state,
                    action: "start",
                });
            }

            shared.total.store(total, Ordering::Release);

            let now = Instant::now();
            control.started = Some(now);
            *shared.rate.lock() = RateWindow::new(self.config.rate_window, now);

            if total == 0 {
                control.state = JobState::Completed;
                control.finished = true;
                control.elapsed = Some(Duration::ZERO);
            } else {
                control.coords = Some(self.task.coords_excluding(&self.config.skip));
                control.state = JobState::Running;
            }
        }

        if total == 0 {
            shared.notify_state(JobState::Completed);
            shared.finish();
            return Ok(());
        }

        let threads = self.worker_count(total);
        tracing::info!(
            world = %self.task.world,
            method = self.method.name(),
            order = %self.task.order,
            total,
            threads,
            "pregeneration started"
        );
        shared.notify_state(JobState::Running);

        let (results, inbox) = unbounded();
        let mut workers = Vec::with_capacity(threads);
        let mut spawn_error = None;

        for n in 0..threads {
            let shared = Arc::clone(shared);
            let method = Arc::clone(&self.method);
            let results = results.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("lithos-pregen-{n}"))
                .spawn(move || run_worker(&shared, method.as_ref(), &results));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    spawn_error = Some(PregenError::Spawn(e.to_string()));
                    break;
                }
            }
        }
        drop(results);

        if let Some(error) = &spawn_error {
            self.abort(error.clone());
        }

        let supervisor_shared = Arc::clone(shared);
        let tick = self.config.tick_interval.max(Duration::from_millis(1));
        let supervisor = std::thread::Builder::new()
            .name("lithos-pregen-supervisor".to_string())
            .spawn(move || supervise(&supervisor_shared, &inbox, workers, tick));

        match supervisor {
            Ok(handle) => *self.supervisor.lock() = Some(handle),
            Err(e) => {
                let error = PregenError::Spawn(e.to_string());
                self.abort(error.clone());
                shared.finish();
                return Err(error);
            }
        }

        spawn_error.map_or(Ok(()), Err)
    }

    fn abort(&self, error: PregenError) {
        tracing::error!(%error, "pregeneration aborted");
        {
            let mut control = self.shared.control.lock();
            control.state = JobState::Failed;
            control.coords = None;
            control.error = Some(error);
        }
        self.shared.resumed.notify_all();
        self.shared.notify_state(JobState::Failed);
    }

    fn transition(
        &self,
        action: &'static str,
        from: &[JobState],
        to: JobState,
    ) -> PregenResult<()> {
        {
            let mut control = self.shared.control.lock();
            if !from.contains(&control.state) {
                return Err(PregenError::InvalidTransition {
                    from: control.state,
                    action,
                });
            }
            control.state = to;
        }
        self.shared.resumed.notify_all();
        self.shared.notify_state(to);
        Ok(())
    }

    /// Running → Paused. In-flight coordinates finish; nothing new starts.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::InvalidTransition`] unless running.
    pub fn pause(&self) -> PregenResult<()> {
        self.transition("pause", &[JobState::Running], JobState::Paused)
    }

    /// Paused → Running.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::InvalidTransition`] unless paused.
    pub fn resume(&self) -> PregenResult<()> {
        self.transition("resume", &[JobState::Paused], JobState::Running)
    }

    /// Running | Paused → Cancelled. In-flight coordinates finish.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::InvalidTransition`] unless running or paused.
    pub fn cancel(&self) -> PregenResult<()> {
        self.transition(
            "cancel",
            &[JobState::Running, JobState::Paused],
            JobState::Cancelled,
        )
    }

    /// Current progress.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.snapshot()
    }

    /// Coordinates that succeeded or were skipped so far.
    ///
    /// Feed these to [`JobConfig::skip`] to resume a run later.
    #[must_use]
    pub fn completed_coords(&self) -> Vec<ChunkCoord> {
        self.shared.completed_coords.lock().clone()
    }

    /// Blocks until the job has finished and every thread has exited.
    ///
    /// Returns immediately for a job that was never started.
    pub fn wait(&self) -> JobReport {
        {
            let mut control = self.shared.control.lock();
            while !control.finished && control.state != JobState::Idle {
                self.shared.finished.wait(&mut control);
            }
        }
        self.join_supervisor();
        self.report()
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobReport> {
        let deadline = Instant::now() + timeout;
        {
            let mut control = self.shared.control.lock();
            while !control.finished && control.state != JobState::Idle {
                if self
                    .shared
                    .finished
                    .wait_until(&mut control, deadline)
                    .timed_out()
                {
                    return None;
                }
            }
        }
        self.join_supervisor();
        Some(self.report())
    }

    fn join_supervisor(&self) {
        if let Some(handle) = self.supervisor.lock().take() {
            if handle.join().is_err() {
                tracing::error!("pregeneration supervisor panicked");
            }
        }
    }

    fn report(&self) -> JobReport {
        let shared = &self.shared;
        let (state, elapsed, error) = {
            let control = shared.control.lock();
            (
                control.state,
                control.elapsed.unwrap_or_default(),
                control.error.clone(),
            )
        };
        JobReport {
            state,
            total: shared.total.load(Ordering::Acquire),
            completed: shared.completed.load(Ordering::Acquire),
            failed: shared.failed.load(Ordering::Acquire),
            skipped: shared.skipped.load(Ordering::Acquire),
            failed_coords: shared.failed_coords.lock().clone(),
            elapsed,
            error,
        }
    }
}

impl std::fmt::Debug for PregenJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PregenJob")
            .field("world", &self.task.world)
            .field("method", &self.method.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for PregenJob {
    fn drop(&mut self) {
        if self.state().is_active() {
            let _ = self.cancel();
        }
        self.join_supervisor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::WorldIdentity;
    use lithos_procedural::WorldSeed;

    struct Always(WorldIdentity);

    fn always() -> Arc<Always> {
        Arc::new(Always(WorldIdentity::new("unit", WorldSeed::new(0))))
    }

    impl GenerationMethod for Always {
        fn name(&self) -> &'static str {
            "always"
        }

        fn identity(&self) -> &WorldIdentity {
            &self.0
        }

        fn concurrency(&self) -> usize {
            2
        }

        fn generate(&self, _coord: ChunkCoord) -> MethodResult<Generated> {
            Ok(Generated::Success)
        }
    }

    fn job(radius: u32, config: JobConfig) -> PregenJob {
        let world = WorldIdentity::new("unit", WorldSeed::new(0));
        let task = RegionTask::radius(world, ChunkCoord::new(0, 0), radius);
        PregenJob::new(task, always(), config).unwrap()
    }

    #[test]
    fn test_skip_set_reduces_total() {
        let config = JobConfig {
            skip: [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)].into(),
            ..JobConfig::default()
        };
        let job = job(1, config);
        job.start().unwrap();
        let report = job.wait();
        assert_eq!(report.total, 7);
        assert_eq!(report.completed, 7);
        assert!(!job.completed_coords().contains(&ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_wait_on_idle_returns() {
        let job = job(1, JobConfig::default());
        assert_eq!(job.wait().state, JobState::Idle);
    }

    #[test]
    fn test_world_mismatch_rejected() {
        let task = RegionTask::radius(
            WorldIdentity::new("other", WorldSeed::new(0)),
            ChunkCoord::new(0, 0),
            1,
        );
        let result = PregenJob::new(task, always(), JobConfig::default());
        assert!(matches!(result, Err(PregenError::WorldMismatch { .. })));
    }
}
