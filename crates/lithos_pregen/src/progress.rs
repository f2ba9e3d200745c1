//! # Progress Tracking
//!
//! Job states, throughput over a sliding window, and the snapshots and
//! callbacks presentation layers consume.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use lithos_procedural::ChunkCoord;

use crate::error::{MethodError, PregenError};

/// Lifecycle of a pregeneration job.
///
/// ```text
/// Idle ──start──▶ Running ──▶ Completed | Failed
///                  │   ▲
///             pause│   │resume
///                  ▼   │
///                 Paused
/// Running | Paused ──cancel──▶ Cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Created, not started.
    Idle,
    /// Dispatching coordinates.
    Running,
    /// Dispatch suspended; in-flight work finishes.
    Paused,
    /// Every coordinate has a result and the failure policy held.
    Completed,
    /// Stopped by the caller.
    Cancelled,
    /// The failure policy was breached.
    Failed,
}

impl JobState {
    /// Returns true for Completed, Cancelled and Failed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true while coordinates may still be dispatched.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        })
    }
}

/// Completions per second over a sliding time window.
#[derive(Clone, Debug)]
pub struct RateWindow {
    window: Duration,
    started: Instant,
    events: VecDeque<Instant>,
}

impl RateWindow {
    /// Creates a window of length `window` starting at `started`.
    #[must_use]
    pub fn new(window: Duration, started: Instant) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            started,
            events: VecDeque::new(),
        }
    }

    /// Records one completion at `now`.
    pub fn record(&mut self, now: Instant) {
        self.events.push_back(now);
        self.evict(now);
    }

    /// Completions per second at `now`.
    ///
    /// Before a full window has elapsed, the rate is taken over the time
    /// since start.
    pub fn rate(&mut self, now: Instant) -> f64 {
        self.evict(now);
        let span = now.saturating_duration_since(self.started).min(self.window);
        let secs = span.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.events.len() as f64;
        count / secs
    }

    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.events.front() {
            if now.saturating_duration_since(*front) > self.window {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Point-in-time view of a job.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Current state.
    pub state: JobState,
    /// Coordinates in the run.
    pub total: u64,
    /// Succeeded or skipped.
    pub completed: u64,
    /// Failed.
    pub failed: u64,
    /// Of `completed`, how many were skipped.
    pub skipped: u64,
    /// Percent of coordinates with a result, in [0, 100].
    pub percent: f64,
    /// Coordinates per second over the rate window.
    pub rate: f64,
    /// Projected time to finish; `None` while the rate is zero.
    pub eta: Option<Duration>,
    /// Time since start.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Coordinates without a result yet.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed + self.failed)
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn percent_of(done: u64, total: u64) -> f64 {
        if total == 0 {
            100.0
        } else {
            done as f64 * 100.0 / total as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn eta_for(remaining: u64, rate: f64) -> Option<Duration> {
        if rate > 0.0 {
            Duration::try_from_secs_f64(remaining as f64 / rate).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% ({}/{}, {} failed) {:.1} chunks/s",
            self.percent,
            self.completed + self.failed,
            self.total,
            self.failed,
            self.rate
        )?;
        if let Some(eta) = self.eta {
            write!(f, ", eta {}s", eta.as_secs())?;
        }
        Ok(())
    }
}

/// Final outcome of a job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
    /// Terminal state.
    pub state: JobState,
    /// Coordinates in the run.
    pub total: u64,
    /// Succeeded or skipped.
    pub completed: u64,
    /// Failed.
    pub failed: u64,
    /// Of `completed`, how many were skipped.
    pub skipped: u64,
    /// Every failed coordinate with its cause.
    pub failed_coords: Vec<(ChunkCoord, MethodError)>,
    /// Run time.
    pub elapsed: Duration,
    /// Set for Failed runs.
    pub error: Option<PregenError>,
}

/// Receives progress from a running job.
///
/// Callbacks run on the job's threads and must not block.
pub trait ProgressSink: Send {
    /// Called after every result and on every tick.
    fn on_progress(&mut self, snapshot: &ProgressSnapshot);

    /// Called on every state change.
    fn on_state(&mut self, _state: JobState) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressSnapshot) + Send,
{
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        self(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_before_full_window() {
        let start = Instant::now();
        let mut window = RateWindow::new(Duration::from_secs(10), start);
        for i in 0..4 {
            window.record(start + Duration::from_millis(i * 500));
        }
        let rate = window.rate(start + Duration::from_secs(2));
        assert!((rate - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_evicts_old_events() {
        let start = Instant::now();
        let mut window = RateWindow::new(Duration::from_secs(1), start);
        window.record(start);
        window.record(start + Duration::from_millis(100));
        window.record(start + Duration::from_millis(2_500));
        let rate = window.rate(start + Duration::from_secs(3));
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eta_and_percent() {
        assert_eq!(
            ProgressSnapshot::eta_for(10, 2.0),
            Some(Duration::from_secs(5))
        );
        assert_eq!(ProgressSnapshot::eta_for(10, 0.0), None);
        assert!((ProgressSnapshot::percent_of(0, 0) - 100.0).abs() < f64::EPSILON);
        assert!((ProgressSnapshot::percent_of(1, 4) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Paused.is_terminal());
        assert!(JobState::Paused.is_active());
        assert!(!JobState::Idle.is_active());
    }
}
