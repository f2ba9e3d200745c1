//! # Pregeneration Error Types

use lithos_procedural::{ActuateError, ChunkCoord, SampleError};
use thiserror::Error;

use crate::progress::JobState;
use crate::task::WorldIdentity;

/// Why a single coordinate failed to generate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MethodError {
    /// The sample source failed.
    #[error("sample source error: {0}")]
    Sample(#[from] SampleError),

    /// The live world refused or failed the write.
    #[error("commit failed at {coord}: {reason}")]
    Commit {
        /// Chunk being committed.
        coord: ChunkCoord,
        /// Platform-reported cause.
        reason: String,
    },

    /// Actuation failed for a reason other than sampling.
    #[error("actuation failed: {0}")]
    Actuate(ActuateError),

    /// The method has shut down (write thread gone).
    #[error("generation method has shut down")]
    Shutdown,

    /// The method panicked while generating.
    #[error("generation panicked at {0}")]
    Panicked(ChunkCoord),
}

impl From<ActuateError> for MethodError {
    fn from(err: ActuateError) -> Self {
        match err {
            ActuateError::Sample(sample) => Self::Sample(sample),
            other => Self::Actuate(other),
        }
    }
}

/// Errors raised by the scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PregenError {
    /// Too many coordinates failed.
    #[error("failure threshold exceeded: {failed} of {total} chunks failed")]
    ThresholdExceeded {
        /// Failed coordinates at the time of the breach.
        failed: u64,
        /// Total coordinates in the task.
        total: u64,
    },

    /// A control call was not valid in the current state.
    #[error("cannot {action} a job that is {from}")]
    InvalidTransition {
        /// State at the time of the call.
        from: JobState,
        /// The attempted action.
        action: &'static str,
    },

    /// The task targets a different world than the method.
    #[error("task targets {task} but method is bound to {method}")]
    WorldMismatch {
        /// World named by the task.
        task: WorldIdentity,
        /// World the method is bound to.
        method: WorldIdentity,
    },

    /// A thread could not be spawned.
    #[error("failed to spawn thread: {0}")]
    Spawn(String),

    /// Another job already occupies the slot.
    #[error("a pregeneration job is already {0}")]
    Busy(JobState),
}

/// Result type for a single coordinate.
pub type MethodResult<T> = Result<T, MethodError>;

/// Result type for scheduler operations.
pub type PregenResult<T> = Result<T, PregenError>;
