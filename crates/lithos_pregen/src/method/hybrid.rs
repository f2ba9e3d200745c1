//! # Hybrid Generation
//!
//! Generates into a live world. The world handle is moved onto a dedicated
//! write thread (`lithos-world-write`) and never touched anywhere else.
//! Workers send a request with a reply channel and block until the write
//! thread answers.
//!
//! ```text
//! worker ─┐
//! worker ─┼──▶ requests ──▶ [lithos-world-write] ──▶ WorldHandle
//! worker ─┘        ▲                 │
//!                  └──── replies ◀───┘
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use lithos_procedural::ChunkCoord;

use super::{GenerationMethod, Generated, SkipReason};
use crate::error::{MethodError, MethodResult, PregenError, PregenResult};
use crate::task::WorldIdentity;
use crate::world::WorldHandle;

/// Name of the world write thread.
pub const WRITE_THREAD_NAME: &str = "lithos-world-write";

struct WriteRequest {
    coord: ChunkCoord,
    reply: Sender<MethodResult<Generated>>,
}

/// Live-world generation through a single write thread.
pub struct HybridMethod {
    identity: WorldIdentity,
    concurrency: usize,
    requests: Option<Sender<WriteRequest>>,
    writer: Option<JoinHandle<()>>,
}

impl HybridMethod {
    /// Moves `world` onto a new write thread.
    ///
    /// `concurrency` is the number of workers the scheduler should run.
    ///
    /// # Errors
    ///
    /// Returns [`PregenError::Spawn`] if the write thread cannot start.
    pub fn new(world: impl WorldHandle + 'static, concurrency: usize) -> PregenResult<Self> {
        let identity = world.identity();
        let (requests, inbox) = unbounded();

        let writer = std::thread::Builder::new()
            .name(WRITE_THREAD_NAME.to_string())
            .spawn(move || write_loop(world, &inbox))
            .map_err(|e| PregenError::Spawn(e.to_string()))?;

        tracing::debug!(world = %identity, "world write thread started");

        Ok(Self {
            identity,
            concurrency: concurrency.max(1),
            requests: Some(requests),
            writer: Some(writer),
        })
    }
}

fn write_one<W: WorldHandle>(world: &mut W, coord: ChunkCoord) -> MethodResult<Generated> {
    if !world.in_border(coord) {
        Ok(Generated::Skipped(SkipReason::OutsideBorder))
    } else if world.is_generated(coord) {
        Ok(Generated::Skipped(SkipReason::AlreadyGenerated))
    } else {
        world.generate_chunk(coord).map(|()| Generated::Success)
    }
}

fn write_loop<W: WorldHandle>(mut world: W, inbox: &Receiver<WriteRequest>) {
    for WriteRequest { coord, reply } in inbox {
        // A panicking chunk fails alone; the thread keeps serving.
        let result = panic::catch_unwind(AssertUnwindSafe(|| write_one(&mut world, coord)))
            .unwrap_or_else(|_| {
                tracing::warn!(%coord, "world write panicked");
                Err(MethodError::Panicked(coord))
            });
        // The requesting worker may have given up; nothing to do then.
        let _ = reply.send(result);
    }
}

impl GenerationMethod for HybridMethod {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn identity(&self) -> &WorldIdentity {
        &self.identity
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn generate(&self, coord: ChunkCoord) -> MethodResult<Generated> {
        let requests = self.requests.as_ref().ok_or(MethodError::Shutdown)?;
        let (reply, answer) = bounded(1);
        requests
            .send(WriteRequest { coord, reply })
            .map_err(|_| MethodError::Shutdown)?;
        answer.recv().map_err(|_| MethodError::Shutdown)?
    }
}

impl Drop for HybridMethod {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::error!(world = %self.identity, "world write thread panicked");
            }
        }
    }
}
