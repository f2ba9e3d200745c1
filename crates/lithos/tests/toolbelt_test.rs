//! # Toolbelt Tests
//!
//! The one-call entry points and the single-job slot.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use lithos::config::LithosConfig;
use lithos::pregen::{
    GenerationMethod, Generated, JobConfig, JobState, MemoryWorld, MethodError, MethodResult,
    PregenError, RegionTask, WorldIdentity,
};
use lithos::procedural::{ChunkCoord, Dimension, Engine, FlatSource, WorldSeed};
use lithos::toolbelt::{self, PregenSlot};

fn config() -> LithosConfig {
    let mut config = LithosConfig::default();
    config.world.name = "belt".to_string();
    config.world.seed = WorldSeed::new(5);
    config.concurrency.pregen_threads = 2;
    config
}

fn engine() -> Engine {
    let dimension = Dimension {
        height: 24,
        ..Dimension::default()
    };
    Engine::flat(WorldSeed::new(5), dimension, FlatSource::at(12.0))
}

/// Blocks every call until released.
struct Gated {
    identity: WorldIdentity,
    entered: Sender<ChunkCoord>,
    go: Receiver<()>,
}

impl GenerationMethod for Gated {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn identity(&self) -> &WorldIdentity {
        &self.identity
    }

    fn concurrency(&self) -> usize {
        1
    }

    fn generate(&self, coord: ChunkCoord) -> MethodResult<Generated> {
        self.entered.send(coord).map_err(|_| MethodError::Shutdown)?;
        self.go.recv().map_err(|_| MethodError::Shutdown)?;
        Ok(Generated::Success)
    }
}

#[test]
fn test_headless_radius_two() {
    let config = config();
    let task = config.radius_task(ChunkCoord::new(3, -3), 2);
    let report = toolbelt::pregenerate_headless(task, engine(), &config, Vec::new())
        .unwrap()
        .wait();

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.total, 25);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_world_run_writes_on_write_thread() {
    let config = config();
    let world = MemoryWorld::new("belt", engine()).with_border(ChunkCoord::new(0, 0), 1);
    let view = world.view();

    let task = config.radius_task(ChunkCoord::new(0, 0), 2);
    let report = toolbelt::pregenerate_world(task, world, &config, Vec::new())
        .unwrap()
        .wait();

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.skipped, 16);
    assert_eq!(view.len(), 9);
    assert_eq!(view.writer_threads().len(), 1);
}

#[test]
fn test_slot_refuses_second_job() {
    let (entered, entered_rx) = unbounded();
    let (go_tx, go) = unbounded();
    let identity = WorldIdentity::new("belt", WorldSeed::new(5));
    let method: Arc<dyn GenerationMethod> = Arc::new(Gated {
        identity: identity.clone(),
        entered,
        go,
    });
    let task = || RegionTask::radius(identity.clone(), ChunkCoord::new(0, 0), 1);

    let slot = PregenSlot::new();
    let first = slot
        .start(|| toolbelt::pregenerate(task(), Arc::clone(&method), JobConfig::default(), Vec::new()))
        .unwrap();
    entered_rx.recv().unwrap();
    assert!(slot.is_running());

    let mut called = false;
    let err = slot
        .start(|| {
            called = true;
            toolbelt::pregenerate(task(), Arc::clone(&method), JobConfig::default(), Vec::new())
        })
        .unwrap_err();
    assert_eq!(err, PregenError::Busy(JobState::Running));
    assert!(!called);
    assert!(slot.clear().is_none());

    assert!(slot.cancel().unwrap());
    go_tx.send(()).unwrap();
    let report = first.wait();
    assert_eq!(report.state, JobState::Cancelled);
    assert!(!slot.is_running());
    assert!(!slot.cancel().unwrap());

    // A finished job frees the slot.
    for _ in 0..9 {
        go_tx.send(()).unwrap();
    }
    let second = slot
        .start(|| toolbelt::pregenerate(task(), Arc::clone(&method), JobConfig::default(), Vec::new()))
        .unwrap();
    assert_eq!(second.wait().state, JobState::Completed);
    assert!(slot.clear().is_some());
    assert!(slot.current().is_none());
}
