//! # LITHOS CLI
//!
//! Pregenerates a square of chunks around a center using the configured
//! noise terrain, then prints the final report.
//!
//! ```bash
//! # 33x33 chunks around the origin, all CPUs
//! lithos --radius 16 --threads 0
//!
//! # Into a live in-memory world through its write thread
//! lithos --config lithos.toml --method hybrid --center=-40,12 -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use lithos::config::LithosConfig;
use lithos::pregen::{JobReport, JobState, MemoryWorld, Order, ProgressSink, ProgressSnapshot};
use lithos::procedural::{ChunkCoord, WorldSeed};
use lithos::toolbelt::{self, Sinks};

/// Which generation method to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MethodKind {
    /// Generate in memory and discard.
    Headless,
    /// Generate into an in-memory live world.
    Hybrid,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pregenerate LITHOS terrain", long_about = None)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Radius in chunks around the center
    #[arg(short, long, default_value_t = 8)]
    radius: u32,

    /// Center chunk as X,Z
    #[arg(long, default_value = "0,0", value_parser = parse_center, allow_hyphen_values = true)]
    center: ChunkCoord,

    /// Enumeration order: spiral, row, regions
    #[arg(long, default_value_t = Order::Spiral)]
    order: Order,

    /// Generation method
    #[arg(long, value_enum, default_value_t = MethodKind::Headless)]
    method: MethodKind,

    /// Worker threads (<0: cpus / |n|, 0: all cpus); overrides the config
    #[arg(short, long, allow_hyphen_values = true)]
    threads: Option<i32>,

    /// World seed; overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_center(value: &str) -> Result<ChunkCoord, String> {
    let (x, z) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Z but got '{value}'"))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad X '{x}': {e}"))?;
    let z = z.trim().parse::<i32>().map_err(|e| format!("bad Z '{z}': {e}"))?;
    Ok(ChunkCoord::new(x, z))
}

/// Logs a progress line at most once per interval.
struct LogProgress {
    every: Duration,
    last: Option<Instant>,
}

impl ProgressSink for LogProgress {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        let now = Instant::now();
        if self.last.is_some_and(|last| now.duration_since(last) < self.every) {
            return;
        }
        self.last = Some(now);
        tracing::info!("{snapshot}");
    }

    fn on_state(&mut self, state: JobState) {
        tracing::info!(%state, "Job state changed");
    }
}

fn print_report(report: &JobReport) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    LITHOS PREGENERATION REPORT");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  State:     {}", report.state);
    println!("  Chunks:    {}", report.total);
    println!("  Completed: {} ({} skipped)", report.completed, report.skipped);
    println!("  Failed:    {}", report.failed);
    println!("  Elapsed:   {:.2}s", report.elapsed.as_secs_f64());
    if let Some(error) = &report.error {
        println!("  Error:     {error}");
    }
    for (coord, error) in report.failed_coords.iter().take(10) {
        println!("    ✗ {coord}: {error}");
    }
    if report.failed_coords.len() > 10 {
        println!("    ... and {} more", report.failed_coords.len() - 10);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match &args.config {
        Some(path) => match LithosConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => LithosConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.concurrency.pregen_threads = threads;
    }
    if let Some(seed) = args.seed {
        config.world.seed = WorldSeed::new(seed);
    }

    let task = config
        .radius_task(args.center, args.radius)
        .with_order(args.order);
    tracing::info!(
        world = %config.world.name,
        seed = config.world.seed.value(),
        threads = config.threads(),
        method = ?args.method,
        "LITHOS pregeneration"
    );

    let engine = config.engine();
    let sinks: Sinks = vec![Box::new(LogProgress {
        every: config.job_config().tick_interval.max(Duration::from_secs(1)),
        last: None,
    })];
    let started = match args.method {
        MethodKind::Headless => toolbelt::pregenerate_headless(task, engine, &config, sinks),
        MethodKind::Hybrid => {
            let mut world = MemoryWorld::new(config.world.name.clone(), engine);
            if let Some(radius) = config.border.limit() {
                world = world.with_border(config.border.center, radius);
            }
            toolbelt::pregenerate_world(task, world, &config, sinks)
        }
    };
    let job = match started {
        Ok(job) => job,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let report = job.wait();
    print_report(&report);

    if report.state == JobState::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
