mod cli;
mod demo;
mod schedule;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use memfuse_backend_eager::{EagerAot, EagerBackend};
use memfuse_core::{AotCompiler, HasherType, PartitionStrategy, StaticRank};
use memfuse_engine::{bind_parameters, FusionEngine, FusionOptions};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            shapes,
            repeat,
            alpha,
            partition,
            hasher,
            rank,
            world_size,
            log,
        } => {
            let options = FusionOptions::default()
                .with_partition(partition.parse::<PartitionStrategy>()?)
                .with_hasher(hasher.parse::<HasherType>()?);
            let coordinator = resolve_rank(rank, world_size, StaticRank::from_env)?;
            run(&shapes, repeat, alpha, options, coordinator, log)
        }
        Command::Shapes { shapes } => print_shapes(&shapes),
    }
}

fn run(
    shapes: &str,
    repeat: usize,
    alpha: f64,
    options: FusionOptions,
    coordinator: StaticRank,
    log: String,
) -> Result<()> {
    std::env::set_var("RUST_LOG", &log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let schedule = schedule::parse_schedule(shapes)?;

    let aot = Arc::new(EagerAot::new());
    let mut engine = FusionEngine::new(
        demo::add_module(),
        Arc::clone(&aot) as Arc<dyn AotCompiler>,
        Arc::new(EagerBackend::new()),
        Arc::new(EagerBackend::new()),
    )
    .with_options(options)
    .with_coordinator(coordinator);
    engine.fuse();

    let mut calls = 0usize;
    for round in 0..repeat {
        for (i, call) in schedule.iter().enumerate() {
            let out = engine
                .forward(demo::call_args(call, alpha))
                .with_context(|| format!("call {i} of round {round} failed"))?;
            calls += 1;
            println!(
                "call {calls}: {} first={:?}",
                memfuse_engine::extract_shapes(&out),
                demo::first_value(&out)
            );
        }
    }

    tracing::info!(
        calls,
        compiles = aot.compile_count(),
        distinct_shapes = engine.cache().len(),
        "run finished"
    );
    println!(
        "calls={calls} compile_requests={} distinct_shapes={}",
        aot.compile_count(),
        engine.cache().len()
    );
    Ok(())
}

fn print_shapes(shapes: &str) -> Result<()> {
    let schedule = schedule::parse_schedule(shapes)?;
    let module = demo::add_module();
    for (i, call) in schedule.iter().enumerate() {
        let binding = bind_parameters(module.signature(), &demo::call_args(call, 1.0));
        println!("call {}: {}", i + 1, binding.shape_structure());
    }
    Ok(())
}

/// Flags win per field; anything not given comes from `from_env`, which is
/// only consulted when a flag is missing.
fn resolve_rank<F>(
    rank: Option<usize>,
    world_size: Option<usize>,
    from_env: F,
) -> Result<StaticRank>
where
    F: FnOnce() -> Result<StaticRank>,
{
    if let (Some(rank), Some(world_size)) = (rank, world_size) {
        return Ok(StaticRank::new(rank, world_size));
    }
    let env = from_env()?;
    Ok(StaticRank::new(
        rank.unwrap_or(env.rank),
        world_size.unwrap_or(env.world_size),
    ))
}
