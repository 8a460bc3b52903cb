// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::engine::{Orchestrator, Runtime, RuntimeEvent};
use crate::exec::RealProcessRunner;
use crate::fs::RealFileSystem;
use crate::pipeline::{Pipeline, PlanStep};
use crate::types::Trigger;
use crate::watch::{WatchFilter, WatchOptions, ensure_watch_dir, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the stage pipeline and orchestrator
/// - Ctrl-C handling (installed before anything is launched)
/// - the initial pass
/// - the file watcher (started once the initial pass has settled)
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.is_some();
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let cfg = load_or_default(&config_path, explicit)
        .with_context(|| format!("loading config {:?}", config_path))?;
    let root = config_root_dir(&config_path);
    let modes = args.modes();

    let pipeline = Pipeline::new(&cfg, modes, &root);

    if args.dry_run {
        print_dry_run(&cfg, &pipeline);
        return Ok(());
    }

    let watch_options = WatchOptions {
        root: root.clone(),
        watch_dir: root.join(&cfg.project.source_dir),
        filter: WatchFilter::from_config(&cfg)?,
        use_hash: cfg.watch.use_hash,
    };
    if !args.once {
        ensure_watch_dir(&RealFileSystem, &watch_options.watch_dir)?;
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Ctrl-C → graceful shutdown, from the first process we launch on.
    spawn_ctrl_c_listener(rt_tx.clone());
    tokio::task::yield_now().await;

    let orchestrator = Orchestrator::new(pipeline, RealProcessRunner::new());
    let mut runtime = Runtime::new(orchestrator, rt_rx);

    let Some(initial) = runtime.initial_pass().await else {
        return Ok(());
    };
    let initial_failed = initial.report().is_some_and(|r| r.has_failures());

    if args.once {
        if let Some(outcome) = runtime.wait_for_program().await {
            info!(?outcome, "program exited");
        }
        if initial_failed {
            bail!("one or more stages failed");
        }
        return Ok(());
    }

    // main exits the process on error, so stop the program before returning.
    let _watcher_handle = match spawn_watcher(watch_options, rt_tx.clone()) {
        Ok(handle) => handle,
        Err(err) => {
            runtime.shutdown().await;
            return Err(err.into());
        }
    };

    runtime.run().await?;
    Ok(())
}

fn spawn_ctrl_c_listener(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "app/Devloop.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Devloop.toml" (parent = ""),
///   we fall back to the current working directory "."
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the resolved settings and the initial pass plan.
fn print_dry_run(cfg: &ConfigFile, pipeline: &Pipeline) {
    let layout = pipeline.layout();
    let modes = pipeline.modes();

    println!("devloop dry-run");
    println!("  root = {}", layout.root.display());
    println!("  source_dir = {}", layout.source_dir);
    println!("  dist_dir = {}", layout.dist_dir);
    println!("  entry = {}", layout.entry);
    println!("  test_marker = {:?}", layout.test_marker);
    println!("  modes: compile = {}, build = {}", modes.compile, modes.build);
    if !cfg.watch.exclude.is_empty() {
        println!("  watch.exclude = {:?}", cfg.watch.exclude);
    }
    println!("  watch.use_hash = {}", cfg.watch.use_hash);
    println!();

    println!("stages:");
    for spec in pipeline.stages() {
        let state = if spec.enabled { "" } else { " (disabled)" };
        println!("  - {}: {}{}", spec.kind, spec.label, state);
        if !spec.extensions.is_empty() {
            println!("      extensions: {:?}", spec.extensions);
        }
    }
    println!();

    println!("initial pass:");
    for step in pipeline.plan(&Trigger::Initial).steps {
        match step {
            PlanStep::Execute { invocation, .. } => {
                println!("  run   {}: {}", invocation.label, invocation.command_line());
            }
            PlanStep::Skip { label, .. } => println!("  skip  {label}"),
            PlanStep::CancelPrevious => println!("  stop previous program (if running)"),
        }
    }

    debug!("dry-run complete (no execution)");
}
