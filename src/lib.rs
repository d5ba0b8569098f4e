// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod retry;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{ExecutionPlan, Planner};
use crate::engine::{CoreRun, RunEvent, Runtime};
use crate::errors::{PipelineError, Result};
use crate::exec::{CommandExecutorBackend, PoolManager};
use crate::registry::FrozenRegistry;
use crate::store::{ResultStore, RunReport, RunStatus, TaskStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - registry / planner
/// - pools / executor / runtime
/// - Ctrl-C handling
///
/// Planning-time errors abort before any task starts; execution-time
/// failures are reflected in the returned [`RunStatus`], never raised.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let registry = FrozenRegistry::from_config(&cfg)?;
    let selection = resolve_selection(&cfg, &registry, &args)?;

    let planner = Planner::new(&registry);
    let plan = planner.plan(&selection)?;

    if args.dry_run {
        print_dry_run(&cfg, &plan);
        return Ok(RunStatus::Succeeded);
    }

    let report = run_plan(&registry, &plan, &cfg).await?;
    print_summary(&report);

    Ok(report.overall())
}

/// Execute a plan with the production command executor.
pub async fn run_plan(
    registry: &FrozenRegistry,
    plan: &ExecutionPlan,
    cfg: &ConfigFile,
) -> Result<RunReport> {
    let pools = Arc::new(PoolManager::from_config(cfg)?);

    // Run event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RunEvent>(64);

    // Process executor backend (real implementation in production).
    let executor = CommandExecutorBackend::new(rt_tx.clone(), pools);

    // Ctrl-C → abort between tasks.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RunEvent::AbortRequested).await;
        });
    }

    info!(tasks = plan.len(), "executing plan");

    let core = CoreRun::new(registry, plan)?;
    let store = ResultStore::new(plan);
    let runtime = Runtime::new(core, store, rt_rx, executor);
    runtime.run().await
}

/// Resolve the requested task selection from CLI args and config.
///
/// `--job NAME` looks up `[selection.NAME]`; `--select` names tasks
/// directly; with neither, every registered task is selected.
fn resolve_selection(
    cfg: &ConfigFile,
    registry: &FrozenRegistry,
    args: &CliArgs,
) -> Result<Vec<String>> {
    if let Some(ref job) = args.job {
        let selection = cfg.selection.get(job).ok_or_else(|| {
            PipelineError::Config(format!("unknown selection '{job}' (no [selection.{job}])"))
        })?;
        return Ok(selection.tasks.clone());
    }

    if !args.select.is_empty() {
        return Ok(args.select.clone());
    }

    Ok(registry.names().map(|s| s.to_string()).collect())
}

/// Dry-run output: print the resolved plan with deps, pools and retries.
fn print_dry_run(cfg: &ConfigFile, plan: &ExecutionPlan) {
    println!("pipedag dry-run");
    println!();

    println!("plan ({} tasks):", plan.len());
    for (i, name) in plan.iter().enumerate() {
        let Some(task) = cfg.task.get(name) else {
            continue;
        };
        println!("  {}. {name}", i + 1);
        println!("      cmd: {}", task.cmd);
        if !task.deps.is_empty() {
            println!("      deps: {:?}", task.deps);
        }
        if let Some(ref pool) = task.pool {
            println!("      pool: {pool}");
        }
        if let Some(ref retry) = task.retry {
            println!(
                "      retry: max_attempts={} delay_ms={}",
                retry.max_attempts, retry.delay_ms
            );
        }
    }
}

/// Final run summary printed to stdout.
fn print_summary(report: &RunReport) {
    println!("pipedag run: {:?}", report.overall());
    for result in report.results() {
        match result.status {
            TaskStatus::Succeeded => {
                println!("  ok      {} (attempts: {})", result.name, result.attempts);
            }
            TaskStatus::Failed => {
                println!(
                    "  failed  {} (attempts: {}): {}",
                    result.name,
                    result.attempts,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            TaskStatus::Skipped => {
                println!("  skipped {}", result.name);
            }
        }
    }
}
