// src/exec/task_runner.rs

//! Individual task execution: pool slot, attempt loop, process handling.

use std::process::Stdio;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{DispatchTask, RunEvent, TaskOutcome};
use crate::errors::PipelineError;
use crate::exec::pools::PoolManager;

/// How many trailing stderr lines are kept as the failure detail.
const STDERR_TAIL_LINES: usize = 20;

/// Run a single task to a terminal outcome and emit a `TaskCompleted` event.
///
/// The pool slot is acquired once, held across the whole attempt loop
/// (retries do not re-acquire), and released when this function returns.
pub async fn run_task(
    task: DispatchTask,
    pools: Arc<PoolManager>,
    runtime_tx: mpsc::Sender<RunEvent>,
) {
    let _permit = match pools.acquire(task.pool.as_deref()).await {
        Ok(permit) => permit,
        Err(err) => {
            // Misconfigured pool reference; the task cannot run at all.
            let now = SystemTime::now();
            let _ = runtime_tx
                .send(RunEvent::TaskCompleted {
                    task: task.name.clone(),
                    outcome: TaskOutcome::Failed {
                        exit_code: -1,
                        detail: err.to_string(),
                    },
                    attempts: 0,
                    started_at: now,
                    finished_at: now,
                })
                .await;
            return;
        }
    };

    let policy = task.retry.unwrap_or_default();
    let started_at = SystemTime::now();
    let mut attempt: u32 = 1;

    let outcome = loop {
        match run_attempt(&task, attempt).await {
            Ok(()) => break TaskOutcome::Success,
            Err(failure) => {
                if policy.attempts_remain(attempt) {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        task = %task.name,
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed; retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                } else {
                    break TaskOutcome::Failed {
                        exit_code: failure.exit_code,
                        detail: failure.detail,
                    };
                }
            }
        }
    };

    let finished_at = SystemTime::now();
    let _ = runtime_tx
        .send(RunEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
            attempts: attempt,
            started_at,
            finished_at,
        })
        .await;
    // Pool permit drops here, after the terminal outcome.
}

/// A single failed attempt: the exit code and captured error detail.
struct AttemptFailure {
    exit_code: i32,
    detail: String,
}

/// Run one attempt of the task's command.
async fn run_attempt(task: &DispatchTask, attempt: u32) -> Result<(), AttemptFailure> {
    info!(
        task = %task.name,
        attempt,
        cmd = %task.cmd,
        "starting task process"
    );

    match run_process(task).await {
        Ok(ProcessOutput {
            exit_code,
            success: true,
            ..
        }) => {
            info!(task = %task.name, attempt, exit_code, "task process exited successfully");
            Ok(())
        }
        Ok(ProcessOutput {
            exit_code,
            stderr_tail,
            ..
        }) => {
            warn!(task = %task.name, attempt, exit_code, "task process failed");
            Err(AttemptFailure {
                exit_code,
                detail: stderr_tail,
            })
        }
        Err(err) => {
            let wrapped = PipelineError::TaskExecution {
                task: task.name.clone(),
                detail: format!("{err:#}"),
            };
            warn!(task = %task.name, attempt, error = %wrapped, "task process could not run");
            Err(AttemptFailure {
                exit_code: -1,
                detail: wrapped.to_string(),
            })
        }
    }
}

struct ProcessOutput {
    success: bool,
    exit_code: i32,
    stderr_tail: String,
}

/// Spawn the shell process, stream its output, and wait for exit.
async fn run_process(task: &DispatchTask) -> anyhow::Result<ProcessOutput> {
    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.cmd);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.name))?;

    // Stream stdout at debug so task output stays visible in logs.
    if let Some(stdout) = child.stdout.take() {
        let task_name = task.name.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stdout: {}", line);
            }
        });
    }

    // Consume stderr fully, keeping the tail as failure detail.
    let stderr_handle = child.stderr.take().map(|stderr| {
        let task_name = task.name.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }

            tail.join("\n")
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.name))?;

    let stderr_tail = match stderr_handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };

    Ok(ProcessOutput {
        success: status.success(),
        exit_code: status.code().unwrap_or(-1),
        stderr_tail,
    })
}
