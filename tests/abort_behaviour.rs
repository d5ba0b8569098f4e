// tests/abort_behaviour.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use pipedag::dag::Planner;
use pipedag::engine::{CoreRun, RunEvent, Runtime};
use pipedag::registry::FrozenRegistry;
use pipedag::store::{ResultStore, RunStatus, TaskStatus};
use pipedag_test_utils::fake_executor::FakeExecutor;

type TestResult = Result<(), Box<dyn Error>>;

/// An abort request seen after the roots were dispatched: the running root
/// finishes and is recorded normally, every pending task is skipped.
#[tokio::test]
async fn abort_skips_pending_tasks_and_lets_running_ones_finish() -> TestResult {
    with_timeout(async {
        init_tracing();

        let cfg = ConfigFileBuilder::new()
            .with_task("A", TaskConfigBuilder::new("echo A").build())
            .with_task("B", TaskConfigBuilder::new("echo B").dep("A").build())
            .with_task("C", TaskConfigBuilder::new("echo C").dep("B").build())
            .build();

        let registry = FrozenRegistry::from_config(&cfg)?;
        let planner = Planner::new(&registry);
        let plan = planner.plan(&["C"])?;

        let (rt_tx, rt_rx) = mpsc::channel::<RunEvent>(64);
        let executed = Arc::new(Mutex::new(Vec::new()));
        let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

        // Seed the abort before the runtime starts consuming events. The
        // fake executor completes A right after dispatch, so the event
        // order is: abort, then A's completion.
        rt_tx.send(RunEvent::AbortRequested).await?;

        let core = CoreRun::new(&registry, &plan)?;
        let store = ResultStore::new(&plan);
        let runtime = Runtime::new(core, store, rt_rx, executor);

        let report = runtime.run().await?;

        assert_eq!(report.overall(), RunStatus::Failed);
        assert_eq!(report.get("A")?.unwrap().status, TaskStatus::Succeeded);
        assert_eq!(report.get("B")?.unwrap().status, TaskStatus::Skipped);
        assert_eq!(report.get("C")?.unwrap().status, TaskStatus::Skipped);

        let executed = executed.lock().unwrap().clone();
        assert_eq!(executed, vec!["A"]);

        Ok(())
    })
    .await
}
