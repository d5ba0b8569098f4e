// tests/common/mod.rs

#![allow(dead_code)]
#![allow(unused_imports)]

pub use pipedag_test_utils::builders;
pub use pipedag_test_utils::{init_tracing, with_timeout};

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use pipedag::config::ConfigFile;
use pipedag::dag::Planner;
use pipedag::engine::{CoreRun, RunEvent, Runtime};
use pipedag::registry::FrozenRegistry;
use pipedag::store::{ResultStore, RunReport};
use pipedag_test_utils::fake_executor::FakeExecutor;

/// Plan `selection` over `cfg` and run it with a [`FakeExecutor`] where the
/// given tasks are scripted to fail. Returns the report plus the list of
/// tasks the executor actually "ran", in dispatch order.
pub async fn run_with_fake(
    cfg: &ConfigFile,
    selection: &[&str],
    failing: &[&str],
) -> (RunReport, Vec<String>) {
    let registry = FrozenRegistry::from_config(cfg).expect("valid config");
    let planner = Planner::new(&registry);
    let plan = planner.plan(selection).expect("plannable selection");

    let (rt_tx, rt_rx) = mpsc::channel::<RunEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));

    let mut executor = FakeExecutor::new(rt_tx.clone(), executed.clone());
    for name in failing {
        executor = executor.failing_task(name);
    }

    let core = CoreRun::new(&registry, &plan).expect("core construction");
    let store = ResultStore::new(&plan);
    let runtime = Runtime::new(core, store, rt_rx, executor);

    let report = runtime.run().await.expect("run completes");
    let executed = executed.lock().unwrap().clone();
    (report, executed)
}
