// tests/config_behaviour.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use pipedag::config::load_and_validate;
use pipedag::dag::Planner;
use pipedag::registry::FrozenRegistry;

#[test]
fn full_config_round_trips_defaults_and_values() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pool.db]
capacity = 2

[task.load]
cmd = "echo load"
pool = "db"

[task.transform]
cmd = "echo transform"
deps = ["load"]
pool = "db"
retry = {{ max_attempts = 3, delay_ms = 250 }}

[selection.nightly]
tasks = ["transform"]
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.pool["db"].capacity, 2);
    assert_eq!(cfg.task.len(), 2);

    let load = &cfg.task["load"];
    assert!(load.deps.is_empty());
    assert_eq!(load.pool.as_deref(), Some("db"));
    assert!(load.retry.is_none());

    let transform = &cfg.task["transform"];
    assert_eq!(transform.deps, vec!["load"]);

    let retry = transform.retry.as_ref().unwrap();
    assert_eq!(retry.max_attempts, 3);
    assert_eq!(retry.delay_ms, 250);
    // Unset fields fall back to a fixed delay with the default cap.
    assert_eq!(retry.factor, 1.0);
    assert_eq!(retry.max_delay_ms, 60_000);

    let policy = transform.retry_policy().unwrap();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay, Duration::from_millis(250));
    assert_eq!(policy.delay_for(1), Duration::from_millis(250));
    assert_eq!(policy.delay_for(2), Duration::from_millis(250));

    assert_eq!(cfg.selection["nightly"].tasks, vec!["transform"]);
}

#[test]
fn backoff_factor_grows_and_clamps_the_delay() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.flaky]
cmd = "echo flaky"
retry = {{ max_attempts = 5, delay_ms = 100, factor = 2.0, max_delay_ms = 300 }}
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    let policy = cfg.task["flaky"].retry_policy().unwrap();

    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    // 400ms exceeds the cap.
    assert_eq!(policy.delay_for(3), Duration::from_millis(300));
    assert_eq!(policy.delay_for(10), Duration::from_millis(300));
}

/// The shipped loan-warehouse pipeline stays loadable and plannable.
#[test]
fn shipped_pipeline_config_plans_end_to_end() {
    let cfg = load_and_validate("Pipedag.toml").unwrap();
    let registry = FrozenRegistry::from_config(&cfg).unwrap();
    let planner = Planner::new(&registry);

    // Planning the extract pulls in the whole warehouse build.
    let plan = planner.plan(&["loan_data_parquet"]).unwrap();

    assert_eq!(plan.order().first().map(String::as_str), Some("raw_loan_data"));
    assert_eq!(
        plan.order().last().map(String::as_str),
        Some("loan_data_parquet")
    );
    assert!(plan.contains("stg_loan_data"));
    assert!(plan.contains("fct_loan_data"));
    assert!(plan.contains("dim_calendar"));
    assert!(plan.contains("dim_borrowers"));
    assert!(plan.contains("dim_loans"));

    // The named jobs from the config resolve to plannable selections.
    for (name, selection) in cfg.selection.iter() {
        let refs: Vec<&str> = selection.tasks.iter().map(String::as_str).collect();
        planner
            .plan(&refs)
            .unwrap_or_else(|e| panic!("selection '{name}' failed to plan: {e}"));
    }
}
