// tests/error_handling.rs

use std::io::Write;

use tempfile::NamedTempFile;

use pipedag::config::load_and_validate;
use pipedag::errors::PipelineError;
use pipedag::registry::{Task, TaskRegistry};

#[test]
fn dag_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"
deps = ["B"]

[task.B]
cmd = "echo B"
deps = ["A"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(PipelineError::CyclicDependency(name)) => {
            assert!(name == "A" || name == "B");
        }
        Err(e) => panic!("Expected CyclicDependency error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"
deps = ["NonExistent"]
"#
    )
    .unwrap();

    let result = load_and_validate(file.path());

    match result {
        Err(PipelineError::Config(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected Config error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"
deps = ["A"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::Config(msg)) => assert!(msg.contains("depend on itself")),
        other => panic!("Expected Config error, got: {:?}", other),
    }
}

#[test]
fn unknown_pool_reference_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"
pool = "db"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::Config(msg)) => {
            assert!(msg.contains("unknown pool"));
            assert!(msg.contains("db"));
        }
        other => panic!("Expected Config error, got: {:?}", other),
    }
}

#[test]
fn zero_capacity_pool_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pool.db]
capacity = 0

[task.A]
cmd = "echo A"
pool = "db"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::PoolCapacity { name, capacity }) => {
            assert_eq!(name, "db");
            assert_eq!(capacity, 0);
        }
        other => panic!("Expected PoolCapacity error, got: {:?}", other),
    }
}

#[test]
fn zero_max_attempts_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"
retry = {{ max_attempts = 0, delay_ms = 100 }}
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::Config(msg)) => assert!(msg.contains("max_attempts")),
        other => panic!("Expected Config error, got: {:?}", other),
    }
}

#[test]
fn config_without_tasks_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pool.db]
capacity = 1
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::Config(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected Config error, got: {:?}", other),
    }
}

#[test]
fn selection_with_unknown_task_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[task.A]
cmd = "echo A"

[selection.broken]
tasks = ["A", "Missing"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(PipelineError::Config(msg)) => {
            assert!(msg.contains("broken"));
            assert!(msg.contains("Missing"));
        }
        other => panic!("Expected Config error, got: {:?}", other),
    }
}

#[test]
fn duplicate_registration_is_rejected() {
    let task = |name: &str| Task {
        name: name.to_string(),
        cmd: "true".to_string(),
        deps: vec![],
        pool: None,
        retry: None,
    };

    let mut registry = TaskRegistry::new();
    registry.register(task("A")).unwrap();

    match registry.register(task("A")) {
        Err(PipelineError::DuplicateTask(name)) => assert_eq!(name, "A"),
        other => panic!("Expected DuplicateTask, got: {:?}", other),
    }
}

#[test]
fn freeze_rejects_unresolved_dependency_names() {
    let mut registry = TaskRegistry::new();
    registry
        .register(Task {
            name: "A".to_string(),
            cmd: "true".to_string(),
            deps: vec!["ghost".to_string()],
            pool: None,
            retry: None,
        })
        .unwrap();

    match registry.freeze() {
        Err(PipelineError::UnknownTask(name)) => assert_eq!(name, "ghost"),
        other => panic!("Expected UnknownTask, got: {:?}", other),
    }
}

#[test]
fn registry_get_reports_unknown_names() {
    let registry = TaskRegistry::new();
    match registry.get("nope") {
        Err(PipelineError::UnknownTask(name)) => assert_eq!(name, "nope"),
        other => panic!("Expected UnknownTask, got: {:?}", other),
    }
}
