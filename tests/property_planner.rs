// tests/property_planner.rs

//! Property tests for the planner: every plan over a randomly generated
//! DAG must be topologically valid and contain exactly the dependency
//! closure of the selection.

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};

use std::collections::HashSet;

use proptest::prelude::*;

use pipedag::config::ConfigFile;
use pipedag::dag::Planner;
use pipedag::registry::FrozenRegistry;

// Strategy to generate a valid DAG configuration.
// We ensure acyclicity by only allowing task N to depend on tasks 0..N-1.
fn dag_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut builder = ConfigFileBuilder::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{}", i);
                let mut task_builder = TaskConfigBuilder::new(&format!("echo {}", name));

                // Sanitize dependencies: only allow deps < i
                let mut valid_deps = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid_deps.insert(dep_idx % i);
                    }
                }

                for dep_idx in valid_deps {
                    task_builder = task_builder.dep(&format!("task_{}", dep_idx));
                }
                builder = builder.with_task(&name, task_builder.build());
            }
            builder.build()
        })
    })
}

fn transitive_deps(registry: &FrozenRegistry, root: &str) -> HashSet<String> {
    let mut closure = HashSet::new();
    let mut stack = vec![root.to_string()];
    while let Some(name) = stack.pop() {
        if !closure.insert(name.clone()) {
            continue;
        }
        if let Ok(task) = registry.get(&name) {
            stack.extend(task.deps.iter().cloned());
        }
    }
    closure
}

proptest! {
    #[test]
    fn plans_are_topologically_valid(cfg in dag_config_strategy(9)) {
        let registry = FrozenRegistry::from_config(&cfg).unwrap();
        let planner = Planner::new(&registry);

        let all: Vec<String> = registry.names().map(|s| s.to_string()).collect();
        let plan = planner.plan(&all).unwrap();

        prop_assert_eq!(plan.len(), all.len());

        for (pos, name) in plan.order().iter().enumerate() {
            let task = registry.get(name).unwrap();
            for dep in task.deps.iter() {
                let dep_pos = plan.order().iter().position(|n| n == dep);
                prop_assert!(
                    matches!(dep_pos, Some(p) if p < pos),
                    "dependency '{}' does not precede '{}'", dep, name
                );
            }
        }
    }

    #[test]
    fn single_selection_plans_exactly_the_dependency_closure(
        cfg in dag_config_strategy(9),
        pick in 0..9usize,
    ) {
        let registry = FrozenRegistry::from_config(&cfg).unwrap();
        let planner = Planner::new(&registry);

        let names: Vec<String> = registry.names().map(|s| s.to_string()).collect();
        let root = names[pick % names.len()].clone();

        let plan = planner.plan(&[root.as_str()]).unwrap();
        let expected = transitive_deps(&registry, &root);

        let planned: HashSet<String> = plan.order().iter().cloned().collect();
        prop_assert_eq!(planned, expected);
    }
}
