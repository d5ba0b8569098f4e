// src/dag/planner.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::dag::plan::ExecutionPlan;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::registry::FrozenRegistry;

/// Computes execution plans over a frozen registry.
///
/// Planning expands a requested selection to the transitive closure of its
/// dependencies, then runs Kahn's algorithm over the induced subgraph.
/// When several tasks are ready at the same step, registration order wins,
/// so the same registry and selection always produce the same plan.
#[derive(Debug)]
pub struct Planner<'a> {
    registry: &'a FrozenRegistry,
    graph: DagGraph,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a FrozenRegistry) -> Self {
        let graph = DagGraph::from_registry(registry);
        Self { registry, graph }
    }

    /// Compute an [`ExecutionPlan`] for the given selection of task names.
    ///
    /// - Every selected name must be registered, else [`PipelineError::UnknownTask`].
    /// - The selection must be non-empty, else [`PipelineError::Config`].
    /// - A cycle in the induced subgraph yields [`PipelineError::CyclicDependency`]
    ///   naming one member of the cycle, chosen deterministically.
    pub fn plan<S: AsRef<str>>(&self, selection: &[S]) -> Result<ExecutionPlan> {
        if selection.is_empty() {
            return Err(PipelineError::Config(
                "selection must name at least one task".to_string(),
            ));
        }

        for name in selection {
            if !self.registry.contains(name.as_ref()) {
                return Err(PipelineError::UnknownTask(name.as_ref().to_string()));
            }
        }

        let closure = self.dependency_closure(selection);
        let order = self.topo_sort(&closure)?;

        debug!(tasks = order.len(), "planned execution order");

        Ok(ExecutionPlan::new(order))
    }

    /// All tasks reachable from the selection by following dependencies.
    fn dependency_closure<S: AsRef<str>>(&self, selection: &[S]) -> HashSet<TaskName> {
        let mut stack: Vec<TaskName> = selection
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let mut closure: HashSet<TaskName> = HashSet::new();

        while let Some(name) = stack.pop() {
            if !closure.insert(name.clone()) {
                continue;
            }
            for dep in self.graph.dependencies_of(&name).iter().cloned() {
                stack.push(dep);
            }
        }

        closure
    }

    /// Kahn's algorithm over the induced subgraph, tie-broken by
    /// registration index.
    fn topo_sort(&self, closure: &HashSet<TaskName>) -> Result<Vec<TaskName>> {
        let mut indegree: HashMap<&str, usize> = HashMap::new();
        for name in closure {
            let within = self
                .graph
                .dependencies_of(name)
                .iter()
                .filter(|d| closure.contains(d.as_str()))
                .count();
            indegree.insert(name.as_str(), within);
        }

        // Min-heap on registration index keeps the ready set deterministic.
        let mut ready: BinaryHeap<Reverse<(usize, &str)>> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(name, _)| Reverse((self.index_of(name), *name)))
            .collect();

        let mut order: Vec<TaskName> = Vec::with_capacity(closure.len());

        while let Some(Reverse((_, name))) = ready.pop() {
            order.push(name.to_string());

            for dependent in self.graph.dependents_of(name) {
                let Some(deg) = indegree.get_mut(dependent.as_str()) else {
                    // Dependent outside the closure; not part of this plan.
                    continue;
                };
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse((self.index_of(dependent), dependent.as_str())));
                }
            }
        }

        if order.len() < closure.len() {
            // Some tasks never reached indegree 0: the induced subgraph has
            // a cycle among the remaining tasks.
            let remaining: HashSet<&str> = indegree
                .iter()
                .filter(|(_, deg)| **deg > 0)
                .map(|(name, _)| *name)
                .collect();
            return Err(PipelineError::CyclicDependency(
                self.find_cycle_member(&remaining),
            ));
        }

        Ok(order)
    }

    /// Walk dependencies among the remaining tasks until one repeats.
    ///
    /// Every remaining task still has at least one remaining dependency, so
    /// the walk cannot terminate without revisiting a node, and the
    /// revisited node lies on a cycle. Starting from the smallest
    /// registration index keeps the reported member stable.
    fn find_cycle_member(&self, remaining: &HashSet<&str>) -> String {
        let Some((_, start)) = remaining
            .iter()
            .map(|name| (self.index_of(name), *name))
            .min()
        else {
            return String::new();
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = start;

        loop {
            if !seen.insert(current) {
                return current.to_string();
            }

            match self
                .graph
                .dependencies_of(current)
                .iter()
                .find(|dep| remaining.contains(dep.as_str()))
            {
                Some(next) => current = next.as_str(),
                // Unreachable for a well-formed remaining set; bail with
                // the current node rather than loop forever.
                None => return current.to_string(),
            }
        }
    }

    fn index_of(&self, name: &str) -> usize {
        self.registry.registration_index(name).unwrap_or(usize::MAX)
    }
}
