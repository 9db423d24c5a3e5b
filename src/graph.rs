//! In-memory views over the task dependency edge set.
//!
//! An edge `(task, depends_on)` points from the dependent task to the task it
//! waits on. Every algorithm here works on a snapshot loaded inside one read
//! transaction, so results never mix two states of the store.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::domain::{DependencyType, ItemStatus};

/// Hop limit for transitive dependency walks; deeper tasks are omitted.
pub const TRANSITIVE_DEPTH_LIMIT: usize = 10;
/// Number of tasks reported by the critical path query.
pub const CRITICAL_PATH_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub task_id: i64,
    pub depends_on: i64,
    pub kind: DependencyType,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    forward: BTreeMap<i64, Vec<(i64, DependencyType)>>,
    reverse: BTreeMap<i64, Vec<(i64, DependencyType)>>,
}

impl DependencyGraph {
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            graph
                .forward
                .entry(edge.task_id)
                .or_default()
                .push((edge.depends_on, edge.kind));
            graph
                .reverse
                .entry(edge.depends_on)
                .or_default()
                .push((edge.task_id, edge.kind));
        }
        graph
    }

    /// True when `to` can be reached from `from` by following depends-on
    /// edges of any type.
    pub fn reaches(&self, from: i64, to: i64) -> bool {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for (next, _) in self.forward.get(&current).into_iter().flatten() {
                if !visited.contains(next) {
                    queue.push_back(*next);
                }
            }
        }
        false
    }

    /// Adding `task_id -> depends_on` closes a cycle iff `depends_on` already
    /// reaches `task_id`.
    pub fn would_create_cycle(&self, task_id: i64, depends_on: i64) -> bool {
        task_id == depends_on || self.reaches(depends_on, task_id)
    }

    /// Tasks reachable from `task_id` within `max_depth` hops, each with its
    /// shortest hop count, ordered by depth then id. The start task is never
    /// reported.
    pub fn transitive_dependencies(&self, task_id: i64, max_depth: usize) -> Vec<(i64, usize)> {
        let mut seen = BTreeSet::from([task_id]);
        let mut found = Vec::new();
        let mut frontier = vec![task_id];
        for depth in 1..=max_depth {
            let mut level = BTreeSet::new();
            for current in &frontier {
                for (next, _) in self.forward.get(current).into_iter().flatten() {
                    if seen.insert(*next) {
                        level.insert(*next);
                    }
                }
            }
            if level.is_empty() {
                break;
            }
            found.extend(level.iter().map(|id| (*id, depth)));
            frontier = level.into_iter().collect();
        }
        found
    }

    /// Splits the open tasks of `statuses` into `(unblocked, blocked)`. A task
    /// is blocked by a `blocks` edge to a known task that is neither finished
    /// nor canceled; edges to tasks absent from `statuses` are ignored.
    pub fn split_blocked(&self, statuses: &BTreeMap<i64, ItemStatus>) -> (Vec<i64>, Vec<i64>) {
        let mut unblocked = Vec::new();
        let mut blocked = Vec::new();
        for (id, status) in statuses {
            if !status.is_open() {
                continue;
            }
            let outstanding = self
                .forward
                .get(id)
                .into_iter()
                .flatten()
                .filter(|(_, kind)| kind.is_blocking())
                .any(|(target, _)| {
                    statuses
                        .get(target)
                        .is_some_and(|target_status| !target_status.is_resolved())
                });
            if outstanding {
                blocked.push(*id);
            } else {
                unblocked.push(*id);
            }
        }
        (unblocked, blocked)
    }

    /// Longest `blocks` chain ending at each task. Tasks that wait on nothing
    /// sit at depth 0; a dependent sits one level past the deepest task it
    /// waits on. Ordered by depth descending, then id.
    pub fn critical_depths(&self, task_ids: &[i64]) -> Vec<(i64, usize)> {
        let known: BTreeSet<i64> = task_ids.iter().copied().collect();
        let mut best: BTreeMap<i64, usize> = known
            .iter()
            .filter(|id| !self.has_blocking_dependency(**id, &known))
            .map(|id| (*id, 0))
            .collect();

        let mut frontier: Vec<i64> = best.keys().copied().collect();
        let mut rounds = 0;
        while !frontier.is_empty() && rounds < known.len() {
            rounds += 1;
            let mut next_frontier = BTreeSet::new();
            for current in frontier {
                let depth = best.get(&current).copied().unwrap_or_default() + 1;
                let dependents = self.reverse.get(&current).into_iter().flatten();
                for (dependent, kind) in dependents {
                    if !kind.is_blocking() || !known.contains(dependent) {
                        continue;
                    }
                    let slot = best.entry(*dependent).or_insert(0);
                    if depth > *slot {
                        *slot = depth;
                        next_frontier.insert(*dependent);
                    }
                }
            }
            frontier = next_frontier.into_iter().collect();
        }

        let mut depths: Vec<(i64, usize)> = best.into_iter().collect();
        depths.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        depths
    }

    fn has_blocking_dependency(&self, task_id: i64, known: &BTreeSet<i64>) -> bool {
        self.forward
            .get(&task_id)
            .into_iter()
            .flatten()
            .any(|(target, kind)| kind.is_blocking() && known.contains(target))
    }
}
