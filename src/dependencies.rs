use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::AppError;
use crate::db::dependencies::{DependencyRecord, NewDependency};
use crate::db::tasks::TaskRecord;
use crate::db::{self, begin_read, begin_write};
use crate::domain::timestamp::now_utc_rfc3339;
use crate::domain::{CreatedBy, DependencyType, ItemRef};
use crate::graph::{DependencyGraph, Edge, CRITICAL_PATH_LIMIT, TRANSITIVE_DEPTH_LIMIT};

/// A task together with its distance in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAtDepth {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub depth: usize,
}

/// Owns every write to `task_dependencies` and the queries derived from it.
pub struct DependencyEngine<'a> {
    conn: &'a Connection,
}

impl<'a> DependencyEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Records that `task_id` depends on `depends_on_task_id`. The cycle check
    /// and the insert share one immediate transaction.
    pub fn add_dependency(
        &self,
        task_id: i64,
        depends_on_task_id: i64,
        dependency_type: DependencyType,
        created_by: Option<CreatedBy>,
    ) -> Result<i64, AppError> {
        if task_id == depends_on_task_id {
            return Err(AppError::ConstraintViolation(format!(
                "task {task_id} cannot depend on itself"
            )));
        }

        let tx = begin_write(self.conn).map_err(AppError::TransactionFailure)?;
        for id in [task_id, depends_on_task_id] {
            if !db::tasks::task_exists(&tx, id)? {
                return Err(AppError::not_found("task", id));
            }
        }
        if db::dependencies::find_dependency_between(&tx, task_id, depends_on_task_id)?.is_some() {
            return Err(AppError::ConstraintViolation(format!(
                "task {task_id} already depends on task {depends_on_task_id}"
            )));
        }

        let graph = load_graph(&tx)?;
        if graph.would_create_cycle(task_id, depends_on_task_id) {
            warn!(task_id, depends_on_task_id, "dependency rejected: cycle");
            return Err(AppError::CycleDetected {
                task_id,
                depends_on_task_id,
            });
        }

        let created_at = now_utc_rfc3339();
        let edge_id = db::dependencies::insert_dependency(
            &tx,
            &NewDependency {
                task_id,
                depends_on_task_id,
                dependency_type,
                created_by,
                created_at: &created_at,
            },
        )?;
        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(edge_id, task_id, depends_on_task_id, kind = %dependency_type, "dependency added");
        Ok(edge_id)
    }

    pub fn remove_dependency(&self, edge_id: i64) -> Result<(), AppError> {
        if db::dependencies::delete_dependency(self.conn, edge_id)? == 0 {
            return Err(AppError::not_found("dependency", edge_id));
        }
        info!(edge_id, "dependency removed");
        Ok(())
    }

    pub fn remove_dependency_between(
        &self,
        task_id: i64,
        depends_on_task_id: i64,
    ) -> Result<(), AppError> {
        let removed =
            db::dependencies::delete_dependency_between(self.conn, task_id, depends_on_task_id)?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "no dependency from task {task_id} on task {depends_on_task_id}"
            )));
        }
        info!(task_id, depends_on_task_id, "dependency removed");
        Ok(())
    }

    /// Raw edges touching `task_id` on either side.
    pub fn list_dependency_edges(&self, task_id: i64) -> Result<Vec<DependencyRecord>, AppError> {
        self.require_task(self.conn, task_id)?;
        Ok(db::dependencies::list_edges_of(self.conn, task_id)?)
    }

    pub fn direct_dependencies(&self, task_id: i64) -> Result<Vec<TaskRecord>, AppError> {
        self.require_task(self.conn, task_id)?;
        Ok(db::dependencies::list_direct_dependencies(self.conn, task_id)?)
    }

    pub fn dependents(&self, task_id: i64) -> Result<Vec<TaskRecord>, AppError> {
        self.require_task(self.conn, task_id)?;
        Ok(db::dependencies::list_direct_dependents(self.conn, task_id)?)
    }

    /// Everything `task_id` waits on, directly or not, up to
    /// [`TRANSITIVE_DEPTH_LIMIT`] hops. Deeper tasks are silently omitted.
    pub fn transitive_dependencies(&self, task_id: i64) -> Result<Vec<TaskAtDepth>, AppError> {
        let tx = begin_read(self.conn)?;
        self.require_task(&tx, task_id)?;
        let graph = load_graph(&tx)?;
        let reached = graph.transitive_dependencies(task_id, TRANSITIVE_DEPTH_LIMIT);
        debug!(task_id, reached = reached.len(), "transitive dependencies walked");
        let result = with_depths(&tx, &reached)?;
        tx.finish()?;
        Ok(result)
    }

    pub fn unblocked_tasks(&self, collection_id: Option<i64>) -> Result<Vec<TaskRecord>, AppError> {
        let (unblocked, _) = self.split_blocked(collection_id)?;
        Ok(unblocked)
    }

    pub fn blocked_tasks(&self, collection_id: Option<i64>) -> Result<Vec<TaskRecord>, AppError> {
        let (_, blocked) = self.split_blocked(collection_id)?;
        Ok(blocked)
    }

    /// The deepest tasks by longest `blocks` chain, at most
    /// [`CRITICAL_PATH_LIMIT`] of them.
    pub fn critical_path(&self) -> Result<Vec<TaskAtDepth>, AppError> {
        let tx = begin_read(self.conn)?;
        let graph = load_graph(&tx)?;
        let task_ids: Vec<i64> = db::tasks::task_statuses(&tx)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let mut depths = graph.critical_depths(&task_ids);
        depths.truncate(CRITICAL_PATH_LIMIT);
        debug!(tasks = task_ids.len(), "critical path computed");
        let result = with_depths(&tx, &depths)?;
        tx.finish()?;
        Ok(result)
    }

    fn split_blocked(
        &self,
        collection_id: Option<i64>,
    ) -> Result<(Vec<TaskRecord>, Vec<TaskRecord>), AppError> {
        let tx = begin_read(self.conn)?;
        if let Some(collection_id) = collection_id {
            if !db::collections::collection_exists(&tx, collection_id)? {
                return Err(AppError::not_found("collection", collection_id));
            }
        }
        let graph = load_graph(&tx)?;
        let statuses: BTreeMap<_, _> = db::tasks::task_statuses(&tx)?.into_iter().collect();
        let (unblocked, blocked) = graph.split_blocked(&statuses);

        let unblocked = db::tasks::list_tasks_by_ids(&tx, &unblocked)?;
        let blocked = db::tasks::list_tasks_by_ids(&tx, &blocked)?;
        let (unblocked, blocked) = match collection_id {
            Some(collection_id) => {
                let members: Vec<i64> = db::memberships::list_by_collection(&tx, collection_id)?
                    .into_iter()
                    .filter_map(|row| match row.item() {
                        ItemRef::Task(id) => Some(id),
                        _ => None,
                    })
                    .collect();
                let keep = |tasks: Vec<TaskRecord>| -> Vec<TaskRecord> {
                    tasks
                        .into_iter()
                        .filter(|task| members.contains(&task.id))
                        .collect()
                };
                (keep(unblocked), keep(blocked))
            }
            None => (unblocked, blocked),
        };
        debug!(
            unblocked = unblocked.len(),
            blocked = blocked.len(),
            "blocked split computed"
        );
        tx.finish()?;
        Ok((unblocked, blocked))
    }

    fn require_task(&self, conn: &Connection, task_id: i64) -> Result<(), AppError> {
        if db::tasks::task_exists(conn, task_id)? {
            Ok(())
        } else {
            Err(AppError::not_found("task", task_id))
        }
    }
}

fn load_graph(conn: &Connection) -> Result<DependencyGraph, AppError> {
    let edges = db::dependencies::list_dependencies(conn)?;
    Ok(DependencyGraph::from_edges(edges.into_iter().map(|edge| {
        Edge {
            task_id: edge.task_id,
            depends_on: edge.depends_on_task_id,
            kind: edge.dependency_type,
        }
    })))
}

fn with_depths(conn: &Connection, ranked: &[(i64, usize)]) -> Result<Vec<TaskAtDepth>, AppError> {
    let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
    let depth_of: BTreeMap<i64, usize> = ranked.iter().copied().collect();
    Ok(db::tasks::list_tasks_by_ids(conn, &ids)?
        .into_iter()
        .map(|task| TaskAtDepth {
            depth: depth_of.get(&task.id).copied().unwrap_or_default(),
            task,
        })
        .collect())
}

#[cfg(test)]
mod tests;
