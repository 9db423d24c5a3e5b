use std::collections::BTreeSet;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::app::AppError;
use crate::db::history::{HistoryRecord, MigrationCount, NewHistory};
use crate::db::{self, begin_write};
use crate::domain::timestamp::now_utc_rfc3339;
use crate::domain::{ItemKind, ItemStatus, TrackedItem};

/// Default row count for [`MigrationTracker::most_migrated`].
pub const MOST_MIGRATED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub item: TrackedItem,
    pub to_collection_id: i64,
    pub from_collection_ids: Vec<i64>,
    pub history_ids: Vec<i64>,
    pub membership_id: i64,
    pub status_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Supersession {
    pub task_id: i64,
    pub to_task_id: i64,
}

/// Moves items between collections with an audit trail, and supersedes one
/// task with another.
pub struct MigrationTracker<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationTracker<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Replaces every membership of `item` with a single one in
    /// `to_collection_id`, writing one history row per collection left (or
    /// one with no origin). The item becomes `MIGRATED` when it left at least
    /// one collection and was not already in the destination.
    pub fn migrate_item_to_collection(
        &self,
        item: TrackedItem,
        to_collection_id: i64,
        migrated_by: Option<&str>,
        reason: Option<&str>,
    ) -> Result<MigrationOutcome, AppError> {
        let tx = begin_write(self.conn).map_err(AppError::TransactionFailure)?;
        let exists = match item {
            TrackedItem::Task(id) => db::tasks::task_exists(&tx, id)?,
            TrackedItem::Event(id) => db::events::event_exists(&tx, id)?,
        };
        if !exists {
            return Err(AppError::NotFound(format!("{item} not found")));
        }
        if !db::collections::collection_exists(&tx, to_collection_id)? {
            return Err(AppError::not_found("collection", to_collection_id));
        }

        let from: BTreeSet<i64> = db::memberships::list_by_item(&tx, item.into())?
            .into_iter()
            .map(|row| row.collection_id)
            .collect();

        let migrated_at = now_utc_rfc3339();
        let origins: Vec<Option<i64>> = if from.is_empty() {
            vec![None]
        } else {
            from.iter().copied().map(Some).collect()
        };
        let mut history_ids = Vec::with_capacity(origins.len());
        for from_collection_id in origins {
            history_ids.push(db::history::insert_history(
                &tx,
                &NewHistory {
                    item,
                    from_collection_id,
                    to_collection_id,
                    migrated_at: &migrated_at,
                    migrated_by,
                    reason,
                },
            )?);
        }

        db::memberships::delete_item_memberships(&tx, item.into())?;
        let membership_id = db::memberships::insert_membership(&tx, to_collection_id, item.into())?;

        let status_changed = !from.is_empty() && !from.contains(&to_collection_id);
        if status_changed {
            match item {
                TrackedItem::Task(id) => {
                    db::tasks::set_task_status(&tx, id, ItemStatus::Migrated, &migrated_at)?
                }
                TrackedItem::Event(id) => {
                    db::events::set_event_status(&tx, id, ItemStatus::Migrated, &migrated_at)?
                }
            };
        }

        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(
            %item,
            to_collection_id,
            from = from.len(),
            status_changed,
            "item migrated"
        );
        Ok(MigrationOutcome {
            item,
            to_collection_id,
            from_collection_ids: from.into_iter().collect(),
            history_ids,
            membership_id,
            status_changed,
        })
    }

    /// Marks `task_id` as replaced by `to_task_id`. Collections and history
    /// are left untouched.
    pub fn supersede_task(&self, task_id: i64, to_task_id: i64) -> Result<Supersession, AppError> {
        if task_id == to_task_id {
            return Err(AppError::ConstraintViolation(format!(
                "task {task_id} cannot supersede itself"
            )));
        }
        let tx = begin_write(self.conn).map_err(AppError::TransactionFailure)?;
        for id in [task_id, to_task_id] {
            if !db::tasks::task_exists(&tx, id)? {
                return Err(AppError::not_found("task", id));
            }
        }
        db::tasks::mark_task_superseded(&tx, task_id, to_task_id)?;
        db::tasks::set_task_predecessor(&tx, to_task_id, task_id)?;
        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(task_id, to_task_id, "task superseded");
        Ok(Supersession {
            task_id,
            to_task_id,
        })
    }

    pub fn item_history(&self, item: TrackedItem) -> Result<Vec<HistoryRecord>, AppError> {
        Ok(db::history::list_for_item(self.conn, item)?)
    }

    pub fn migrations_from(
        &self,
        collection_id: i64,
        kind: Option<ItemKind>,
    ) -> Result<Vec<HistoryRecord>, AppError> {
        Ok(db::history::list_from(self.conn, collection_id, kind)?)
    }

    pub fn migrations_to(
        &self,
        collection_id: i64,
        kind: Option<ItemKind>,
    ) -> Result<Vec<HistoryRecord>, AppError> {
        Ok(db::history::list_to(self.conn, collection_id, kind)?)
    }

    pub fn all_migrations(&self, kind: Option<ItemKind>) -> Result<Vec<HistoryRecord>, AppError> {
        Ok(db::history::list_all(self.conn, kind)?)
    }

    pub fn migration_count(&self, item: TrackedItem) -> Result<i64, AppError> {
        Ok(db::history::count_for_item(self.conn, item)?)
    }

    pub fn most_migrated(
        &self,
        kind: Option<ItemKind>,
        limit: usize,
    ) -> Result<Vec<MigrationCount>, AppError> {
        let counts = db::history::most_migrated(self.conn, kind, limit)?;
        debug!(rows = counts.len(), "most migrated items ranked");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests;
