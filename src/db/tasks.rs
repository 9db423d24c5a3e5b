use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::{metadata_column, Assignments};
use crate::domain::{metadata, ItemStatus, Metadata};

pub(crate) const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.topic, t.status, \
     t.createDate, t.startDate, t.endDate, t.canceledDate, t.migrated_from_id, \
     t.migrated_to_id, t.template_id, t.instance_number, t.metadata";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub status: ItemStatus,
    pub create_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub canceled_date: Option<String>,
    pub migrated_from_id: Option<i64>,
    pub migrated_to_id: Option<i64>,
    pub template_id: Option<i64>,
    pub instance_number: Option<i64>,
    pub metadata: Metadata,
}

pub(crate) fn task_from_row(row: &Row<'_>) -> Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        topic: row.get(3)?,
        status: row.get(4)?,
        create_date: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        canceled_date: row.get(8)?,
        migrated_from_id: row.get(9)?,
        migrated_to_id: row.get(10)?,
        template_id: row.get(11)?,
        instance_number: row.get(12)?,
        metadata: metadata_column(row, 13)?,
    })
}

pub struct NewTask<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub status: ItemStatus,
    pub create_date: &'a str,
    pub template_id: Option<i64>,
    pub instance_number: Option<i64>,
    pub metadata: &'a Metadata,
}

pub fn insert_task(conn: &Connection, args: &NewTask<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO tasks (
    title, description, topic, status, createDate, template_id, instance_number, metadata
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
        params![
            args.title,
            args.description,
            args.topic,
            args.status,
            args.create_date,
            args.template_id,
            args.instance_number,
            metadata::encode(args.metadata)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Option<TaskRecord>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
        params![id],
        task_from_row,
    )
    .optional()
}

pub fn task_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<ItemStatus>,
    pub collection_id: Option<i64>,
}

pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
    let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks t");
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(collection_id) = filter.collection_id {
        values.push(Value::Integer(collection_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM collectionItems ci WHERE ci.itemId = t.id \
             AND ci.itemType = 'Task' AND ci.collectionId = ?{})",
            values.len()
        ));
    }
    if let Some(status) = filter.status {
        values.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("t.status = ?{}", values.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), task_from_row)?;
    rows.collect()
}

/// Loads the given tasks in the order requested; unknown ids are skipped.
pub fn list_tasks_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"))?;
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(task) = stmt.query_row(params![id], task_from_row).optional()? {
            result.push(task);
        }
    }
    Ok(result)
}

pub fn task_statuses(conn: &Connection) -> Result<Vec<(i64, ItemStatus)>> {
    let mut stmt = conn.prepare("SELECT id, status FROM tasks ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub status: Option<ItemStatus>,
    pub metadata: Option<Metadata>,
}

impl TaskPatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.topic.is_some()
            || self.status.is_some()
            || self.metadata.is_some()
    }
}

pub fn update_task(conn: &Connection, id: i64, patch: &TaskPatch) -> Result<usize> {
    let mut assignments = Assignments::default();
    if let Some(title) = &patch.title {
        assignments.set("title", title.clone());
    }
    if let Some(description) = &patch.description {
        assignments.set("description", description.clone());
    }
    if let Some(topic) = &patch.topic {
        assignments.set("topic", topic.clone());
    }
    if let Some(status) = patch.status {
        assignments.set("status", status.as_str().to_string());
    }
    if let Some(bag) = &patch.metadata {
        assignments.set("metadata", metadata::encode(bag));
    }
    assignments.apply(conn, "tasks", id)
}

/// Sets the status and stamps the matching date column, if the status has one.
pub fn set_task_status(conn: &Connection, id: i64, status: ItemStatus, at: &str) -> Result<usize> {
    let mut assignments = Assignments::default();
    assignments.set("status", status.as_str().to_string());
    if let Some(column) = status.date_column() {
        assignments.set(column, at.to_string());
    }
    assignments.apply(conn, "tasks", id)
}

pub fn mark_task_superseded(conn: &Connection, id: i64, successor_id: i64) -> Result<usize> {
    conn.execute(
        "UPDATE tasks SET migrated_to_id = ?1, status = ?2 WHERE id = ?3",
        params![successor_id, ItemStatus::Migrated, id],
    )
}

pub fn set_task_predecessor(conn: &Connection, id: i64, predecessor_id: i64) -> Result<usize> {
    conn.execute(
        "UPDATE tasks SET migrated_from_id = ?1 WHERE id = ?2",
        params![predecessor_id, id],
    )
}

pub fn delete_task(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])
}

pub fn list_task_instances(conn: &Connection, template_id: i64) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.template_id = ?1 \
         ORDER BY t.instance_number DESC, t.id DESC"
    ))?;
    let rows = stmt.query_map(params![template_id], task_from_row)?;
    rows.collect()
}
