use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::tasks::{task_from_row, TaskRecord, TASK_COLUMNS};
use crate::domain::{CreatedBy, DependencyType};

const DEPENDENCY_COLUMNS: &str =
    "id, task_id, depends_on_task_id, dependency_type, created_at, created_by";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRecord {
    pub id: i64,
    pub task_id: i64,
    pub depends_on_task_id: i64,
    pub dependency_type: DependencyType,
    pub created_at: String,
    pub created_by: Option<CreatedBy>,
}

fn dependency_from_row(row: &Row<'_>) -> Result<DependencyRecord> {
    Ok(DependencyRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        depends_on_task_id: row.get(2)?,
        dependency_type: row.get(3)?,
        created_at: row.get(4)?,
        created_by: row.get(5)?,
    })
}

pub struct NewDependency<'a> {
    pub task_id: i64,
    pub depends_on_task_id: i64,
    pub dependency_type: DependencyType,
    pub created_by: Option<CreatedBy>,
    pub created_at: &'a str,
}

pub fn insert_dependency(conn: &Connection, args: &NewDependency<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO task_dependencies (task_id, depends_on_task_id, dependency_type, created_at, created_by)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
        params![
            args.task_id,
            args.depends_on_task_id,
            args.dependency_type,
            args.created_at,
            args.created_by
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_dependency_between(
    conn: &Connection,
    task_id: i64,
    depends_on_task_id: i64,
) -> Result<Option<DependencyRecord>> {
    conn.query_row(
        &format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM task_dependencies \
             WHERE task_id = ?1 AND depends_on_task_id = ?2"
        ),
        params![task_id, depends_on_task_id],
        dependency_from_row,
    )
    .optional()
}

pub fn delete_dependency(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM task_dependencies WHERE id = ?1", params![id])
}

pub fn delete_dependency_between(
    conn: &Connection,
    task_id: i64,
    depends_on_task_id: i64,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM task_dependencies WHERE task_id = ?1 AND depends_on_task_id = ?2",
        params![task_id, depends_on_task_id],
    )
}

pub fn list_dependencies(conn: &Connection) -> Result<Vec<DependencyRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM task_dependencies ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], dependency_from_row)?;
    rows.collect()
}

/// Edges that touch `task_id` on either end.
pub fn list_edges_of(conn: &Connection, task_id: i64) -> Result<Vec<DependencyRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM task_dependencies \
         WHERE task_id = ?1 OR depends_on_task_id = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![task_id], dependency_from_row)?;
    rows.collect()
}

/// Tasks that `task_id` depends on directly.
pub fn list_direct_dependencies(conn: &Connection, task_id: i64) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
SELECT {TASK_COLUMNS}
FROM task_dependencies d
JOIN tasks t ON t.id = d.depends_on_task_id
WHERE d.task_id = ?1
ORDER BY d.id ASC
"#
    ))?;
    let rows = stmt.query_map(params![task_id], task_from_row)?;
    rows.collect()
}

/// Tasks that depend directly on `task_id`.
pub fn list_direct_dependents(conn: &Connection, task_id: i64) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
SELECT {TASK_COLUMNS}
FROM task_dependencies d
JOIN tasks t ON t.id = d.task_id
WHERE d.depends_on_task_id = ?1
ORDER BY d.id ASC
"#
    ))?;
    let rows = stmt.query_map(params![task_id], task_from_row)?;
    rows.collect()
}
