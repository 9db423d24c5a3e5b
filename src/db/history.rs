use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result, Row};
use serde::Serialize;

use crate::domain::{ItemKind, TrackedItem};

const HISTORY_COLUMNS: &str = "id, item_id, item_type, from_collection_id, to_collection_id, \
     migrated_at, migrated_by, reason";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub item_id: i64,
    pub item_type: ItemKind,
    pub from_collection_id: Option<i64>,
    pub to_collection_id: i64,
    pub migrated_at: String,
    pub migrated_by: Option<String>,
    pub reason: Option<String>,
}

fn history_from_row(row: &Row<'_>) -> Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        item_id: row.get(1)?,
        item_type: row.get(2)?,
        from_collection_id: row.get(3)?,
        to_collection_id: row.get(4)?,
        migrated_at: row.get(5)?,
        migrated_by: row.get(6)?,
        reason: row.get(7)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationCount {
    pub item_id: i64,
    pub item_type: ItemKind,
    pub migration_count: i64,
}

pub struct NewHistory<'a> {
    pub item: TrackedItem,
    pub from_collection_id: Option<i64>,
    pub to_collection_id: i64,
    pub migrated_at: &'a str,
    pub migrated_by: Option<&'a str>,
    pub reason: Option<&'a str>,
}

pub fn insert_history(conn: &Connection, args: &NewHistory<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO item_migration_history (
    item_id, item_type, from_collection_id, to_collection_id, migrated_at, migrated_by, reason
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
        params![
            args.item.id(),
            args.item.kind(),
            args.from_collection_id,
            args.to_collection_id,
            args.migrated_at,
            args.migrated_by,
            args.reason
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Oldest move first.
pub fn list_for_item(conn: &Connection, item: TrackedItem) -> Result<Vec<HistoryRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLUMNS} FROM item_migration_history \
         WHERE item_id = ?1 AND item_type = ?2 ORDER BY migrated_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![item.id(), item.kind()], history_from_row)?;
    rows.collect()
}

fn list_by_collection_column(
    conn: &Connection,
    column: &'static str,
    collection_id: i64,
    kind: Option<ItemKind>,
) -> Result<Vec<HistoryRecord>> {
    let mut sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM item_migration_history WHERE {column} = ?1"
    );
    let mut values = vec![Value::Integer(collection_id)];
    if let Some(kind) = kind {
        values.push(Value::Text(kind.as_str().to_string()));
        sql.push_str(" AND item_type = ?2");
    }
    sql.push_str(" ORDER BY migrated_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), history_from_row)?;
    rows.collect()
}

/// Moves out of `collection_id`, newest first.
pub fn list_from(
    conn: &Connection,
    collection_id: i64,
    kind: Option<ItemKind>,
) -> Result<Vec<HistoryRecord>> {
    list_by_collection_column(conn, "from_collection_id", collection_id, kind)
}

/// Moves into `collection_id`, newest first.
pub fn list_to(
    conn: &Connection,
    collection_id: i64,
    kind: Option<ItemKind>,
) -> Result<Vec<HistoryRecord>> {
    list_by_collection_column(conn, "to_collection_id", collection_id, kind)
}

pub fn list_all(conn: &Connection, kind: Option<ItemKind>) -> Result<Vec<HistoryRecord>> {
    let mut sql = format!("SELECT {HISTORY_COLUMNS} FROM item_migration_history");
    let mut values: Vec<Value> = Vec::new();
    if let Some(kind) = kind {
        values.push(Value::Text(kind.as_str().to_string()));
        sql.push_str(" WHERE item_type = ?1");
    }
    sql.push_str(" ORDER BY migrated_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), history_from_row)?;
    rows.collect()
}

pub fn count_for_item(conn: &Connection, item: TrackedItem) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM item_migration_history WHERE item_id = ?1 AND item_type = ?2",
        params![item.id(), item.kind()],
        |row| row.get(0),
    )
}

pub fn most_migrated(
    conn: &Connection,
    kind: Option<ItemKind>,
    limit: usize,
) -> Result<Vec<MigrationCount>> {
    let mut values: Vec<Value> = Vec::new();
    let mut sql = String::from(
        "SELECT item_id, item_type, COUNT(*) AS migration_count FROM item_migration_history",
    );
    if let Some(kind) = kind {
        values.push(Value::Text(kind.as_str().to_string()));
        sql.push_str(" WHERE item_type = ?1");
    }
    values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    sql.push_str(&format!(
        " GROUP BY item_id, item_type \
         ORDER BY migration_count DESC, item_type ASC, item_id ASC LIMIT ?{}",
        values.len()
    ));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(MigrationCount {
            item_id: row.get(0)?,
            item_type: row.get(1)?,
            migration_count: row.get(2)?,
        })
    })?;
    rows.collect()
}
