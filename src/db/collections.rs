use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::metadata_column;
use crate::domain::{metadata, CollectionSubType, CollectionType, Metadata};

const COLLECTION_COLUMNS: &str = "id, title, description, longDescription, type, subType, \
     createDate, startDate, endDate, canceledDate, archived_at, metadata";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    pub sub_type: Option<CollectionSubType>,
    pub create_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub canceled_date: Option<String>,
    pub archived_at: Option<String>,
    pub metadata: Metadata,
}

fn collection_from_row(row: &Row<'_>) -> Result<CollectionRecord> {
    Ok(CollectionRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        long_description: row.get(3)?,
        collection_type: row.get(4)?,
        sub_type: row.get(5)?,
        create_date: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        canceled_date: row.get(9)?,
        archived_at: row.get(10)?,
        metadata: metadata_column(row, 11)?,
    })
}

pub struct NewCollection<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub long_description: Option<&'a str>,
    pub collection_type: CollectionType,
    pub sub_type: Option<CollectionSubType>,
    pub create_date: &'a str,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub metadata: &'a Metadata,
}

pub fn insert_collection(conn: &Connection, args: &NewCollection<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO collections (
    title, description, longDescription, type, subType, createDate, startDate, endDate, metadata
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#,
        params![
            args.title,
            args.description,
            args.long_description,
            args.collection_type,
            args.sub_type,
            args.create_date,
            args.start_date,
            args.end_date,
            metadata::encode(args.metadata)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_collection(conn: &Connection, id: i64) -> Result<Option<CollectionRecord>> {
    conn.query_row(
        &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?1"),
        params![id],
        collection_from_row,
    )
    .optional()
}

pub fn collection_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM collections WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Default)]
pub struct CollectionFilter {
    pub collection_type: Option<CollectionType>,
    pub sub_type: Option<CollectionSubType>,
    pub include_archived: bool,
}

pub fn list_collections(
    conn: &Connection,
    filter: &CollectionFilter,
) -> Result<Vec<CollectionRecord>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(collection_type) = filter.collection_type {
        values.push(Value::Text(collection_type.as_str().to_string()));
        clauses.push(format!("type = ?{}", values.len()));
    }
    if let Some(sub_type) = filter.sub_type {
        values.push(Value::Text(sub_type.as_str().to_string()));
        clauses.push(format!("subType = ?{}", values.len()));
    }
    if !filter.include_archived {
        clauses.push("archived_at IS NULL".to_string());
    }

    let mut sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), collection_from_row)?;
    rows.collect()
}

/// `None` clears the archive marker.
pub fn set_archived_at(conn: &Connection, id: i64, archived_at: Option<&str>) -> Result<usize> {
    conn.execute(
        "UPDATE collections SET archived_at = ?1 WHERE id = ?2",
        params![archived_at, id],
    )
}

pub fn delete_collection(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM collections WHERE id = ?1", params![id])
}
