use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::{metadata_column, Assignments};
use crate::domain::{metadata, ItemStatus, Metadata};

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.location, e.link, e.status, \
     e.createDate, e.startDate, e.endDate, e.canceledDate, e.scheduledDate, \
     e.template_id, e.instance_number, e.metadata";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub status: ItemStatus,
    pub create_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub canceled_date: Option<String>,
    pub scheduled_date: Option<String>,
    pub template_id: Option<i64>,
    pub instance_number: Option<i64>,
    pub metadata: Metadata,
}

fn event_from_row(row: &Row<'_>) -> Result<EventRecord> {
    Ok(EventRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        link: row.get(4)?,
        status: row.get(5)?,
        create_date: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        canceled_date: row.get(9)?,
        scheduled_date: row.get(10)?,
        template_id: row.get(11)?,
        instance_number: row.get(12)?,
        metadata: metadata_column(row, 13)?,
    })
}

pub struct NewEvent<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub link: Option<&'a str>,
    pub status: ItemStatus,
    pub create_date: &'a str,
    pub scheduled_date: Option<&'a str>,
    pub template_id: Option<i64>,
    pub instance_number: Option<i64>,
    pub metadata: &'a Metadata,
}

pub fn insert_event(conn: &Connection, args: &NewEvent<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO events (
    title, description, location, link, status, createDate, scheduledDate,
    template_id, instance_number, metadata
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#,
        params![
            args.title,
            args.description,
            args.location,
            args.link,
            args.status,
            args.create_date,
            args.scheduled_date,
            args.template_id,
            args.instance_number,
            metadata::encode(args.metadata)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_event(conn: &Connection, id: i64) -> Result<Option<EventRecord>> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?1"),
        params![id],
        event_from_row,
    )
    .optional()
}

pub fn event_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<ItemStatus>,
    pub collection_id: Option<i64>,
}

pub fn list_events(conn: &Connection, filter: &EventFilter) -> Result<Vec<EventRecord>> {
    let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events e");
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(collection_id) = filter.collection_id {
        values.push(Value::Integer(collection_id));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM collectionItems ci WHERE ci.itemId = e.id \
             AND ci.itemType = 'Event' AND ci.collectionId = ?{})",
            values.len()
        ));
    }
    if let Some(status) = filter.status {
        values.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("e.status = ?{}", values.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY e.scheduledDate IS NULL, e.scheduledDate ASC, e.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), event_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub scheduled_date: Option<String>,
    pub status: Option<ItemStatus>,
    pub metadata: Option<Metadata>,
}

impl EventPatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.location.is_some()
            || self.link.is_some()
            || self.scheduled_date.is_some()
            || self.status.is_some()
            || self.metadata.is_some()
    }
}

pub fn update_event(conn: &Connection, id: i64, patch: &EventPatch) -> Result<usize> {
    let mut assignments = Assignments::default();
    if let Some(title) = &patch.title {
        assignments.set("title", title.clone());
    }
    if let Some(description) = &patch.description {
        assignments.set("description", description.clone());
    }
    if let Some(location) = &patch.location {
        assignments.set("location", location.clone());
    }
    if let Some(link) = &patch.link {
        assignments.set("link", link.clone());
    }
    if let Some(scheduled_date) = &patch.scheduled_date {
        assignments.set("scheduledDate", scheduled_date.clone());
    }
    if let Some(status) = patch.status {
        assignments.set("status", status.as_str().to_string());
    }
    if let Some(bag) = &patch.metadata {
        assignments.set("metadata", metadata::encode(bag));
    }
    assignments.apply(conn, "events", id)
}

pub fn set_event_status(conn: &Connection, id: i64, status: ItemStatus, at: &str) -> Result<usize> {
    let mut assignments = Assignments::default();
    assignments.set("status", status.as_str().to_string());
    if let Some(column) = status.date_column() {
        assignments.set(column, at.to_string());
    }
    assignments.apply(conn, "events", id)
}

pub fn delete_event(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM events WHERE id = ?1", params![id])
}

pub fn list_event_instances(conn: &Connection, template_id: i64) -> Result<Vec<EventRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events e WHERE e.template_id = ?1 \
         ORDER BY e.instance_number DESC, e.id DESC"
    ))?;
    let rows = stmt.query_map(params![template_id], event_from_row)?;
    rows.collect()
}
