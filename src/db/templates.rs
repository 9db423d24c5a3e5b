use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::{metadata_column, Assignments};
use crate::domain::{metadata, ItemStatus, Metadata, TemplateRef};

const TASK_TEMPLATE_COLUMNS: &str =
    "id, title, description, topic, createDate, metadata, auto_spawn, default_collection_id";

const EVENT_TEMPLATE_COLUMNS: &str = "id, title, description, location, link, createDate, \
     metadata, auto_spawn, default_collection_id";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplateRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub create_date: Option<String>,
    pub metadata: Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplateRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub create_date: Option<String>,
    pub metadata: Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

fn task_template_from_row(row: &Row<'_>) -> Result<TaskTemplateRecord> {
    Ok(TaskTemplateRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        topic: row.get(3)?,
        create_date: row.get(4)?,
        metadata: metadata_column(row, 5)?,
        auto_spawn: row.get(6)?,
        default_collection_id: row.get(7)?,
    })
}

fn event_template_from_row(row: &Row<'_>) -> Result<EventTemplateRecord> {
    Ok(EventTemplateRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        link: row.get(4)?,
        create_date: row.get(5)?,
        metadata: metadata_column(row, 6)?,
        auto_spawn: row.get(7)?,
        default_collection_id: row.get(8)?,
    })
}

pub struct NewTaskTemplate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub create_date: &'a str,
    pub metadata: &'a Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

pub struct NewEventTemplate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub link: Option<&'a str>,
    pub create_date: &'a str,
    pub metadata: &'a Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

pub fn insert_task_template(conn: &Connection, args: &NewTaskTemplate<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO task_templates (
    title, description, topic, createDate, metadata, auto_spawn, default_collection_id
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
        params![
            args.title,
            args.description,
            args.topic,
            args.create_date,
            metadata::encode(args.metadata),
            args.auto_spawn,
            args.default_collection_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_event_template(conn: &Connection, args: &NewEventTemplate<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO event_templates (
    title, description, location, link, createDate, metadata, auto_spawn, default_collection_id
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
        params![
            args.title,
            args.description,
            args.location,
            args.link,
            args.create_date,
            metadata::encode(args.metadata),
            args.auto_spawn,
            args.default_collection_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_task_template(conn: &Connection, id: i64) -> Result<Option<TaskTemplateRecord>> {
    conn.query_row(
        &format!("SELECT {TASK_TEMPLATE_COLUMNS} FROM task_templates WHERE id = ?1"),
        params![id],
        task_template_from_row,
    )
    .optional()
}

pub fn get_event_template(conn: &Connection, id: i64) -> Result<Option<EventTemplateRecord>> {
    conn.query_row(
        &format!("SELECT {EVENT_TEMPLATE_COLUMNS} FROM event_templates WHERE id = ?1"),
        params![id],
        event_template_from_row,
    )
    .optional()
}

pub fn list_task_templates(conn: &Connection) -> Result<Vec<TaskTemplateRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_TEMPLATE_COLUMNS} FROM task_templates ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], task_template_from_row)?;
    rows.collect()
}

pub fn list_event_templates(conn: &Connection) -> Result<Vec<EventTemplateRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_TEMPLATE_COLUMNS} FROM event_templates ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], event_template_from_row)?;
    rows.collect()
}

/// Shared by both template kinds; kind-specific columns are ignored on the
/// other table.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub metadata: Option<Metadata>,
    pub auto_spawn: Option<bool>,
    pub default_collection_id: Option<i64>,
}

impl TemplatePatch {
    fn common(&self) -> Assignments {
        let mut assignments = Assignments::default();
        if let Some(title) = &self.title {
            assignments.set("title", title.clone());
        }
        if let Some(description) = &self.description {
            assignments.set("description", description.clone());
        }
        if let Some(bag) = &self.metadata {
            assignments.set("metadata", metadata::encode(bag));
        }
        if let Some(auto_spawn) = self.auto_spawn {
            assignments.set("auto_spawn", auto_spawn);
        }
        if let Some(collection_id) = self.default_collection_id {
            assignments.set("default_collection_id", collection_id);
        }
        assignments
    }
}

pub fn update_task_template(conn: &Connection, id: i64, patch: &TemplatePatch) -> Result<usize> {
    let mut assignments = patch.common();
    if let Some(topic) = &patch.topic {
        assignments.set("topic", topic.clone());
    }
    assignments.apply(conn, "task_templates", id)
}

pub fn update_event_template(conn: &Connection, id: i64, patch: &TemplatePatch) -> Result<usize> {
    let mut assignments = patch.common();
    if let Some(location) = &patch.location {
        assignments.set("location", location.clone());
    }
    if let Some(link) = &patch.link {
        assignments.set("link", link.clone());
    }
    assignments.apply(conn, "event_templates", id)
}

pub fn delete_template(conn: &Connection, template: TemplateRef) -> Result<usize> {
    match template {
        TemplateRef::Task(id) => {
            conn.execute("DELETE FROM task_templates WHERE id = ?1", params![id])
        }
        TemplateRef::Event(id) => {
            conn.execute("DELETE FROM event_templates WHERE id = ?1", params![id])
        }
    }
}

fn instance_table(template: TemplateRef) -> &'static str {
    match template {
        TemplateRef::Task(_) => "tasks",
        TemplateRef::Event(_) => "events",
    }
}

/// One past the highest instance number spawned so far; numbering survives
/// deleted instances without reuse.
pub fn next_instance_number(conn: &Connection, template: TemplateRef) -> Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(instance_number), 0) + 1 FROM {} WHERE template_id = ?1",
            instance_table(template)
        ),
        params![template.id()],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TemplateStats {
    pub total_instances: i64,
    pub completed: i64,
    pub active: i64,
    pub canceled: i64,
}

pub fn instance_stats(conn: &Connection, template: TemplateRef) -> Result<TemplateStats> {
    conn.query_row(
        &format!(
            r#"
SELECT
    COUNT(*),
    COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
    COALESCE(SUM(CASE WHEN status IN (?3, ?4) THEN 1 ELSE 0 END), 0),
    COALESCE(SUM(CASE WHEN status = ?5 THEN 1 ELSE 0 END), 0)
FROM {}
WHERE template_id = ?1
"#,
            instance_table(template)
        ),
        params![
            template.id(),
            ItemStatus::Finished,
            ItemStatus::Created,
            ItemStatus::InProgress,
            ItemStatus::Canceled
        ],
        |row| {
            Ok(TemplateStats {
                total_instances: row.get(0)?,
                completed: row.get(1)?,
                active: row.get(2)?,
                canceled: row.get(3)?,
            })
        },
    )
}
