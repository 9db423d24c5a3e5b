use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, StoreConfig};
use crate::db::collections::{CollectionFilter, CollectionRecord, NewCollection};
use crate::db::events::{EventFilter, EventPatch, EventRecord, NewEvent};
use crate::db::tasks::{NewTask, TaskFilter, TaskPatch, TaskRecord};
use crate::db::templates::{
    EventTemplateRecord, NewEventTemplate, NewTaskTemplate, TaskTemplateRecord, TemplatePatch,
    TemplateStats,
};
use crate::db::{self, begin_write};
use crate::dependencies::DependencyEngine;
use crate::domain::timestamp::{normalize_datetime, now_utc_rfc3339};
use crate::domain::{
    CollectionSubType, CollectionType, ItemRef, ItemStatus, Metadata, ParseVocabularyError,
    TemplateRef,
};
use crate::membership::Memberships;
use crate::migration::MigrationTracker;
use crate::spawner::InstanceSpawner;

/// Explicitly constructed store handle. Every component borrows its
/// connection for the duration of one call.
pub struct App {
    conn: Connection,
}

#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub metadata: Metadata,
    pub collection_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub scheduled_date: Option<String>,
    pub metadata: Metadata,
    pub collection_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateCollection {
    pub title: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub collection_type: CollectionType,
    pub sub_type: Option<CollectionSubType>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default)]
pub struct CreateTaskTemplate {
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub metadata: Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateEventTemplate {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub metadata: Metadata,
    pub auto_spawn: bool,
    pub default_collection_id: Option<i64>,
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        Self::open_with(db_path, &StoreConfig::default())
    }

    pub fn open_with(db_path: &str, store: &StoreConfig) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path, store.busy_timeout_ms)?;
        Ok(Self { conn })
    }

    pub fn memberships(&self) -> Memberships<'_> {
        Memberships::new(&self.conn)
    }

    pub fn dependencies(&self) -> DependencyEngine<'_> {
        DependencyEngine::new(&self.conn)
    }

    pub fn migrations(&self) -> MigrationTracker<'_> {
        MigrationTracker::new(&self.conn)
    }

    pub fn spawner(&self) -> InstanceSpawner<'_> {
        InstanceSpawner::new(&self.conn)
    }

    pub fn create_task(&self, input: &CreateTask) -> Result<TaskRecord, AppError> {
        let title = require_title(&input.title)?;
        let create_date = now_utc_rfc3339();
        let tx = begin_write(&self.conn).map_err(AppError::TransactionFailure)?;
        let id = db::tasks::insert_task(
            &tx,
            &NewTask {
                title,
                description: input.description.as_deref(),
                topic: input.topic.as_deref(),
                status: ItemStatus::Created,
                create_date: &create_date,
                template_id: None,
                instance_number: None,
                metadata: &input.metadata,
            },
        )?;
        if let Some(collection_id) = input.collection_id {
            place_new_item(&tx, collection_id, ItemRef::Task(id))?;
        }
        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(task_id = id, "task created");
        self.get_task(id)
    }

    pub fn get_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        db::tasks::get_task(&self.conn, id)?.ok_or_else(|| AppError::not_found("task", id))
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, AppError> {
        Ok(db::tasks::list_tasks(&self.conn, filter)?)
    }

    pub fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<TaskRecord, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field".to_string(),
            ));
        }
        if db::tasks::update_task(&self.conn, id, patch)? == 0 {
            return Err(AppError::not_found("task", id));
        }
        self.get_task(id)
    }

    pub fn start_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        self.set_task_status(id, ItemStatus::InProgress)
    }

    pub fn complete_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        self.set_task_status(id, ItemStatus::Finished)
    }

    pub fn cancel_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        self.set_task_status(id, ItemStatus::Canceled)
    }

    fn set_task_status(&self, id: i64, status: ItemStatus) -> Result<TaskRecord, AppError> {
        if db::tasks::set_task_status(&self.conn, id, status, &now_utc_rfc3339())? == 0 {
            return Err(AppError::not_found("task", id));
        }
        info!(task_id = id, %status, "task status changed");
        self.get_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<(), AppError> {
        if db::tasks::delete_task(&self.conn, id)? == 0 {
            return Err(AppError::not_found("task", id));
        }
        info!(task_id = id, "task deleted");
        Ok(())
    }

    pub fn create_event(&self, input: &CreateEvent) -> Result<EventRecord, AppError> {
        let title = require_title(&input.title)?;
        let scheduled_date = optional_datetime("scheduled date", input.scheduled_date.as_deref())?;
        let create_date = now_utc_rfc3339();
        let tx = begin_write(&self.conn).map_err(AppError::TransactionFailure)?;
        let id = db::events::insert_event(
            &tx,
            &NewEvent {
                title,
                description: input.description.as_deref(),
                location: input.location.as_deref(),
                link: input.link.as_deref(),
                status: ItemStatus::Created,
                create_date: &create_date,
                scheduled_date: scheduled_date.as_deref(),
                template_id: None,
                instance_number: None,
                metadata: &input.metadata,
            },
        )?;
        if let Some(collection_id) = input.collection_id {
            place_new_item(&tx, collection_id, ItemRef::Event(id))?;
        }
        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(event_id = id, "event created");
        self.get_event(id)
    }

    pub fn get_event(&self, id: i64) -> Result<EventRecord, AppError> {
        db::events::get_event(&self.conn, id)?.ok_or_else(|| AppError::not_found("event", id))
    }

    pub fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, AppError> {
        Ok(db::events::list_events(&self.conn, filter)?)
    }

    pub fn update_event(&self, id: i64, patch: &EventPatch) -> Result<EventRecord, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field".to_string(),
            ));
        }
        let mut patch = patch.clone();
        if let Some(raw) = patch.scheduled_date.take() {
            patch.scheduled_date = optional_datetime("scheduled date", Some(&raw))?;
        }
        if db::events::update_event(&self.conn, id, &patch)? == 0 {
            return Err(AppError::not_found("event", id));
        }
        self.get_event(id)
    }

    pub fn start_event(&self, id: i64) -> Result<EventRecord, AppError> {
        self.set_event_status(id, ItemStatus::InProgress)
    }

    pub fn complete_event(&self, id: i64) -> Result<EventRecord, AppError> {
        self.set_event_status(id, ItemStatus::Finished)
    }

    pub fn cancel_event(&self, id: i64) -> Result<EventRecord, AppError> {
        self.set_event_status(id, ItemStatus::Canceled)
    }

    fn set_event_status(&self, id: i64, status: ItemStatus) -> Result<EventRecord, AppError> {
        if db::events::set_event_status(&self.conn, id, status, &now_utc_rfc3339())? == 0 {
            return Err(AppError::not_found("event", id));
        }
        info!(event_id = id, %status, "event status changed");
        self.get_event(id)
    }

    pub fn delete_event(&self, id: i64) -> Result<(), AppError> {
        if db::events::delete_event(&self.conn, id)? == 0 {
            return Err(AppError::not_found("event", id));
        }
        info!(event_id = id, "event deleted");
        Ok(())
    }

    pub fn create_collection(&self, input: &CreateCollection) -> Result<CollectionRecord, AppError> {
        let title = require_title(&input.title)?;
        let start_date = optional_datetime("start date", input.start_date.as_deref())?;
        let end_date = optional_datetime("end date", input.end_date.as_deref())?;
        let id = db::collections::insert_collection(
            &self.conn,
            &NewCollection {
                title,
                description: input.description.as_deref(),
                long_description: input.long_description.as_deref(),
                collection_type: input.collection_type,
                sub_type: input.sub_type,
                create_date: &now_utc_rfc3339(),
                start_date: start_date.as_deref(),
                end_date: end_date.as_deref(),
                metadata: &input.metadata,
            },
        )?;
        info!(collection_id = id, "collection created");
        self.get_collection(id)
    }

    pub fn get_collection(&self, id: i64) -> Result<CollectionRecord, AppError> {
        db::collections::get_collection(&self.conn, id)?
            .ok_or_else(|| AppError::not_found("collection", id))
    }

    pub fn list_collections(
        &self,
        filter: &CollectionFilter,
    ) -> Result<Vec<CollectionRecord>, AppError> {
        Ok(db::collections::list_collections(&self.conn, filter)?)
    }

    pub fn archive_collection(&self, id: i64) -> Result<CollectionRecord, AppError> {
        let archived_at = now_utc_rfc3339();
        if db::collections::set_archived_at(&self.conn, id, Some(&archived_at))? == 0 {
            return Err(AppError::not_found("collection", id));
        }
        self.get_collection(id)
    }

    pub fn unarchive_collection(&self, id: i64) -> Result<CollectionRecord, AppError> {
        if db::collections::set_archived_at(&self.conn, id, None)? == 0 {
            return Err(AppError::not_found("collection", id));
        }
        self.get_collection(id)
    }

    pub fn delete_collection(&self, id: i64) -> Result<(), AppError> {
        if db::collections::delete_collection(&self.conn, id)? == 0 {
            return Err(AppError::not_found("collection", id));
        }
        info!(collection_id = id, "collection deleted");
        Ok(())
    }

    pub fn create_task_template(
        &self,
        input: &CreateTaskTemplate,
    ) -> Result<TaskTemplateRecord, AppError> {
        let title = require_title(&input.title)?;
        self.require_default_collection(input.default_collection_id)?;
        let id = db::templates::insert_task_template(
            &self.conn,
            &NewTaskTemplate {
                title,
                description: input.description.as_deref(),
                topic: input.topic.as_deref(),
                create_date: &now_utc_rfc3339(),
                metadata: &input.metadata,
                auto_spawn: input.auto_spawn,
                default_collection_id: input.default_collection_id,
            },
        )?;
        info!(template_id = id, "task template created");
        self.get_task_template(id)
    }

    pub fn create_event_template(
        &self,
        input: &CreateEventTemplate,
    ) -> Result<EventTemplateRecord, AppError> {
        let title = require_title(&input.title)?;
        self.require_default_collection(input.default_collection_id)?;
        let id = db::templates::insert_event_template(
            &self.conn,
            &NewEventTemplate {
                title,
                description: input.description.as_deref(),
                location: input.location.as_deref(),
                link: input.link.as_deref(),
                create_date: &now_utc_rfc3339(),
                metadata: &input.metadata,
                auto_spawn: input.auto_spawn,
                default_collection_id: input.default_collection_id,
            },
        )?;
        info!(template_id = id, "event template created");
        self.get_event_template(id)
    }

    pub fn get_task_template(&self, id: i64) -> Result<TaskTemplateRecord, AppError> {
        db::templates::get_task_template(&self.conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", TemplateRef::Task(id))))
    }

    pub fn get_event_template(&self, id: i64) -> Result<EventTemplateRecord, AppError> {
        db::templates::get_event_template(&self.conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", TemplateRef::Event(id))))
    }

    pub fn list_task_templates(&self) -> Result<Vec<TaskTemplateRecord>, AppError> {
        Ok(db::templates::list_task_templates(&self.conn)?)
    }

    pub fn list_event_templates(&self) -> Result<Vec<EventTemplateRecord>, AppError> {
        Ok(db::templates::list_event_templates(&self.conn)?)
    }

    pub fn update_template(
        &self,
        template: TemplateRef,
        patch: &TemplatePatch,
    ) -> Result<(), AppError> {
        self.require_default_collection(patch.default_collection_id)?;
        let touched = match template {
            TemplateRef::Task(id) => db::templates::update_task_template(&self.conn, id, patch)?,
            TemplateRef::Event(id) => db::templates::update_event_template(&self.conn, id, patch)?,
        };
        if touched == 0 {
            self.require_template(template)?;
            return Err(AppError::InvalidArgument(
                "update requires at least one field".to_string(),
            ));
        }
        Ok(())
    }

    /// Instances keep their rows; only the template link is cleared.
    pub fn delete_template(&self, template: TemplateRef) -> Result<(), AppError> {
        if db::templates::delete_template(&self.conn, template)? == 0 {
            return Err(AppError::NotFound(format!("{template} not found")));
        }
        info!(%template, "template deleted");
        Ok(())
    }

    /// Newest instance first.
    pub fn task_template_instances(&self, template_id: i64) -> Result<Vec<TaskRecord>, AppError> {
        self.require_template(TemplateRef::Task(template_id))?;
        Ok(db::tasks::list_task_instances(&self.conn, template_id)?)
    }

    /// Newest instance first.
    pub fn event_template_instances(
        &self,
        template_id: i64,
    ) -> Result<Vec<EventRecord>, AppError> {
        self.require_template(TemplateRef::Event(template_id))?;
        Ok(db::events::list_event_instances(&self.conn, template_id)?)
    }

    pub fn template_stats(&self, template: TemplateRef) -> Result<TemplateStats, AppError> {
        self.require_template(template)?;
        Ok(db::templates::instance_stats(&self.conn, template)?)
    }

    fn require_template(&self, template: TemplateRef) -> Result<(), AppError> {
        let exists = match template {
            TemplateRef::Task(id) => db::templates::get_task_template(&self.conn, id)?.is_some(),
            TemplateRef::Event(id) => db::templates::get_event_template(&self.conn, id)?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("{template} not found")))
        }
    }

    fn require_default_collection(&self, collection_id: Option<i64>) -> Result<(), AppError> {
        match collection_id {
            Some(id) if !db::collections::collection_exists(&self.conn, id)? => {
                Err(AppError::not_found("collection", id))
            }
            _ => Ok(()),
        }
    }
}

fn place_new_item(conn: &Connection, collection_id: i64, item: ItemRef) -> Result<(), AppError> {
    if !db::collections::collection_exists(conn, collection_id)? {
        return Err(AppError::not_found("collection", collection_id));
    }
    db::memberships::insert_membership(conn, collection_id, item)?;
    Ok(())
}

fn require_title(raw: &str) -> Result<&str, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::InvalidArgument("title must not be empty".to_string()));
    }
    Ok(title)
}

fn optional_datetime(field: &str, raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw {
        None => Ok(None),
        Some(value) => normalize_datetime(Some(value)).map(Some).ok_or_else(|| {
            AppError::InvalidArgument(format!("{field} '{value}' is not an RFC 3339 timestamp"))
        }),
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseVocabularyError),
    #[error("{0}")]
    NotFound(String),
    #[error("task {task_id} cannot depend on task {depends_on_task_id}: this would create a circular dependency")]
    CycleDetected {
        task_id: i64,
        depends_on_task_id: i64,
    },
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("transaction failed: {0}")]
    TransactionFailure(rusqlite::Error),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: i64) -> Self {
        AppError::NotFound(format!("{kind} {id} not found"))
    }

    /// Stable identifier surfaced to tool callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::CycleDetected { .. } => "CYCLE_DETECTED",
            AppError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AppError::TransactionFailure(_) => "TRANSACTION_FAILURE",
            AppError::InvalidArgument(_) | AppError::Parse(_) => "INVALID_ARGUMENT",
            AppError::UnknownTool(_) => "UNKNOWN_TOOL",
            AppError::Json(_) => "INVALID_JSON",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Db(_) => "DATABASE_ERROR",
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        if db::is_constraint_violation(&value) {
            AppError::ConstraintViolation(value.to_string())
        } else {
            AppError::Db(value)
        }
    }
}
