use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::AppError;
use crate::db::events::NewEvent;
use crate::db::tasks::NewTask;
use crate::db::{self, begin_write};
use crate::domain::timestamp::now_utc_rfc3339;
use crate::domain::{ItemStatus, TemplateRef, TrackedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletedInstance {
    pub completed: TrackedItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<TrackedItem>,
}

/// Creates numbered instances of task and event templates.
pub struct InstanceSpawner<'a> {
    conn: &'a Connection,
}

impl<'a> InstanceSpawner<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Spawns the next instance of `template`, placing it in `collection_id`
    /// or else the template's default collection, if any.
    pub fn spawn_instance(
        &self,
        template: TemplateRef,
        collection_id: Option<i64>,
    ) -> Result<TrackedItem, AppError> {
        let tx = begin_write(self.conn).map_err(AppError::TransactionFailure)?;
        let create_date = now_utc_rfc3339();
        let instance_number = db::templates::next_instance_number(&tx, template)?;

        let (item, default_collection_id) = match template {
            TemplateRef::Task(template_id) => {
                let source = db::templates::get_task_template(&tx, template_id)?
                    .ok_or_else(|| AppError::NotFound(format!("{template} not found")))?;
                let id = db::tasks::insert_task(
                    &tx,
                    &NewTask {
                        title: &source.title,
                        description: source.description.as_deref(),
                        topic: source.topic.as_deref(),
                        status: ItemStatus::Created,
                        create_date: &create_date,
                        template_id: Some(template_id),
                        instance_number: Some(instance_number),
                        metadata: &source.metadata,
                    },
                )?;
                (TrackedItem::Task(id), source.default_collection_id)
            }
            TemplateRef::Event(template_id) => {
                let source = db::templates::get_event_template(&tx, template_id)?
                    .ok_or_else(|| AppError::NotFound(format!("{template} not found")))?;
                let id = db::events::insert_event(
                    &tx,
                    &NewEvent {
                        title: &source.title,
                        description: source.description.as_deref(),
                        location: source.location.as_deref(),
                        link: source.link.as_deref(),
                        status: ItemStatus::Created,
                        create_date: &create_date,
                        scheduled_date: None,
                        template_id: Some(template_id),
                        instance_number: Some(instance_number),
                        metadata: &source.metadata,
                    },
                )?;
                (TrackedItem::Event(id), source.default_collection_id)
            }
        };

        if let Some(collection_id) = collection_id.or(default_collection_id) {
            if !db::collections::collection_exists(&tx, collection_id)? {
                return Err(AppError::not_found("collection", collection_id));
            }
            db::memberships::insert_membership(&tx, collection_id, item.into())?;
        }

        tx.commit().map_err(AppError::TransactionFailure)?;
        info!(%template, %item, instance_number, "instance spawned");
        Ok(item)
    }

    /// Finishes `item`, then spawns the next instance when its template has
    /// auto-spawn enabled. The two steps commit separately: a failed spawn
    /// leaves the completion in place and is returned as the error.
    /// An item that is already `FINISHED` is left untouched and spawns nothing.
    pub fn complete_instance(&self, item: TrackedItem) -> Result<CompletedInstance, AppError> {
        let (status, template) = match item {
            TrackedItem::Task(id) => {
                let task = db::tasks::get_task(self.conn, id)?
                    .ok_or_else(|| AppError::not_found("task", id))?;
                (task.status, task.template_id.map(TemplateRef::Task))
            }
            TrackedItem::Event(id) => {
                let event = db::events::get_event(self.conn, id)?
                    .ok_or_else(|| AppError::not_found("event", id))?;
                (event.status, event.template_id.map(TemplateRef::Event))
            }
        };
        if status == ItemStatus::Finished {
            debug!(%item, "item already finished");
            return Ok(CompletedInstance {
                completed: item,
                next: None,
            });
        }

        let finished_at = now_utc_rfc3339();
        match item {
            TrackedItem::Task(id) => {
                db::tasks::set_task_status(self.conn, id, ItemStatus::Finished, &finished_at)?;
            }
            TrackedItem::Event(id) => {
                db::events::set_event_status(self.conn, id, ItemStatus::Finished, &finished_at)?;
            }
        }
        info!(%item, "item completed");

        let Some(template) = template else {
            return Ok(CompletedInstance {
                completed: item,
                next: None,
            });
        };
        if !self.auto_spawns(template)? {
            return Ok(CompletedInstance {
                completed: item,
                next: None,
            });
        }

        match self.spawn_instance(template, None) {
            Ok(next) => Ok(CompletedInstance {
                completed: item,
                next: Some(next),
            }),
            Err(err) => {
                warn!(%item, %template, error = %err, "completion kept; auto-spawn failed");
                Err(err)
            }
        }
    }

    fn auto_spawns(&self, template: TemplateRef) -> Result<bool, AppError> {
        let flag = match template {
            TemplateRef::Task(id) => {
                db::templates::get_task_template(self.conn, id)?.map(|t| t.auto_spawn)
            }
            TemplateRef::Event(id) => {
                db::templates::get_event_template(self.conn, id)?.map(|t| t.auto_spawn)
            }
        };
        Ok(flag.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests;
