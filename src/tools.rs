//! Named operations for agent callers. Arguments and results are JSON; every
//! failure comes back as an `{error, message}` payload instead of an `Err`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::app::{App, AppError};
use crate::domain::{CreatedBy, DependencyType, ItemKind, ItemRef, TemplateRef, TrackedItem};
use crate::migration::MOST_MIGRATED_LIMIT;

pub const TOOL_NAMES: &[&str] = &[
    "add_task_dependency",
    "remove_task_dependency",
    "get_task_dependencies",
    "get_dependent_tasks",
    "get_all_dependencies",
    "get_unblocked_tasks",
    "get_blocked_tasks",
    "get_critical_path",
    "migrate_item_to_collection",
    "supersede_task",
    "get_item_migration_history",
    "get_most_migrated_items",
    "add_item_to_collection",
    "remove_item_from_collection",
    "list_collection_items",
    "get_item_collections",
    "spawn_task_instance",
    "spawn_event_instance",
    "complete_task_instance",
    "complete_event_instance",
    "get_template_instances",
    "get_template_stats",
];

pub fn dispatch(app: &App, name: &str, args: Value) -> Value {
    let request_id = Uuid::now_v7();
    let span = info_span!("tool", %request_id, tool = name);
    let _guard = span.enter();

    let args = if args.is_null() { json!({}) } else { args };
    match run(app, name, args) {
        Ok(payload) => {
            debug!("tool succeeded");
            payload
        }
        Err(err) => failure(err),
    }
}

/// Like [`dispatch`], but takes the arguments as JSON text. Blank text means
/// no arguments; malformed text comes back as an `INVALID_JSON` payload.
pub fn dispatch_raw(app: &App, name: &str, raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return dispatch(app, name, Value::Null);
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(args) => dispatch(app, name, args),
        Err(err) => {
            let _guard = info_span!("tool", tool = name).entered();
            failure(AppError::Json(err))
        }
    }
}

fn failure(err: AppError) -> Value {
    warn!(code = err.code(), error = %err, "tool failed");
    json!({ "error": err.code(), "message": err.to_string() })
}

fn run(app: &App, name: &str, args: Value) -> Result<Value, AppError> {
    match name {
        "add_task_dependency" => {
            let args: AddDependencyArgs = parse(args)?;
            let dependency_type = args.dependency_type.unwrap_or_default();
            let dependency_id = app.dependencies().add_dependency(
                args.task_id,
                args.depends_on_task_id,
                dependency_type,
                Some(args.created_by.unwrap_or_default()),
            )?;
            Ok(success([
                ("dependency_id", json!(dependency_id)),
                (
                    "message",
                    json!(format!(
                        "Dependency added: Task {} depends on Task {}",
                        args.task_id, args.depends_on_task_id
                    )),
                ),
            ]))
        }
        "remove_task_dependency" => {
            let args: RemoveDependencyArgs = parse(args)?;
            match (args.dependency_id, args.task_id, args.depends_on_task_id) {
                (Some(edge_id), _, _) => app.dependencies().remove_dependency(edge_id)?,
                (None, Some(task_id), Some(depends_on)) => app
                    .dependencies()
                    .remove_dependency_between(task_id, depends_on)?,
                _ => {
                    return Err(AppError::InvalidArgument(
                        "pass dependency_id, or task_id with depends_on_task_id".to_string(),
                    ))
                }
            }
            Ok(success([("message", json!("Dependency removed"))]))
        }
        "get_task_dependencies" => {
            let args: TaskArgs = parse(args)?;
            let engine = app.dependencies();
            let dependencies = engine.direct_dependencies(args.task_id)?;
            let edges = engine.list_dependency_edges(args.task_id)?;
            Ok(success([
                ("task_id", json!(args.task_id)),
                ("count", json!(dependencies.len())),
                ("dependencies", to_json(&dependencies)?),
                ("edges", to_json(&edges)?),
            ]))
        }
        "get_dependent_tasks" => {
            let args: TaskArgs = parse(args)?;
            let dependents = app.dependencies().dependents(args.task_id)?;
            Ok(success([
                ("task_id", json!(args.task_id)),
                ("count", json!(dependents.len())),
                ("dependents", to_json(&dependents)?),
            ]))
        }
        "get_all_dependencies" => {
            let args: TaskArgs = parse(args)?;
            let dependencies = app.dependencies().transitive_dependencies(args.task_id)?;
            Ok(success([
                ("task_id", json!(args.task_id)),
                ("count", json!(dependencies.len())),
                ("dependencies", to_json(&dependencies)?),
            ]))
        }
        "get_unblocked_tasks" => {
            let args: CollectionFilterArgs = parse(args)?;
            let tasks = app.dependencies().unblocked_tasks(args.collection_id)?;
            Ok(success([
                ("count", json!(tasks.len())),
                ("tasks", to_json(&tasks)?),
                (
                    "message",
                    json!("These tasks can be started now (no incomplete dependencies)"),
                ),
            ]))
        }
        "get_blocked_tasks" => {
            let args: CollectionFilterArgs = parse(args)?;
            let tasks = app.dependencies().blocked_tasks(args.collection_id)?;
            Ok(success([
                ("count", json!(tasks.len())),
                ("tasks", to_json(&tasks)?),
                (
                    "message",
                    json!("These tasks are blocked by incomplete dependencies"),
                ),
            ]))
        }
        "get_critical_path" => {
            let critical_path = app.dependencies().critical_path()?;
            Ok(success([
                ("critical_path", to_json(&critical_path)?),
                ("message", json!("Longest chain of task dependencies")),
            ]))
        }
        "migrate_item_to_collection" => {
            let args: MigrateArgs = parse(args)?;
            let item = tracked(args.item_type, args.item_id)?;
            let outcome = app.migrations().migrate_item_to_collection(
                item,
                args.to_collection_id,
                args.migrated_by.as_deref(),
                args.reason.as_deref(),
            )?;
            Ok(success([("migration", to_json(&outcome)?)]))
        }
        "supersede_task" => {
            let args: SupersedeArgs = parse(args)?;
            let supersession = app.migrations().supersede_task(args.task_id, args.to_task_id)?;
            Ok(success([("supersession", to_json(&supersession)?)]))
        }
        "get_item_migration_history" => {
            let args: ItemArgs = parse(args)?;
            let item = tracked(args.item_type, args.item_id)?;
            let history = app.migrations().item_history(item)?;
            Ok(success([
                ("count", json!(history.len())),
                ("history", to_json(&history)?),
            ]))
        }
        "get_most_migrated_items" => {
            let args: MostMigratedArgs = parse(args)?;
            let items = app
                .migrations()
                .most_migrated(args.item_type, args.limit.unwrap_or(MOST_MIGRATED_LIMIT))?;
            Ok(success([("items", to_json(&items)?)]))
        }
        "add_item_to_collection" => {
            let args: MembershipArgs = parse(args)?;
            let item = ItemRef::new(args.item_type, args.item_id);
            let membership_id = app
                .memberships()
                .add_item_to_collection(args.collection_id, item)?;
            Ok(success([("membership_id", json!(membership_id))]))
        }
        "remove_item_from_collection" => {
            let args: MembershipArgs = parse(args)?;
            let item = ItemRef::new(args.item_type, args.item_id);
            let removed = app
                .memberships()
                .remove_item_from_collection(args.collection_id, item)?;
            Ok(success([("removed", json!(removed))]))
        }
        "list_collection_items" => {
            let args: CollectionArgs = parse(args)?;
            let items = app.memberships().list_items(args.collection_id)?;
            Ok(success([
                ("count", json!(items.len())),
                ("items", to_json(&items)?),
            ]))
        }
        "get_item_collections" => {
            let args: ItemArgs = parse(args)?;
            let memberships = app
                .memberships()
                .list_collections_containing(ItemRef::new(args.item_type, args.item_id))?;
            Ok(success([
                ("count", json!(memberships.len())),
                ("memberships", to_json(&memberships)?),
            ]))
        }
        "spawn_task_instance" | "spawn_event_instance" => {
            let args: SpawnArgs = parse(args)?;
            let template = if name == "spawn_task_instance" {
                TemplateRef::Task(args.template_id)
            } else {
                TemplateRef::Event(args.template_id)
            };
            let item = app.spawner().spawn_instance(template, args.collection_id)?;
            Ok(success([("item", to_json(&item)?)]))
        }
        "complete_task_instance" => {
            let args: TaskArgs = parse(args)?;
            let outcome = app.spawner().complete_instance(TrackedItem::Task(args.task_id))?;
            Ok(success([("result", to_json(&outcome)?)]))
        }
        "complete_event_instance" => {
            let args: EventArgs = parse(args)?;
            let outcome = app
                .spawner()
                .complete_instance(TrackedItem::Event(args.event_id))?;
            Ok(success([("result", to_json(&outcome)?)]))
        }
        "get_template_instances" => {
            let args: TemplateArgs = parse(args)?;
            let instances = match args.template() {
                TemplateRef::Task(id) => to_json(&app.task_template_instances(id)?)?,
                TemplateRef::Event(id) => to_json(&app.event_template_instances(id)?)?,
            };
            Ok(success([("instances", instances)]))
        }
        "get_template_stats" => {
            let args: TemplateArgs = parse(args)?;
            let stats = app.template_stats(args.template())?;
            Ok(success([("stats", to_json(&stats)?)]))
        }
        _ => Err(AppError::UnknownTool(name.to_string())),
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T, AppError> {
    serde_json::from_value(args)
        .map_err(|err| AppError::InvalidArgument(format!("invalid arguments: {err}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value)?)
}

fn success<const N: usize>(fields: [(&str, Value); N]) -> Value {
    let mut payload = Map::new();
    payload.insert("success".to_string(), Value::Bool(true));
    for (key, value) in fields {
        payload.insert(key.to_string(), value);
    }
    Value::Object(payload)
}

fn tracked(kind: ItemKind, id: i64) -> Result<TrackedItem, AppError> {
    TrackedItem::new(kind, id).ok_or_else(|| {
        AppError::InvalidArgument("only tasks and events can be migrated".to_string())
    })
}

#[derive(Debug, Deserialize)]
struct AddDependencyArgs {
    task_id: i64,
    depends_on_task_id: i64,
    dependency_type: Option<DependencyType>,
    created_by: Option<CreatedBy>,
}

#[derive(Debug, Deserialize)]
struct RemoveDependencyArgs {
    dependency_id: Option<i64>,
    task_id: Option<i64>,
    depends_on_task_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TaskArgs {
    task_id: i64,
}

#[derive(Debug, Deserialize)]
struct EventArgs {
    event_id: i64,
}

#[derive(Debug, Deserialize)]
struct CollectionArgs {
    collection_id: i64,
}

#[derive(Debug, Deserialize)]
struct CollectionFilterArgs {
    collection_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ItemArgs {
    item_id: i64,
    item_type: ItemKind,
}

#[derive(Debug, Deserialize)]
struct MembershipArgs {
    collection_id: i64,
    item_id: i64,
    item_type: ItemKind,
}

#[derive(Debug, Deserialize)]
struct MigrateArgs {
    item_id: i64,
    item_type: ItemKind,
    to_collection_id: i64,
    migrated_by: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupersedeArgs {
    task_id: i64,
    to_task_id: i64,
}

#[derive(Debug, Deserialize)]
struct MostMigratedArgs {
    item_type: Option<ItemKind>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SpawnArgs {
    template_id: i64,
    collection_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TemplateKind {
    Task,
    Event,
}

#[derive(Debug, Deserialize)]
struct TemplateArgs {
    template_type: TemplateKind,
    template_id: i64,
}

impl TemplateArgs {
    fn template(&self) -> TemplateRef {
        match self.template_type {
            TemplateKind::Task => TemplateRef::Task(self.template_id),
            TemplateKind::Event => TemplateRef::Event(self.template_id),
        }
    }
}

#[cfg(test)]
mod tests;
