use crate::app::{
    App, AppError, CreateCollection, CreateEvent, CreateEventTemplate, CreateTask,
    CreateTaskTemplate,
};
use crate::cli::{
    CollectionSubcommands, DepSubcommands, EventSubcommands, HistorySubcommands,
    InstanceSubcommands, MigrateSubcommands, TaskSubcommands, TemplateKindArg,
    TemplateSubcommands,
};
use crate::db::collections::CollectionFilter;
use crate::db::events::{EventFilter, EventPatch};
use crate::db::tasks::{TaskFilter, TaskPatch};
use crate::db::templates::TemplatePatch;
use crate::domain::{metadata, ItemKind, ItemRef, Metadata, TemplateRef, TrackedItem};
use crate::print_json;
use crate::ui::{self, ListFilterSummary, Palette};

pub fn run_task_command(app: &App, command: TaskSubcommands) -> Result<(), AppError> {
    let palette = Palette::auto();
    match command {
        TaskSubcommands::New(args) => {
            let task = app.create_task(&CreateTask {
                title: args.title,
                description: args.description,
                topic: args.topic,
                metadata: metadata_arg(args.metadata.as_deref())?,
                collection_id: args.collection_id,
            })?;
            println!(
                "created {} {} {}",
                palette.id(&format!("#{}", task.id)),
                palette.status(task.status),
                task.title
            );
        }
        TaskSubcommands::Show(args) => {
            let task = app.get_task(args.id)?;
            if args.json {
                print_json(&task);
            } else {
                ui::print_task_show(&task);
            }
        }
        TaskSubcommands::Ls(args) => {
            let tasks = app.list_tasks(&TaskFilter {
                status: args.status,
                collection_id: args.collection_id,
            })?;
            if args.json {
                print_json(&tasks);
            } else {
                ui::print_task_list(
                    &tasks,
                    &ListFilterSummary {
                        status: args.status,
                        collection_id: args.collection_id,
                        include_archived: false,
                    },
                );
            }
        }
        TaskSubcommands::Update(args) => {
            let task = app.update_task(
                args.id,
                &TaskPatch {
                    title: args.title,
                    description: args.description,
                    topic: args.topic,
                    status: args.status,
                    metadata: optional_metadata_arg(args.metadata.as_deref())?,
                },
            )?;
            println!("updated #{} [{}] {}", task.id, task.status, task.title);
        }
        TaskSubcommands::Start(args) => {
            let task = app.start_task(args.id)?;
            println!("updated #{} -> {}", task.id, task.status);
        }
        TaskSubcommands::Done(args) if args.no_spawn => {
            let task = app.complete_task(args.id)?;
            println!("updated #{} -> {}", task.id, task.status);
        }
        TaskSubcommands::Done(args) => {
            let outcome = app.spawner().complete_instance(TrackedItem::Task(args.id))?;
            println!("finished {}", outcome.completed);
            if let Some(next) = outcome.next {
                println!("spawned {next}");
            }
        }
        TaskSubcommands::Cancel(args) => {
            let task = app.cancel_task(args.id)?;
            println!("updated #{} -> {}", task.id, task.status);
        }
        TaskSubcommands::Rm(args) => {
            app.delete_task(args.id)?;
            println!("deleted task {}", args.id);
        }
    }
    Ok(())
}

pub fn run_event_command(app: &App, command: EventSubcommands) -> Result<(), AppError> {
    let palette = Palette::auto();
    match command {
        EventSubcommands::New(args) => {
            let event = app.create_event(&CreateEvent {
                title: args.title,
                description: args.description,
                location: args.location,
                link: args.link,
                scheduled_date: args.scheduled_date,
                metadata: metadata_arg(args.metadata.as_deref())?,
                collection_id: args.collection_id,
            })?;
            println!(
                "created {} {} {}",
                palette.id(&format!("#{}", event.id)),
                palette.status(event.status),
                event.title
            );
        }
        EventSubcommands::Show(args) => {
            let event = app.get_event(args.id)?;
            if args.json {
                print_json(&event);
            } else {
                ui::print_event_list(std::slice::from_ref(&event), &ListFilterSummary::default());
            }
        }
        EventSubcommands::Ls(args) => {
            let events = app.list_events(&EventFilter {
                status: args.status,
                collection_id: args.collection_id,
            })?;
            if args.json {
                print_json(&events);
            } else {
                ui::print_event_list(
                    &events,
                    &ListFilterSummary {
                        status: args.status,
                        collection_id: args.collection_id,
                        include_archived: false,
                    },
                );
            }
        }
        EventSubcommands::Update(args) => {
            let event = app.update_event(
                args.id,
                &EventPatch {
                    title: args.title,
                    description: args.description,
                    location: args.location,
                    link: args.link,
                    scheduled_date: args.scheduled_date,
                    status: args.status,
                    metadata: optional_metadata_arg(args.metadata.as_deref())?,
                },
            )?;
            println!("updated #{} [{}] {}", event.id, event.status, event.title);
        }
        EventSubcommands::Start(args) => {
            let event = app.start_event(args.id)?;
            println!("updated #{} -> {}", event.id, event.status);
        }
        EventSubcommands::Done(args) if args.no_spawn => {
            let event = app.complete_event(args.id)?;
            println!("updated #{} -> {}", event.id, event.status);
        }
        EventSubcommands::Done(args) => {
            let outcome = app.spawner().complete_instance(TrackedItem::Event(args.id))?;
            println!("finished {}", outcome.completed);
            if let Some(next) = outcome.next {
                println!("spawned {next}");
            }
        }
        EventSubcommands::Cancel(args) => {
            let event = app.cancel_event(args.id)?;
            println!("updated #{} -> {}", event.id, event.status);
        }
        EventSubcommands::Rm(args) => {
            app.delete_event(args.id)?;
            println!("deleted event {}", args.id);
        }
    }
    Ok(())
}

pub fn run_collection_command(app: &App, command: CollectionSubcommands) -> Result<(), AppError> {
    match command {
        CollectionSubcommands::New(args) => {
            let collection = app.create_collection(&CreateCollection {
                title: args.title,
                description: args.description,
                long_description: args.long_description,
                collection_type: args.collection_type,
                sub_type: args.sub_type,
                start_date: args.start_date,
                end_date: args.end_date,
                metadata: metadata_arg(args.metadata.as_deref())?,
            })?;
            println!(
                "created collection #{} ({}) {}",
                collection.id, collection.collection_type, collection.title
            );
        }
        CollectionSubcommands::Show(args) => {
            let collection = app.get_collection(args.id)?;
            if args.json {
                print_json(&collection);
            } else {
                ui::print_collection_list(
                    std::slice::from_ref(&collection),
                    &ListFilterSummary::default(),
                );
            }
        }
        CollectionSubcommands::Ls(args) => {
            let collections = app.list_collections(&CollectionFilter {
                collection_type: args.collection_type,
                sub_type: args.sub_type,
                include_archived: args.all,
            })?;
            if args.json {
                print_json(&collections);
            } else {
                ui::print_collection_list(
                    &collections,
                    &ListFilterSummary {
                        include_archived: args.all,
                        ..ListFilterSummary::default()
                    },
                );
            }
        }
        CollectionSubcommands::Archive(args) => {
            let collection = app.archive_collection(args.id)?;
            println!("archived collection #{}", collection.id);
        }
        CollectionSubcommands::Unarchive(args) => {
            let collection = app.unarchive_collection(args.id)?;
            println!("restored collection #{}", collection.id);
        }
        CollectionSubcommands::Rm(args) => {
            app.delete_collection(args.id)?;
            println!("deleted collection {}", args.id);
        }
        CollectionSubcommands::Add(args) => {
            let item = ItemRef::new(args.item_type, args.item_id);
            let membership_id = app
                .memberships()
                .add_item_to_collection(args.collection_id, item)?;
            println!(
                "added {item} to collection #{} (membership {membership_id})",
                args.collection_id
            );
        }
        CollectionSubcommands::Remove(args) => {
            let item = ItemRef::new(args.item_type, args.item_id);
            let removed = app
                .memberships()
                .remove_item_from_collection(args.collection_id, item)?;
            println!(
                "removed {item} from collection #{} ({removed} row(s))",
                args.collection_id
            );
        }
        CollectionSubcommands::Items(args) => {
            let items = app.memberships().list_items(args.id)?;
            if args.json {
                print_json(&items);
            } else {
                for membership in &items {
                    println!("{}", membership.item());
                }
            }
        }
        CollectionSubcommands::Containing(args) => {
            let item = ItemRef::new(args.item_type, args.item_id);
            let memberships = app.memberships().list_collections_containing(item)?;
            if args.json {
                print_json(&memberships);
            } else {
                for membership in &memberships {
                    println!("collection #{}", membership.collection_id);
                }
            }
        }
    }
    Ok(())
}

pub fn run_dep_command(app: &App, command: DepSubcommands) -> Result<(), AppError> {
    let engine = app.dependencies();
    match command {
        DepSubcommands::Add(args) => {
            let id = engine.add_dependency(
                args.task_id,
                args.depends_on_task_id,
                args.dependency_type,
                Some(args.created_by),
            )?;
            println!(
                "task {} now depends on task {} ({}, edge {id})",
                args.task_id, args.depends_on_task_id, args.dependency_type
            );
        }
        DepSubcommands::Rm(args) => {
            engine.remove_dependency_between(args.task_id, args.depends_on_task_id)?;
            println!(
                "task {} no longer depends on task {}",
                args.task_id, args.depends_on_task_id
            );
        }
        DepSubcommands::RmEdge(args) => {
            engine.remove_dependency(args.id)?;
            println!("removed dependency edge {}", args.id);
        }
        DepSubcommands::Ls(args) => {
            let tasks = engine.direct_dependencies(args.id)?;
            if args.json {
                let edges = engine.list_dependency_edges(args.id)?;
                print_json(&serde_json::json!({ "dependencies": tasks, "edges": edges }));
            } else {
                ui::print_task_list(&tasks, &ListFilterSummary::default());
            }
        }
        DepSubcommands::Dependents(args) => {
            let tasks = engine.dependents(args.id)?;
            if args.json {
                print_json(&tasks);
            } else {
                ui::print_task_list(&tasks, &ListFilterSummary::default());
            }
        }
        DepSubcommands::All(args) => {
            let rows = engine.transitive_dependencies(args.id)?;
            if args.json {
                print_json(&rows);
            } else {
                ui::print_depth_list("Dependencies", &rows);
            }
        }
        DepSubcommands::Unblocked(args) => {
            let tasks = engine.unblocked_tasks(args.collection_id)?;
            if args.json {
                print_json(&tasks);
            } else {
                ui::print_task_list(
                    &tasks,
                    &ListFilterSummary {
                        collection_id: args.collection_id,
                        ..ListFilterSummary::default()
                    },
                );
            }
        }
        DepSubcommands::Blocked(args) => {
            let tasks = engine.blocked_tasks(args.collection_id)?;
            if args.json {
                print_json(&tasks);
            } else {
                ui::print_task_list(
                    &tasks,
                    &ListFilterSummary {
                        collection_id: args.collection_id,
                        ..ListFilterSummary::default()
                    },
                );
            }
        }
        DepSubcommands::Critical(args) => {
            let rows = engine.critical_path()?;
            if args.json {
                print_json(&rows);
            } else {
                ui::print_depth_list("Critical path", &rows);
            }
        }
    }
    Ok(())
}

pub fn run_migrate_command(app: &App, command: MigrateSubcommands) -> Result<(), AppError> {
    let tracker = app.migrations();
    match command {
        MigrateSubcommands::Item(args) => {
            let item = tracked_arg(args.item_type, args.item_id)?;
            let outcome = tracker.migrate_item_to_collection(
                item,
                args.to_collection_id,
                args.migrated_by.as_deref(),
                args.reason.as_deref(),
            )?;
            if args.json {
                print_json(&outcome);
            } else {
                println!(
                    "moved {} to collection #{} ({} history row(s))",
                    outcome.item,
                    outcome.to_collection_id,
                    outcome.history_ids.len()
                );
            }
        }
        MigrateSubcommands::Supersede(args) => {
            let supersession = tracker.supersede_task(args.task_id, args.to_task_id)?;
            println!(
                "task {} superseded by task {}",
                supersession.task_id, supersession.to_task_id
            );
        }
    }
    Ok(())
}

pub fn run_history_command(app: &App, command: HistorySubcommands) -> Result<(), AppError> {
    let tracker = app.migrations();
    match command {
        HistorySubcommands::Item(args) => {
            let rows = tracker.item_history(tracked_arg(args.item_type, args.item_id)?)?;
            render_history(&rows, args.json);
        }
        HistorySubcommands::From(args) => {
            let rows = tracker.migrations_from(args.collection_id, args.item_type)?;
            render_history(&rows, args.json);
        }
        HistorySubcommands::To(args) => {
            let rows = tracker.migrations_to(args.collection_id, args.item_type)?;
            render_history(&rows, args.json);
        }
        HistorySubcommands::All(args) => {
            let rows = tracker.all_migrations(args.item_type)?;
            render_history(&rows, args.json);
        }
        HistorySubcommands::Count(args) => {
            let item = tracked_arg(args.item_type, args.item_id)?;
            let count = tracker.migration_count(item)?;
            if args.json {
                print_json(&serde_json::json!({ "item": item, "migration_count": count }));
            } else {
                println!("{item} moved {count} time(s)");
            }
        }
        HistorySubcommands::Top(args) => {
            let rows = tracker.most_migrated(args.item_type, args.limit)?;
            if args.json {
                print_json(&rows);
            } else {
                for row in &rows {
                    println!("{} #{} {}", row.item_type, row.item_id, row.migration_count);
                }
            }
        }
    }
    Ok(())
}

pub fn run_template_command(app: &App, command: TemplateSubcommands) -> Result<(), AppError> {
    match command {
        TemplateSubcommands::New(args) => {
            let metadata = metadata_arg(args.metadata.as_deref())?;
            let id = match args.kind {
                TemplateKindArg::Task => {
                    app.create_task_template(&CreateTaskTemplate {
                        title: args.title,
                        description: args.description,
                        topic: args.topic,
                        metadata,
                        auto_spawn: args.auto_spawn,
                        default_collection_id: args.default_collection_id,
                    })?
                    .id
                }
                TemplateKindArg::Event => {
                    app.create_event_template(&CreateEventTemplate {
                        title: args.title,
                        description: args.description,
                        location: args.location,
                        link: args.link,
                        metadata,
                        auto_spawn: args.auto_spawn,
                        default_collection_id: args.default_collection_id,
                    })?
                    .id
                }
            };
            println!("created {}", args.kind.with_id(id));
        }
        TemplateSubcommands::Show(args) => match args.kind.with_id(args.id) {
            TemplateRef::Task(id) => {
                let template = app.get_task_template(id)?;
                if args.json {
                    print_json(&template);
                } else {
                    println!("task template #{} {}", template.id, template.title);
                }
            }
            TemplateRef::Event(id) => {
                let template = app.get_event_template(id)?;
                if args.json {
                    print_json(&template);
                } else {
                    println!("event template #{} {}", template.id, template.title);
                }
            }
        },
        TemplateSubcommands::Ls(args) => match args.kind {
            TemplateKindArg::Task => {
                let templates = app.list_task_templates()?;
                if args.json {
                    print_json(&templates);
                } else {
                    for template in &templates {
                        println!("#{} {}", template.id, template.title);
                    }
                }
            }
            TemplateKindArg::Event => {
                let templates = app.list_event_templates()?;
                if args.json {
                    print_json(&templates);
                } else {
                    for template in &templates {
                        println!("#{} {}", template.id, template.title);
                    }
                }
            }
        },
        TemplateSubcommands::Update(args) => {
            let template = args.kind.with_id(args.id);
            app.update_template(
                template,
                &TemplatePatch {
                    title: args.title,
                    description: args.description,
                    topic: args.topic,
                    location: args.location,
                    link: args.link,
                    metadata: optional_metadata_arg(args.metadata.as_deref())?,
                    auto_spawn: args.auto_spawn,
                    default_collection_id: args.default_collection_id,
                },
            )?;
            println!("updated {template}");
        }
        TemplateSubcommands::Rm(args) => {
            let template = args.kind.with_id(args.id);
            app.delete_template(template)?;
            println!("deleted {template}");
        }
        TemplateSubcommands::Instances(args) => match args.kind.with_id(args.id) {
            TemplateRef::Task(id) => {
                let tasks = app.task_template_instances(id)?;
                if args.json {
                    print_json(&tasks);
                } else {
                    ui::print_task_list(&tasks, &ListFilterSummary::default());
                }
            }
            TemplateRef::Event(id) => {
                let events = app.event_template_instances(id)?;
                if args.json {
                    print_json(&events);
                } else {
                    ui::print_event_list(&events, &ListFilterSummary::default());
                }
            }
        },
        TemplateSubcommands::Stats(args) => {
            let stats = app.template_stats(args.kind.with_id(args.id))?;
            if args.json {
                print_json(&stats);
            } else {
                println!(
                    "total={} completed={} active={} canceled={}",
                    stats.total_instances, stats.completed, stats.active, stats.canceled
                );
            }
        }
    }
    Ok(())
}

pub fn run_instance_command(app: &App, command: InstanceSubcommands) -> Result<(), AppError> {
    let spawner = app.spawner();
    match command {
        InstanceSubcommands::Spawn(args) => {
            let item = spawner.spawn_instance(args.kind.with_id(args.template_id), args.collection_id)?;
            println!("spawned {item}");
        }
        InstanceSubcommands::Done(args) => {
            let outcome = spawner.complete_instance(tracked_arg(args.item_type, args.item_id)?)?;
            if args.json {
                print_json(&outcome);
            } else {
                println!("finished {}", outcome.completed);
                if let Some(next) = outcome.next {
                    println!("spawned {next}");
                }
            }
        }
    }
    Ok(())
}

fn render_history(rows: &[crate::db::history::HistoryRecord], json: bool) {
    if json {
        print_json(&rows);
    } else {
        ui::print_history(rows);
    }
}

fn tracked_arg(kind: ItemKind, id: i64) -> Result<TrackedItem, AppError> {
    TrackedItem::new(kind, id).ok_or_else(|| {
        AppError::InvalidArgument("collections have no migration history".to_string())
    })
}

fn metadata_arg(raw: Option<&str>) -> Result<Metadata, AppError> {
    Ok(optional_metadata_arg(raw)?.unwrap_or_default())
}

fn optional_metadata_arg(raw: Option<&str>) -> Result<Option<Metadata>, AppError> {
    raw.map(|raw| metadata::parse_object(raw).map_err(AppError::InvalidArgument))
        .transpose()
}
