use crate::app::{CreateEventTemplate, CreateTaskTemplate};
use crate::domain::{ItemRef, ItemStatus, Metadata, TemplateRef, TrackedItem};
use crate::test_support::TempJournal;
use serde_json::json;

fn task_template(journal: &TempJournal, auto_spawn: bool, collection: Option<i64>) -> i64 {
    let mut metadata = Metadata::new();
    metadata.insert("cadence".to_string(), json!("weekly"));
    journal
        .create_task_template(&CreateTaskTemplate {
            title: "Water plants".to_string(),
            description: Some("all of them".to_string()),
            topic: Some("home".to_string()),
            metadata,
            auto_spawn,
            default_collection_id: collection,
        })
        .expect("template should be created")
        .id
}

fn task_id(item: TrackedItem) -> i64 {
    match item {
        TrackedItem::Task(id) => id,
        TrackedItem::Event(_) => panic!("expected a task, got {item}"),
    }
}

#[test]
fn spawned_instances_are_numbered_per_template() {
    let journal = TempJournal::new();
    let first = task_template(&journal, false, None);
    let second = task_template(&journal, false, None);
    let spawner = journal.spawner();

    let a = spawner
        .spawn_instance(TemplateRef::Task(first), None)
        .expect("spawn should succeed");
    spawner
        .spawn_instance(TemplateRef::Task(second), None)
        .expect("spawn should succeed");
    let b = spawner
        .spawn_instance(TemplateRef::Task(first), None)
        .expect("spawn should succeed");

    let a = journal.get_task(task_id(a)).expect("instance should load");
    let b = journal.get_task(task_id(b)).expect("instance should load");
    assert_eq!(a.instance_number, Some(1));
    assert_eq!(b.instance_number, Some(2));
    assert_eq!(a.template_id, Some(first));
    assert_eq!(a.title, "Water plants");
    assert_eq!(a.topic.as_deref(), Some("home"));
    assert_eq!(a.metadata.get("cadence"), Some(&json!("weekly")));
    assert_eq!(a.status, ItemStatus::Created);
}

#[test]
fn explicit_collection_wins_over_template_default() {
    let journal = TempJournal::new();
    let chores = journal.seed_collection("chores");
    let template = task_template(&journal, false, Some(chores));
    let spawner = journal.spawner();

    let defaulted = spawner
        .spawn_instance(TemplateRef::Task(template), None)
        .expect("spawn should succeed");
    let explicit = spawner
        .spawn_instance(TemplateRef::Task(template), Some(1))
        .expect("spawn should succeed");

    let memberships = journal.memberships();
    assert!(memberships
        .contains(chores, ItemRef::from(defaulted))
        .expect("contains should run"));
    assert!(memberships
        .contains(1, ItemRef::from(explicit))
        .expect("contains should run"));
    assert!(!memberships
        .contains(chores, ItemRef::from(explicit))
        .expect("contains should run"));
}

#[test]
fn unplaced_template_spawns_without_membership() {
    let journal = TempJournal::new();
    let template = journal
        .create_event_template(&CreateEventTemplate {
            title: "Standup".to_string(),
            location: Some("room 4".to_string()),
            ..Default::default()
        })
        .expect("template should be created")
        .id;

    let item = journal
        .spawner()
        .spawn_instance(TemplateRef::Event(template), None)
        .expect("spawn should succeed");
    let TrackedItem::Event(event_id) = item else {
        panic!("expected an event, got {item}");
    };
    let event = journal.get_event(event_id).expect("event should load");
    assert_eq!(event.location.as_deref(), Some("room 4"));
    assert_eq!(event.instance_number, Some(1));
    assert!(journal
        .memberships()
        .list_collections_containing(ItemRef::Event(event_id))
        .expect("lookup should run")
        .is_empty());
}

#[test]
fn missing_template_is_not_found_and_writes_nothing() {
    let journal = TempJournal::new();
    let err = journal
        .spawner()
        .spawn_instance(TemplateRef::Task(42), Some(1))
        .expect_err("unknown template should fail");
    assert_eq!(err.code(), "NOT_FOUND");
    assert!(journal
        .list_tasks(&Default::default())
        .expect("tasks should list")
        .is_empty());
}

#[test]
fn completing_an_auto_spawn_instance_chains_the_next() {
    let journal = TempJournal::new();
    let template = task_template(&journal, true, None);
    let spawner = journal.spawner();
    let first = spawner
        .spawn_instance(TemplateRef::Task(template), None)
        .expect("spawn should succeed");

    let outcome = spawner
        .complete_instance(first)
        .expect("completion should succeed");
    assert_eq!(outcome.completed, first);
    let next = outcome.next.expect("auto spawn should produce a next instance");

    let done = journal.get_task(task_id(first)).expect("first should load");
    let next = journal.get_task(task_id(next)).expect("next should load");
    assert_eq!(done.status, ItemStatus::Finished);
    assert!(done.end_date.is_some());
    assert_eq!(next.instance_number, done.instance_number.map(|n| n + 1));

    let stats = journal
        .template_stats(TemplateRef::Task(template))
        .expect("stats should compute");
    assert_eq!(stats.total_instances, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 1);
}

#[test]
fn completing_a_finished_instance_again_spawns_nothing() {
    let journal = TempJournal::new();
    let template = task_template(&journal, true, None);
    let spawner = journal.spawner();
    let first = spawner
        .spawn_instance(TemplateRef::Task(template), None)
        .expect("spawn should succeed");

    let outcome = spawner
        .complete_instance(first)
        .expect("completion should succeed");
    assert!(outcome.next.is_some());
    let finished_at = journal
        .get_task(task_id(first))
        .expect("first should load")
        .end_date;

    let repeat = spawner
        .complete_instance(first)
        .expect("repeated completion should succeed");
    assert_eq!(repeat.completed, first);
    assert_eq!(repeat.next, None);
    assert_eq!(
        journal.get_task(task_id(first)).expect("first should load").end_date,
        finished_at
    );

    let stats = journal
        .template_stats(TemplateRef::Task(template))
        .expect("stats should compute");
    assert_eq!(stats.total_instances, 2);
}

#[test]
fn completing_without_auto_spawn_returns_only_completed() {
    let journal = TempJournal::new();
    let template = task_template(&journal, false, None);
    let plain = journal.seed_task("one-off");
    let spawner = journal.spawner();
    let instance = spawner
        .spawn_instance(TemplateRef::Task(template), None)
        .expect("spawn should succeed");

    let outcome = spawner
        .complete_instance(instance)
        .expect("completion should succeed");
    assert_eq!(outcome.next, None);
    let payload = serde_json::to_value(outcome).expect("outcome should serialize");
    assert!(payload.get("next").is_none());

    let outcome = spawner
        .complete_instance(TrackedItem::Task(plain))
        .expect("plain task completion should succeed");
    assert_eq!(outcome.next, None);

    let err = spawner
        .complete_instance(TrackedItem::Event(99))
        .expect_err("unknown event should fail");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn failed_auto_spawn_keeps_the_completion() {
    let journal = TempJournal::new();
    let template = task_template(&journal, true, None);
    let first = journal
        .spawner()
        .spawn_instance(TemplateRef::Task(template), None)
        .expect("spawn should succeed");

    let side = crate::db::open_connection(&journal.db_path(), 5000)
        .expect("second connection should open");
    side.execute_batch(
        r#"
CREATE TRIGGER refuse_second_instance
BEFORE INSERT ON tasks
WHEN NEW.instance_number = 2
BEGIN
    SELECT RAISE(ABORT, 'no more instances');
END;
"#,
    )
    .expect("trigger should install");

    let err = journal
        .spawner()
        .complete_instance(first)
        .expect_err("auto spawn should fail");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
    assert_eq!(
        journal.get_task(task_id(first)).expect("first should load").status,
        ItemStatus::Finished
    );
    assert_eq!(
        journal
            .task_template_instances(template)
            .expect("instances should list")
            .len(),
        1
    );
}
