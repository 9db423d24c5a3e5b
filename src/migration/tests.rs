use crate::domain::{ItemKind, ItemRef, ItemStatus, TrackedItem};
use crate::test_support::TempJournal;

#[test]
fn migration_leaves_exactly_one_membership_and_one_row_per_origin() {
    let journal = TempJournal::new();
    let monday = journal.seed_collection("Monday");
    let backlog = journal.seed_collection("Backlog");
    let tuesday = journal.seed_collection("Tuesday");
    let task = journal.seed_task("call plumber");
    let memberships = journal.memberships();
    memberships
        .add_item_to_collection(monday, ItemRef::Task(task))
        .expect("join monday");
    memberships
        .add_item_to_collection(backlog, ItemRef::Task(task))
        .expect("join backlog");
    memberships
        .add_item_to_collection(backlog, ItemRef::Task(task))
        .expect("duplicate backlog row");

    let outcome = journal
        .migrations()
        .migrate_item_to_collection(TrackedItem::Task(task), tuesday, Some("me"), Some("rolled over"))
        .expect("migration should succeed");
    assert_eq!(outcome.from_collection_ids, vec![monday, backlog]);
    assert_eq!(outcome.history_ids.len(), 2);
    assert!(outcome.status_changed);

    let containing = memberships
        .list_collections_containing(ItemRef::Task(task))
        .expect("lookup should succeed");
    assert_eq!(containing.len(), 1);
    assert_eq!(containing[0].collection_id, tuesday);

    let history = journal
        .migrations()
        .item_history(TrackedItem::Task(task))
        .expect("history should list");
    let origins: Vec<Option<i64>> = history.iter().map(|row| row.from_collection_id).collect();
    assert_eq!(origins, vec![Some(monday), Some(backlog)]);
    assert!(history.iter().all(|row| row.to_collection_id == tuesday));
    assert_eq!(history[0].reason.as_deref(), Some("rolled over"));

    let task = journal.get_task(task).expect("task should load");
    assert_eq!(task.status, ItemStatus::Migrated);
}

#[test]
fn first_placement_records_a_row_without_origin_and_keeps_status() {
    let journal = TempJournal::new();
    let event = journal.seed_event("dentist");

    let outcome = journal
        .migrations()
        .migrate_item_to_collection(TrackedItem::Event(event), 2, None, None)
        .expect("migration should succeed");
    assert!(outcome.from_collection_ids.is_empty());
    assert!(!outcome.status_changed);

    let history = journal
        .migrations()
        .item_history(TrackedItem::Event(event))
        .expect("history should list");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_collection_id, None);
    assert_eq!(history[0].item_type, ItemKind::Event);
    assert_eq!(
        journal.get_event(event).expect("event should load").status,
        ItemStatus::Created
    );
}

#[test]
fn moving_within_a_held_collection_does_not_mark_migrated() {
    let journal = TempJournal::new();
    let project = journal.seed_collection("garage");
    let task = journal.seed_task("sweep");
    let memberships = journal.memberships();
    memberships
        .add_item_to_collection(1, ItemRef::Task(task))
        .expect("join task list");
    memberships
        .add_item_to_collection(project, ItemRef::Task(task))
        .expect("join project");

    let outcome = journal
        .migrations()
        .migrate_item_to_collection(TrackedItem::Task(task), project, None, None)
        .expect("migration should succeed");
    assert!(!outcome.status_changed);
    assert_eq!(
        journal.get_task(task).expect("task should load").status,
        ItemStatus::Created
    );
    assert_eq!(
        memberships
            .list_collections_containing(ItemRef::Task(task))
            .expect("lookup should succeed")
            .len(),
        1
    );
}

#[test]
fn failed_migration_writes_nothing() {
    let journal = TempJournal::new();
    let task = journal.seed_task("orphan");
    journal
        .memberships()
        .add_item_to_collection(1, ItemRef::Task(task))
        .expect("join task list");

    let err = journal
        .migrations()
        .migrate_item_to_collection(TrackedItem::Task(task), 404, None, None)
        .expect_err("unknown destination should fail");
    assert_eq!(err.code(), "NOT_FOUND");
    let err = journal
        .migrations()
        .migrate_item_to_collection(TrackedItem::Event(77), 1, None, None)
        .expect_err("unknown item should fail");
    assert_eq!(err.code(), "NOT_FOUND");

    assert!(journal
        .migrations()
        .all_migrations(None)
        .expect("history should list")
        .is_empty());
    assert!(journal
        .memberships()
        .contains(1, ItemRef::Task(task))
        .expect("contains should run"));
}

#[test]
fn history_queries_slice_by_collection_and_rank_items() {
    let journal = TempJournal::new();
    let a = journal.seed_collection("A");
    let b = journal.seed_collection("B");
    let busy = journal.seed_task("busy");
    let calm = journal.seed_task("calm");
    let tracker = journal.migrations();

    tracker
        .migrate_item_to_collection(TrackedItem::Task(busy), a, None, None)
        .expect("place busy");
    tracker
        .migrate_item_to_collection(TrackedItem::Task(busy), b, None, None)
        .expect("move busy");
    tracker
        .migrate_item_to_collection(TrackedItem::Task(busy), a, None, None)
        .expect("move busy back");
    tracker
        .migrate_item_to_collection(TrackedItem::Task(calm), b, None, None)
        .expect("place calm");

    assert_eq!(
        tracker
            .migration_count(TrackedItem::Task(busy))
            .expect("count should run"),
        3
    );
    assert_eq!(tracker.migrations_from(a, None).expect("should list").len(), 1);
    assert_eq!(tracker.migrations_to(b, None).expect("should list").len(), 2);
    assert!(tracker
        .migrations_to(b, Some(ItemKind::Event))
        .expect("should list")
        .is_empty());

    let ranking = tracker
        .most_migrated(Some(ItemKind::Task), super::MOST_MIGRATED_LIMIT)
        .expect("ranking should run");
    assert_eq!(ranking[0].item_id, busy);
    assert_eq!(ranking[0].migration_count, 3);
    assert_eq!(ranking[1].item_id, calm);
}

#[test]
fn supersession_links_both_tasks() {
    let journal = TempJournal::new();
    let old = journal.seed_task("v1");
    let new = journal.seed_task("v2");

    journal
        .migrations()
        .supersede_task(old, new)
        .expect("supersession should succeed");
    let old_task = journal.get_task(old).expect("old task should load");
    let new_task = journal.get_task(new).expect("new task should load");
    assert_eq!(old_task.status, ItemStatus::Migrated);
    assert_eq!(old_task.migrated_to_id, Some(new));
    assert_eq!(new_task.migrated_from_id, Some(old));
    assert_eq!(new_task.status, ItemStatus::Created);

    let err = journal
        .migrations()
        .supersede_task(old, old)
        .expect_err("self supersession should fail");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
}
