use crate::domain::{CreatedBy, DependencyType, ItemRef, ItemStatus};
use crate::test_support::TempJournal;

fn blocks(journal: &TempJournal, task_id: i64, depends_on: i64) -> Result<i64, crate::app::AppError> {
    journal
        .dependencies()
        .add_dependency(task_id, depends_on, DependencyType::Blocks, Some(CreatedBy::User))
}

#[test]
fn closing_a_chain_is_rejected_as_a_cycle() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");
    let c = journal.seed_task("c");

    blocks(&journal, b, a).expect("b depends on a");
    blocks(&journal, c, b).expect("c depends on b");
    let err = blocks(&journal, a, c).expect_err("a depending on c closes a cycle");
    assert_eq!(err.code(), "CYCLE_DETECTED");

    let edges = journal
        .dependencies()
        .list_dependency_edges(a)
        .expect("edges should list");
    assert_eq!(edges.len(), 1, "rejected edge must not be written");
}

#[test]
fn soft_edges_also_prevent_cycles() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");

    journal
        .dependencies()
        .add_dependency(a, b, DependencyType::Related, None)
        .expect("related edge should insert");
    let err = blocks(&journal, b, a).expect_err("reverse edge closes a cycle");
    assert_eq!(err.code(), "CYCLE_DETECTED");
}

#[test]
fn self_and_duplicate_edges_are_constraint_violations() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");

    let err = blocks(&journal, a, a).expect_err("self edge should fail");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");

    blocks(&journal, a, b).expect("first edge should insert");
    let err = blocks(&journal, a, b).expect_err("duplicate edge should fail");
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");

    let err = blocks(&journal, a, 999).expect_err("unknown task should fail");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn removed_edge_can_be_added_again() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");
    let engine = journal.dependencies();

    let edge = blocks(&journal, a, b).expect("edge should insert");
    engine.remove_dependency(edge).expect("edge should be removed");
    let err = engine
        .remove_dependency(edge)
        .expect_err("second removal should report missing edge");
    assert_eq!(err.code(), "NOT_FOUND");

    blocks(&journal, a, b).expect("edge should insert again");
    engine
        .remove_dependency_between(a, b)
        .expect("edge should be removed by endpoints");
    blocks(&journal, b, a).expect("reverse edge is legal once the original is gone");
}

#[test]
fn finishing_a_blocker_unblocks_its_dependent() {
    let journal = TempJournal::new();
    let t1 = journal.seed_task("T1");
    let t2 = journal.seed_task("T2");
    let t3 = journal.seed_task("T3");
    let t4 = journal.seed_task("T4");
    let engine = journal.dependencies();

    blocks(&journal, t1, t2).expect("T2 blocks T1");
    journal.start_task(t2).expect("T2 should start");

    let unblocked: Vec<i64> = engine
        .unblocked_tasks(None)
        .expect("unblocked should list")
        .iter()
        .map(|task| task.id)
        .collect();
    let blocked: Vec<i64> = engine
        .blocked_tasks(None)
        .expect("blocked should list")
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(unblocked, vec![t2, t3, t4]);
    assert_eq!(blocked, vec![t1]);

    journal.complete_task(t2).expect("T2 should finish");
    let unblocked: Vec<i64> = engine
        .unblocked_tasks(None)
        .expect("unblocked should list")
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(unblocked, vec![t1, t3, t4]);
    assert!(engine
        .blocked_tasks(None)
        .expect("blocked should list")
        .is_empty());
}

#[test]
fn blocked_split_can_be_limited_to_one_collection() {
    let journal = TempJournal::new();
    let project = journal.seed_collection("house");
    let paint = journal.seed_task("paint");
    let primer = journal.seed_task("buy primer");
    let unrelated = journal.seed_task("unrelated");
    blocks(&journal, paint, primer).expect("primer blocks paint");

    let memberships = journal.memberships();
    for task in [paint, primer] {
        memberships
            .add_item_to_collection(project, ItemRef::Task(task))
            .expect("task should join project");
    }

    let engine = journal.dependencies();
    let unblocked: Vec<i64> = engine
        .unblocked_tasks(Some(project))
        .expect("unblocked should list")
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(unblocked, vec![primer]);
    assert!(!unblocked.contains(&unrelated));

    let err = engine
        .blocked_tasks(Some(404))
        .expect_err("unknown collection should fail");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn resolved_tasks_are_in_neither_split() {
    let journal = TempJournal::new();
    let done = journal.seed_task("done");
    journal.complete_task(done).expect("task should finish");
    let engine = journal.dependencies();

    let ids = |tasks: Vec<crate::db::tasks::TaskRecord>| -> Vec<i64> {
        tasks.into_iter().map(|task| task.id).collect()
    };
    assert!(!ids(engine.unblocked_tasks(None).expect("should list")).contains(&done));
    assert!(!ids(engine.blocked_tasks(None).expect("should list")).contains(&done));
    assert_eq!(
        journal.get_task(done).expect("task should load").status,
        ItemStatus::Finished
    );
}

#[test]
fn transitive_dependencies_are_ordered_by_depth() {
    let journal = TempJournal::new();
    let ids: Vec<i64> = (1..=4).map(|n| journal.seed_task(&format!("t{n}"))).collect();
    blocks(&journal, ids[0], ids[1]).expect("edge");
    blocks(&journal, ids[1], ids[2]).expect("edge");
    blocks(&journal, ids[0], ids[3]).expect("edge");

    let found = journal
        .dependencies()
        .transitive_dependencies(ids[0])
        .expect("walk should succeed");
    let pairs: Vec<(i64, usize)> = found.iter().map(|t| (t.task.id, t.depth)).collect();
    assert_eq!(pairs, vec![(ids[1], 1), (ids[3], 1), (ids[2], 2)]);

    let err = journal
        .dependencies()
        .transitive_dependencies(999)
        .expect_err("unknown task should fail");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn critical_path_reports_the_longer_route() {
    let journal = TempJournal::new();
    let root = journal.seed_task("root");
    let mid = journal.seed_task("mid");
    let leaf = journal.seed_task("leaf");
    blocks(&journal, leaf, root).expect("short route");
    blocks(&journal, mid, root).expect("first hop");
    blocks(&journal, leaf, mid).expect("second hop");

    let path = journal
        .dependencies()
        .critical_path()
        .expect("critical path should compute");
    let pairs: Vec<(i64, usize)> = path.iter().map(|t| (t.task.id, t.depth)).collect();
    assert_eq!(pairs, vec![(leaf, 2), (mid, 1), (root, 0)]);
}

#[test]
fn critical_path_is_capped_at_ten_entries() {
    let journal = TempJournal::new();
    let ids: Vec<i64> = (0..12).map(|n| journal.seed_task(&format!("step {n}"))).collect();
    for pair in ids.windows(2) {
        blocks(&journal, pair[1], pair[0]).expect("chain edge");
    }

    let path = journal
        .dependencies()
        .critical_path()
        .expect("critical path should compute");
    assert_eq!(path.len(), 10);
    assert_eq!(path[0].task.id, ids[11]);
    assert_eq!(path[0].depth, 11);
    assert!(path.windows(2).all(|w| w[0].depth >= w[1].depth));
}

#[test]
fn direct_neighbours_follow_edge_direction() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");
    let c = journal.seed_task("c");
    blocks(&journal, a, b).expect("a depends on b");
    blocks(&journal, c, b).expect("c depends on b");

    let engine = journal.dependencies();
    let deps: Vec<i64> = engine
        .direct_dependencies(a)
        .expect("should list")
        .iter()
        .map(|t| t.id)
        .collect();
    let dependents: Vec<i64> = engine
        .dependents(b)
        .expect("should list")
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(deps, vec![b]);
    assert_eq!(dependents, vec![a, c]);
}
