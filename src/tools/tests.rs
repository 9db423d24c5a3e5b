use serde_json::{json, Value};

use super::{dispatch, dispatch_raw, TOOL_NAMES};
use crate::app::CreateTaskTemplate;
use crate::test_support::TempJournal;

fn call(journal: &TempJournal, name: &str, args: Value) -> Value {
    dispatch(journal, name, args)
}

#[test]
fn unknown_tool_is_reported_in_payload() {
    let journal = TempJournal::new();
    let payload = call(&journal, "make_coffee", Value::Null);
    assert_eq!(payload["error"], "UNKNOWN_TOOL");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.contains("make_coffee")));
}

#[test]
fn raw_arguments_are_parsed_inside_the_tool_layer() {
    let journal = TempJournal::new();
    let malformed = dispatch_raw(&journal, "add_task_dependency", "{bad");
    assert_eq!(malformed["error"], "INVALID_JSON");
    assert!(malformed.get("success").is_none());

    let blank = dispatch_raw(&journal, "get_critical_path", "   ");
    assert_eq!(blank["success"], true);

    let a = journal.seed_task("a");
    let b = journal.seed_task("b");
    let added = dispatch_raw(
        &journal,
        "add_task_dependency",
        &format!(r#"{{"task_id":{a},"depends_on_task_id":{b}}}"#),
    );
    assert_eq!(added["success"], true);
}

#[test]
fn every_listed_tool_is_routed() {
    let journal = TempJournal::new();
    for name in TOOL_NAMES {
        let payload = call(&journal, name, json!({ "not": "valid" }));
        assert_ne!(payload["error"], "UNKNOWN_TOOL", "{name} is not routed");
    }
}

#[test]
fn dependency_tools_report_cycles_as_structured_errors() {
    let journal = TempJournal::new();
    let a = journal.seed_task("a");
    let b = journal.seed_task("b");

    let added = call(
        &journal,
        "add_task_dependency",
        json!({ "task_id": a, "depends_on_task_id": b }),
    );
    assert_eq!(added["success"], true);
    assert!(added["dependency_id"].as_i64().is_some());

    let cycle = call(
        &journal,
        "add_task_dependency",
        json!({ "task_id": b, "depends_on_task_id": a, "dependency_type": "related" }),
    );
    assert_eq!(cycle["error"], "CYCLE_DETECTED");

    let blocked = call(&journal, "get_blocked_tasks", json!({}));
    assert_eq!(blocked["count"], 1);
    assert_eq!(blocked["tasks"][0]["id"], a);

    let path = call(&journal, "get_critical_path", Value::Null);
    assert_eq!(path["critical_path"][0]["id"], a);
    assert_eq!(path["critical_path"][0]["depth"], 1);

    let removed = call(
        &journal,
        "remove_task_dependency",
        json!({ "task_id": a, "depends_on_task_id": b }),
    );
    assert_eq!(removed["success"], true);
    let missing = call(&journal, "remove_task_dependency", json!({ "task_id": a }));
    assert_eq!(missing["error"], "INVALID_ARGUMENT");
}

#[test]
fn bad_arguments_are_invalid_argument_errors() {
    let journal = TempJournal::new();
    let payload = call(&journal, "get_all_dependencies", json!({ "task_id": "seven" }));
    assert_eq!(payload["error"], "INVALID_ARGUMENT");

    let payload = call(
        &journal,
        "migrate_item_to_collection",
        json!({ "item_id": 1, "item_type": "Collection", "to_collection_id": 1 }),
    );
    assert_eq!(payload["error"], "INVALID_ARGUMENT");
}

#[test]
fn migration_and_membership_tools_round_out_the_item_story() {
    let journal = TempJournal::new();
    let task = journal.seed_task("move me");

    let added = call(
        &journal,
        "add_item_to_collection",
        json!({ "collection_id": 1, "item_id": task, "item_type": "Task" }),
    );
    assert_eq!(added["success"], true);

    let moved = call(
        &journal,
        "migrate_item_to_collection",
        json!({ "item_id": task, "item_type": "task", "to_collection_id": 2, "reason": "wrong list" }),
    );
    assert_eq!(moved["migration"]["status_changed"], true);
    assert_eq!(moved["migration"]["from_collection_ids"], json!([1]));

    let history = call(
        &journal,
        "get_item_migration_history",
        json!({ "item_id": task, "item_type": "Task" }),
    );
    assert_eq!(history["count"], 1);
    assert_eq!(history["history"][0]["reason"], "wrong list");

    let collections = call(
        &journal,
        "get_item_collections",
        json!({ "item_id": task, "item_type": "Task" }),
    );
    assert_eq!(collections["memberships"][0]["collectionId"], 2);

    let ranking = call(&journal, "get_most_migrated_items", json!({ "limit": 5 }));
    assert_eq!(ranking["items"][0]["item_id"], task);
}

#[test]
fn instance_tools_spawn_and_chain() {
    let journal = TempJournal::new();
    let template = journal
        .create_task_template(&CreateTaskTemplate {
            title: "stretch".to_string(),
            auto_spawn: true,
            ..Default::default()
        })
        .expect("template should be created")
        .id;

    let spawned = call(&journal, "spawn_task_instance", json!({ "template_id": template }));
    assert_eq!(spawned["item"]["itemType"], "Task");
    let first = spawned["item"]["itemId"].as_i64().expect("spawned id should be numeric");

    let completed = call(&journal, "complete_task_instance", json!({ "task_id": first }));
    assert_eq!(completed["result"]["completed"]["itemId"], first);
    assert!(completed["result"]["next"]["itemId"].as_i64().is_some());

    let stats = call(
        &journal,
        "get_template_stats",
        json!({ "template_type": "task", "template_id": template }),
    );
    assert_eq!(stats["stats"]["total_instances"], 2);
    assert_eq!(stats["stats"]["completed"], 1);

    let instances = call(
        &journal,
        "get_template_instances",
        json!({ "template_type": "task", "template_id": template }),
    );
    assert_eq!(instances["instances"][0]["instanceNumber"], 2);

    let missing = call(&journal, "spawn_event_instance", json!({ "template_id": template + 100 }));
    assert_eq!(missing["error"], "NOT_FOUND");
}
