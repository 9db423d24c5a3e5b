use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_jrnl(db_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jrnl"))
        .arg("--db")
        .arg(db_path)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("JRNL_CONFIG")
        .env_remove("JRNL_DB_PATH")
        .output()
        .expect("jrnl command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn create_task(db: &Path, title: &str) -> i64 {
    assert_success(&run_jrnl(db, &["task", "new", title]));
    let listed = run_jrnl(db, &["task", "ls", "--json"]);
    assert_success(&listed);
    parse_json(&listed)
        .as_array()
        .expect("task list should be an array")
        .iter()
        .find(|task| task["title"] == title)
        .and_then(|task| task["id"].as_i64())
        .expect("created task should be listed")
}

#[test]
fn task_lifecycle_round_trips_through_the_binary() {
    let root = unique_workspace("jrnl-cli-lifecycle");
    let db = root.join(".journal/journal.sqlite");

    let id = create_task(&db, "Water plants");
    assert!(db.exists(), "database should be created under a fresh directory");

    assert_success(&run_jrnl(&db, &["task", "start", &id.to_string()]));
    let shown = run_jrnl(&db, &["task", "show", &id.to_string(), "--json"]);
    assert_success(&shown);
    assert_eq!(parse_json(&shown)["status"], "IN_PROGRESS");

    let done = run_jrnl(&db, &["task", "done", &id.to_string()]);
    assert_success(&done);
    assert!(String::from_utf8_lossy(&done.stdout).contains(&format!("finished task {id}")));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn cyclic_dependency_is_rejected_with_exit_code() {
    let root = unique_workspace("jrnl-cli-cycle");
    let db = root.join("journal.sqlite");
    let first = create_task(&db, "Design").to_string();
    let second = create_task(&db, "Build").to_string();

    assert_success(&run_jrnl(&db, &["dep", "add", &second, &first]));
    let cyclic = run_jrnl(&db, &["dep", "add", &first, &second]);
    assert_failure(&cyclic);
    assert_eq!(cyclic.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&cyclic.stderr).contains("circular dependency"));
    assert!(
        !String::from_utf8_lossy(&cyclic.stderr).contains('\x1b'),
        "piped stderr should carry no escape codes"
    );

    let blocked = run_jrnl(&db, &["dep", "blocked", "--json"]);
    assert_success(&blocked);
    let blocked = parse_json(&blocked);
    let titles = blocked
        .as_array()
        .expect("blocked list should be an array")
        .iter()
        .map(|task| task["title"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Build".to_string()]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn tool_invocation_reports_success_and_error_payloads() {
    let root = unique_workspace("jrnl-cli-tool");
    let db = root.join("journal.sqlite");
    let first = create_task(&db, "Outline");
    let second = create_task(&db, "Draft");

    let args = format!(r#"{{"task_id":{second},"depends_on_task_id":{first}}}"#);
    let added = run_jrnl(&db, &["tool", "add_task_dependency", "--args", &args]);
    assert_success(&added);
    let added = parse_json(&added);
    assert_eq!(added["success"], true);
    assert!(added["dependency_id"].as_i64().is_some());

    let unknown = run_jrnl(&db, &["tool", "summon_dragon"]);
    assert_success(&unknown);
    assert_eq!(parse_json(&unknown)["error"], "UNKNOWN_TOOL");

    let bad_json = run_jrnl(&db, &["tool", "add_task_dependency", "--args", "{oops"]);
    assert_success(&bad_json);
    let bad_json = parse_json(&bad_json);
    assert_eq!(bad_json["error"], "INVALID_JSON");
    assert!(bad_json["message"].as_str().is_some_and(|message| !message.is_empty()));

    let missing_field = run_jrnl(&db, &["tool", "add_task_dependency", "--args", "{}"]);
    assert_success(&missing_field);
    assert_eq!(parse_json(&missing_field)["error"], "INVALID_ARGUMENT");

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn tools_listing_names_every_tool() {
    let root = unique_workspace("jrnl-cli-tools");
    let db = root.join("journal.sqlite");
    let output = run_jrnl(&db, &["tools"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "add_task_dependency"));
    assert!(stdout.lines().any(|line| line == "get_template_stats"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn missing_config_file_fails_before_touching_the_store() {
    let root = unique_workspace("jrnl-cli-config");
    let db = root.join("journal.sqlite");
    let output = Command::new(env!("CARGO_BIN_EXE_jrnl"))
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(root.join("absent.toml"))
        .args(["task", "ls"])
        .output()
        .expect("jrnl command should run");
    assert_failure(&output);
    assert!(!db.exists());
    let _ = std::fs::remove_dir_all(root);
}
