use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, DatabaseName, ErrorCode, OptionalExtension, Result,
    Transaction, TransactionBehavior,
};

use crate::domain::timestamp::now_utc_rfc3339;

pub mod collections;
pub mod dependencies;
pub mod events;
pub mod history;
pub mod memberships;
pub mod tasks;
pub mod templates;

pub const CURRENT_SCHEMA_VERSION: i64 = 3;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 3] = [
    Migration {
        version: 1,
        name: "baseline_journal_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    longDescription TEXT,
    type TEXT NOT NULL,
    subType TEXT,
    createDate TEXT,
    startDate TEXT,
    endDate TEXT,
    canceledDate TEXT,
    archived_at TEXT,
    metadata TEXT,
    CHECK (type IN ('DEFAULT', 'QUARTERLY', 'MONTHLY', 'DAILY', 'PROJECT', 'CUSTOM')),
    CHECK (subType IS NULL OR subType IN ('TASK', 'EVENT', 'PLAN', 'LOG', 'CUSTOM'))
);

CREATE TABLE IF NOT EXISTS task_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    topic TEXT,
    createDate TEXT,
    metadata TEXT,
    auto_spawn INTEGER NOT NULL DEFAULT 0,
    default_collection_id INTEGER,
    FOREIGN KEY (default_collection_id) REFERENCES collections(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS event_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    location TEXT,
    link TEXT,
    createDate TEXT,
    metadata TEXT,
    auto_spawn INTEGER NOT NULL DEFAULT 0,
    default_collection_id INTEGER,
    FOREIGN KEY (default_collection_id) REFERENCES collections(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    topic TEXT,
    status TEXT NOT NULL,
    createDate TEXT,
    startDate TEXT,
    endDate TEXT,
    canceledDate TEXT,
    migrated_from_id INTEGER,
    migrated_to_id INTEGER,
    template_id INTEGER,
    instance_number INTEGER,
    metadata TEXT,
    CHECK (status IN ('CREATED', 'MIGRATED', 'IN_PROGRESS', 'FINISHED', 'CANCELED', 'DELETED')),
    FOREIGN KEY (migrated_from_id) REFERENCES tasks(id) ON DELETE SET NULL,
    FOREIGN KEY (migrated_to_id) REFERENCES tasks(id) ON DELETE SET NULL,
    FOREIGN KEY (template_id) REFERENCES task_templates(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    location TEXT,
    link TEXT,
    status TEXT NOT NULL,
    createDate TEXT,
    startDate TEXT,
    endDate TEXT,
    canceledDate TEXT,
    scheduledDate TEXT,
    template_id INTEGER,
    instance_number INTEGER,
    metadata TEXT,
    CHECK (status IN ('CREATED', 'MIGRATED', 'IN_PROGRESS', 'FINISHED', 'CANCELED', 'DELETED')),
    FOREIGN KEY (template_id) REFERENCES event_templates(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS collectionItems (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collectionId INTEGER NOT NULL,
    itemId INTEGER NOT NULL,
    itemType TEXT NOT NULL CHECK (itemType IN ('Task', 'Event', 'Collection')),
    FOREIGN KEY (collectionId) REFERENCES collections(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS task_dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    depends_on_task_id INTEGER NOT NULL,
    dependency_type TEXT NOT NULL DEFAULT 'blocks',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    created_by TEXT,
    CHECK (dependency_type IN ('blocks', 'related', 'suggested')),
    CHECK (created_by IS NULL OR created_by IN ('user', 'ai_suggested')),
    CHECK (task_id != depends_on_task_id),
    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE,
    FOREIGN KEY (depends_on_task_id) REFERENCES tasks(id) ON DELETE CASCADE,
    UNIQUE (task_id, depends_on_task_id)
);

CREATE TABLE IF NOT EXISTS item_migration_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL,
    item_type TEXT NOT NULL CHECK (item_type IN ('Task', 'Event')),
    from_collection_id INTEGER,
    to_collection_id INTEGER NOT NULL,
    migrated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    migrated_by TEXT,
    reason TEXT
);

CREATE TRIGGER IF NOT EXISTS trg_tasks_drop_memberships
AFTER DELETE ON tasks
BEGIN
    DELETE FROM collectionItems WHERE itemId = OLD.id AND itemType = 'Task';
END;

CREATE TRIGGER IF NOT EXISTS trg_events_drop_memberships
AFTER DELETE ON events
BEGIN
    DELETE FROM collectionItems WHERE itemId = OLD.id AND itemType = 'Event';
END;

CREATE TRIGGER IF NOT EXISTS trg_collections_drop_memberships
AFTER DELETE ON collections
BEGIN
    DELETE FROM collectionItems WHERE itemId = OLD.id AND itemType = 'Collection';
END;

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_template ON tasks(template_id);
CREATE INDEX IF NOT EXISTS idx_events_status ON events(status);
CREATE INDEX IF NOT EXISTS idx_events_template ON events(template_id);
CREATE INDEX IF NOT EXISTS idx_collections_type_subType ON collections(type, subType);
CREATE INDEX IF NOT EXISTS idx_collections_archived ON collections(archived_at);
CREATE INDEX IF NOT EXISTS idx_collectionItems_collectionId ON collectionItems(collectionId);
CREATE INDEX IF NOT EXISTS idx_collectionItems_item ON collectionItems(itemId, itemType);
CREATE INDEX IF NOT EXISTS idx_task_deps_task ON task_dependencies(task_id);
CREATE INDEX IF NOT EXISTS idx_task_deps_depends_on ON task_dependencies(depends_on_task_id);
CREATE INDEX IF NOT EXISTS idx_migration_history_item ON item_migration_history(item_id, item_type);
CREATE INDEX IF NOT EXISTS idx_migration_history_from ON item_migration_history(from_collection_id);
CREATE INDEX IF NOT EXISTS idx_migration_history_to ON item_migration_history(to_collection_id);
"#,
    },
    Migration {
        version: 2,
        name: "default_collections_v1",
        sql: r#"
INSERT INTO collections (title, description, longDescription, type, subType, createDate, startDate)
SELECT 'Task List', 'Main Task List',
       'All created Tasks will be available in the Main Task List.',
       'DEFAULT', 'TASK', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'), strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE NOT EXISTS (SELECT 1 FROM collections WHERE type = 'DEFAULT' AND subType = 'TASK');

INSERT INTO collections (title, description, longDescription, type, subType, createDate, startDate)
SELECT 'Event List', 'Main Event List',
       'All created Events will be available in the Main Event List.',
       'DEFAULT', 'EVENT', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'), strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE NOT EXISTS (SELECT 1 FROM collections WHERE type = 'DEFAULT' AND subType = 'EVENT');
"#,
    },
    Migration {
        version: 3,
        name: "query_indexes_v1",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_task_deps_type ON task_dependencies(dependency_type);
CREATE INDEX IF NOT EXISTS idx_migration_history_migrated_at ON item_migration_history(migrated_at);
"#,
    },
];

pub fn open_connection(path: &str, busy_timeout_ms: u64) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_connection(&conn, busy_timeout_ms)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout_ms: u64) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

/// Starts a write transaction that takes the database write lock up front, so
/// a check-then-insert sequence cannot interleave with another writer.
pub fn begin_write(conn: &Connection) -> Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

/// Starts a read transaction; every query issued through it observes the same
/// snapshot of the store.
pub fn begin_read(conn: &Connection) -> Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Deferred)
}

pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

/// Column assignments for a partial `UPDATE ... WHERE id = ?`.
#[derive(Debug, Default)]
pub struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Assignments {
    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.columns.push(column);
        self.values.push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the number of rows touched; zero when `id` does not exist.
    pub fn apply(self, conn: &Connection, table: &'static str, id: i64) -> Result<usize> {
        if self.columns.is_empty() {
            return Ok(0);
        }
        let assignments = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {table} SET {assignments} WHERE id = ?{}",
            self.columns.len() + 1
        );
        let mut values = self.values;
        values.push(Value::Integer(id));
        conn.execute(&sql, params_from_iter(values.iter()))
    }
}

pub(crate) fn metadata_column(
    row: &rusqlite::Row<'_>,
    index: usize,
) -> Result<crate::domain::Metadata> {
    let raw: Option<String> = row.get(index)?;
    crate::domain::metadata::decode(raw.as_deref()).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
    })
}
