use rusqlite::{params, Connection, Result, Row};
use serde::Serialize;

use crate::domain::{ItemKind, ItemRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItemRecord {
    pub id: i64,
    pub collection_id: i64,
    pub item_id: i64,
    pub item_type: ItemKind,
}

impl CollectionItemRecord {
    pub fn item(&self) -> ItemRef {
        ItemRef::new(self.item_type, self.item_id)
    }
}

fn membership_from_row(row: &Row<'_>) -> Result<CollectionItemRecord> {
    Ok(CollectionItemRecord {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        item_id: row.get(2)?,
        item_type: row.get(3)?,
    })
}

pub fn insert_membership(conn: &Connection, collection_id: i64, item: ItemRef) -> Result<i64> {
    conn.execute(
        "INSERT INTO collectionItems (collectionId, itemId, itemType) VALUES (?1, ?2, ?3)",
        params![collection_id, item.id(), item.kind()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_membership(conn: &Connection, collection_id: i64, item: ItemRef) -> Result<usize> {
    conn.execute(
        "DELETE FROM collectionItems WHERE collectionId = ?1 AND itemId = ?2 AND itemType = ?3",
        params![collection_id, item.id(), item.kind()],
    )
}

pub fn delete_item_memberships(conn: &Connection, item: ItemRef) -> Result<usize> {
    conn.execute(
        "DELETE FROM collectionItems WHERE itemId = ?1 AND itemType = ?2",
        params![item.id(), item.kind()],
    )
}

pub fn list_by_collection(conn: &Connection, collection_id: i64) -> Result<Vec<CollectionItemRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, collectionId, itemId, itemType
FROM collectionItems
WHERE collectionId = ?1
ORDER BY id ASC
"#,
    )?;
    let rows = stmt.query_map(params![collection_id], membership_from_row)?;
    rows.collect()
}

pub fn list_by_item(conn: &Connection, item: ItemRef) -> Result<Vec<CollectionItemRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, collectionId, itemId, itemType
FROM collectionItems
WHERE itemId = ?1 AND itemType = ?2
ORDER BY id ASC
"#,
    )?;
    let rows = stmt.query_map(params![item.id(), item.kind()], membership_from_row)?;
    rows.collect()
}

pub fn membership_exists(conn: &Connection, collection_id: i64, item: ItemRef) -> Result<bool> {
    conn.query_row(
        r#"
SELECT EXISTS(
    SELECT 1 FROM collectionItems
    WHERE collectionId = ?1 AND itemId = ?2 AND itemType = ?3
)
"#,
        params![collection_id, item.id(), item.kind()],
        |row| row.get(0),
    )
}
