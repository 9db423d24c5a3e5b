use rusqlite::Connection;
use tracing::debug;

use crate::app::AppError;
use crate::db::{self, memberships::CollectionItemRecord};
use crate::domain::ItemRef;

/// Membership rows between collections and the items they hold. Adding does
/// not deduplicate; removal and lookups are no-ops on missing rows.
pub struct Memberships<'a> {
    conn: &'a Connection,
}

impl<'a> Memberships<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn add_item_to_collection(&self, collection_id: i64, item: ItemRef) -> Result<i64, AppError> {
        self.require_collection(collection_id)?;
        let id = db::memberships::insert_membership(self.conn, collection_id, item)?;
        debug!(collection_id, %item, membership_id = id, "item added to collection");
        Ok(id)
    }

    /// Returns the number of membership rows removed.
    pub fn remove_item_from_collection(
        &self,
        collection_id: i64,
        item: ItemRef,
    ) -> Result<usize, AppError> {
        self.require_collection(collection_id)?;
        let removed = db::memberships::delete_membership(self.conn, collection_id, item)?;
        debug!(collection_id, %item, removed, "item removed from collection");
        Ok(removed)
    }

    pub fn list_items(&self, collection_id: i64) -> Result<Vec<CollectionItemRecord>, AppError> {
        self.require_collection(collection_id)?;
        Ok(db::memberships::list_by_collection(self.conn, collection_id)?)
    }

    pub fn list_collections_containing(
        &self,
        item: ItemRef,
    ) -> Result<Vec<CollectionItemRecord>, AppError> {
        Ok(db::memberships::list_by_item(self.conn, item)?)
    }

    pub fn contains(&self, collection_id: i64, item: ItemRef) -> Result<bool, AppError> {
        Ok(db::memberships::membership_exists(self.conn, collection_id, item)?)
    }

    fn require_collection(&self, collection_id: i64) -> Result<(), AppError> {
        if db::collections::collection_exists(self.conn, collection_id)? {
            Ok(())
        } else {
            Err(AppError::not_found("collection", collection_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::ItemRef;
    use crate::test_support::TempJournal;

    #[test]
    fn membership_allows_duplicates_and_removes_all_matches() {
        let journal = TempJournal::new();
        let task = journal.seed_task("buy stamps");
        let memberships = journal.memberships();

        let first = memberships
            .add_item_to_collection(1, ItemRef::Task(task))
            .expect("first add should succeed");
        let second = memberships
            .add_item_to_collection(1, ItemRef::Task(task))
            .expect("duplicate add should succeed");
        assert_ne!(first, second);
        assert_eq!(
            memberships
                .list_items(1)
                .expect("items should list")
                .len(),
            2
        );

        let removed = memberships
            .remove_item_from_collection(1, ItemRef::Task(task))
            .expect("remove should succeed");
        assert_eq!(removed, 2);
        assert!(!memberships
            .contains(1, ItemRef::Task(task))
            .expect("contains should run"));

        let again = memberships
            .remove_item_from_collection(1, ItemRef::Task(task))
            .expect("remove of a missing row should be a no-op");
        assert_eq!(again, 0);
    }

    #[test]
    fn collections_can_hold_collections() {
        let journal = TempJournal::new();
        let quarter = journal.seed_collection("Q3");
        let memberships = journal.memberships();

        memberships
            .add_item_to_collection(quarter, ItemRef::Collection(2))
            .expect("nested add should succeed");
        let containing = memberships
            .list_collections_containing(ItemRef::Collection(2))
            .expect("lookup should succeed");
        assert_eq!(containing.len(), 1);
        assert_eq!(containing[0].collection_id, quarter);
        assert_eq!(containing[0].item(), ItemRef::Collection(2));
    }

    #[test]
    fn unknown_collection_is_reported() {
        let journal = TempJournal::new();
        let err = journal
            .memberships()
            .add_item_to_collection(404, ItemRef::Event(1))
            .expect_err("missing collection should fail");
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
