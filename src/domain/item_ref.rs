use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator stored in `collectionItems.itemType` and
/// `item_migration_history.item_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Task,
    Event,
    Collection,
}

closed_vocabulary!(ItemKind, "item type", [
    Task => "Task",
    Event => "Event",
    Collection => "Collection",
]);

/// Anything that can be a member of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "itemType", content = "itemId")]
pub enum ItemRef {
    Task(i64),
    Event(i64),
    Collection(i64),
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: i64) -> Self {
        match kind {
            ItemKind::Task => ItemRef::Task(id),
            ItemKind::Event => ItemRef::Event(id),
            ItemKind::Collection => ItemRef::Collection(id),
        }
    }

    pub fn kind(self) -> ItemKind {
        match self {
            ItemRef::Task(_) => ItemKind::Task,
            ItemRef::Event(_) => ItemKind::Event,
            ItemRef::Collection(_) => ItemKind::Collection,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            ItemRef::Task(id) | ItemRef::Event(id) | ItemRef::Collection(id) => id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().as_str().to_ascii_lowercase(), self.id())
    }
}

/// The items whose collection moves are audit-logged: tasks and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "itemType", content = "itemId")]
pub enum TrackedItem {
    Task(i64),
    Event(i64),
}

impl TrackedItem {
    /// Returns `None` for collections, which are never migrated.
    pub fn new(kind: ItemKind, id: i64) -> Option<Self> {
        match kind {
            ItemKind::Task => Some(TrackedItem::Task(id)),
            ItemKind::Event => Some(TrackedItem::Event(id)),
            ItemKind::Collection => None,
        }
    }

    pub fn kind(self) -> ItemKind {
        ItemRef::from(self).kind()
    }

    pub fn id(self) -> i64 {
        ItemRef::from(self).id()
    }
}

impl From<TrackedItem> for ItemRef {
    fn from(value: TrackedItem) -> Self {
        match value {
            TrackedItem::Task(id) => ItemRef::Task(id),
            TrackedItem::Event(id) => ItemRef::Event(id),
        }
    }
}

impl fmt::Display for TrackedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ItemRef::from(*self).fmt(f)
    }
}

/// A template id tagged with the kind of item it spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateRef {
    Task(i64),
    Event(i64),
}

impl TemplateRef {
    pub fn id(self) -> i64 {
        match self {
            TemplateRef::Task(id) | TemplateRef::Event(id) => id,
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Task(id) => write!(f, "task template {id}"),
            TemplateRef::Event(id) => write!(f, "event template {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemKind, ItemRef, TrackedItem};
    use serde_json::json;

    #[test]
    fn item_ref_serializes_as_type_and_id_pair() {
        let value = serde_json::to_value(ItemRef::Event(7)).expect("item ref should serialize");
        assert_eq!(value, json!({ "itemType": "Event", "itemId": 7 }));

        let parsed: ItemRef = serde_json::from_value(json!({ "itemType": "Collection", "itemId": 3 }))
            .expect("item ref should parse");
        assert_eq!(parsed, ItemRef::Collection(3));
    }

    #[test]
    fn tracked_items_exclude_collections() {
        assert_eq!(TrackedItem::new(ItemKind::Task, 4), Some(TrackedItem::Task(4)));
        assert_eq!(TrackedItem::new(ItemKind::Collection, 4), None);
        assert_eq!(ItemRef::from(TrackedItem::Event(9)), ItemRef::Event(9));
    }

    #[test]
    fn display_names_kind_and_id() {
        assert_eq!(ItemRef::Task(12).to_string(), "task 12");
        assert_eq!(TrackedItem::Event(2).to_string(), "event 2");
    }
}
