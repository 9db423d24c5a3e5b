/// Lifecycle status shared by tasks and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemStatus {
    Created,
    Migrated,
    InProgress,
    Finished,
    Canceled,
    Deleted,
}

closed_vocabulary!(ItemStatus, "status", [
    Created => "CREATED",
    Migrated => "MIGRATED",
    InProgress => "IN_PROGRESS",
    Finished => "FINISHED",
    Canceled => "CANCELED",
    Deleted => "DELETED",
]);

impl ItemStatus {
    /// Items still being worked on; only these can be blocked or unblocked.
    pub fn is_open(self) -> bool {
        matches!(self, ItemStatus::Created | ItemStatus::InProgress)
    }

    /// A `blocks` dependency on a resolved task no longer blocks anything.
    pub fn is_resolved(self) -> bool {
        matches!(self, ItemStatus::Finished | ItemStatus::Canceled)
    }

    /// Column stamped with the transition time when an item enters this status.
    pub fn date_column(self) -> Option<&'static str> {
        match self {
            ItemStatus::InProgress => Some("startDate"),
            ItemStatus::Finished => Some("endDate"),
            ItemStatus::Canceled => Some("canceledDate"),
            ItemStatus::Created | ItemStatus::Migrated | ItemStatus::Deleted => None,
        }
    }
}
