use std::io::{self, IsTerminal};

use crate::db::collections::CollectionRecord;
use crate::db::events::EventRecord;
use crate::db::history::HistoryRecord;
use crate::db::tasks::TaskRecord;
use crate::dependencies::TaskAtDepth;
use crate::domain::ItemStatus;

/// Active list filters, rendered under the heading of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilterSummary {
    pub status: Option<ItemStatus>,
    pub collection_id: Option<i64>,
    pub include_archived: bool,
}

pub fn print_task_list(tasks: &[TaskRecord], filter: &ListFilterSummary) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Tasks"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }
    if tasks.is_empty() {
        println!("{}", palette.dim("no tasks matched"));
        return;
    }
    for task in tasks {
        println!("{}", format_task_row(task, 0, &palette));
    }
    println!("{}", palette.dim(&format!("{} task(s)", tasks.len())));
}

pub fn print_event_list(events: &[EventRecord], filter: &ListFilterSummary) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Events"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }
    if events.is_empty() {
        println!("{}", palette.dim("no events matched"));
        return;
    }
    for event in events {
        println!("{}", format_event_row(event, &palette));
    }
    println!("{}", palette.dim(&format!("{} event(s)", events.len())));
}

pub fn print_collection_list(collections: &[CollectionRecord], filter: &ListFilterSummary) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Collections"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }
    if collections.is_empty() {
        println!("{}", palette.dim("no collections matched"));
        return;
    }
    for collection in collections {
        println!("{}", format_collection_row(collection, &palette));
    }
    println!(
        "{}",
        palette.dim(&format!("{} collection(s)", collections.len()))
    );
}

/// Tasks annotated with their depth in the dependency graph, indented by it.
pub fn print_depth_list(heading: &str, rows: &[TaskAtDepth]) {
    let palette = Palette::auto();
    println!("{}", palette.heading(heading));
    if rows.is_empty() {
        println!("{}", palette.dim("nothing to show"));
        return;
    }
    for row in rows {
        println!(
            "{} {}",
            format_task_row(&row.task, row.depth, &palette),
            palette.dim(&format!("depth={}", row.depth))
        );
    }
}

pub fn print_history(rows: &[HistoryRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Migrations"));
    if rows.is_empty() {
        println!("{}", palette.dim("no migrations recorded"));
        return;
    }
    for row in rows {
        println!("{}", format_history_row(row, &palette));
    }
}

pub fn print_task_show(task: &TaskRecord) {
    let palette = Palette::auto();
    println!("{}", format_task_row(task, 0, &palette));
    let fields = [
        ("description", task.description.clone()),
        ("topic", task.topic.clone()),
        ("created", task.create_date.clone()),
        ("started", task.start_date.clone()),
        ("finished", task.end_date.clone()),
        ("canceled", task.canceled_date.clone()),
        ("migrated from", task.migrated_from_id.map(|id| id.to_string())),
        ("migrated to", task.migrated_to_id.map(|id| id.to_string())),
        ("template", task.template_id.map(|id| id.to_string())),
        ("instance", task.instance_number.map(|n| format!("#{n}"))),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {} {}", palette.dim(&format!("{label}:")), value);
        }
    }
}

fn format_task_row(task: &TaskRecord, depth: usize, palette: &Palette) -> String {
    let mut line = format!(
        "{}{} {} {}",
        indentation_prefix(depth, palette),
        palette.id(&format!("#{}", task.id)),
        palette.status(task.status),
        task.title
    );
    if let Some(topic) = task.topic.as_deref().and_then(non_empty) {
        line.push(' ');
        line.push_str(&palette.label(topic));
    }
    if let Some(number) = task.instance_number {
        line.push(' ');
        line.push_str(&palette.dim(&format!("#{number}")));
    }
    line
}

fn format_event_row(event: &EventRecord, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&format!("#{}", event.id)),
        palette.status(event.status),
        event.title
    );
    if let Some(when) = event.scheduled_date.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("@ {when}")));
    }
    if let Some(location) = event.location.as_deref().and_then(non_empty) {
        line.push(' ');
        line.push_str(&palette.label(location));
    }
    line
}

fn format_collection_row(collection: &CollectionRecord, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&format!("#{}", collection.id)),
        palette.label(collection.collection_type.as_str()),
        collection.title
    );
    if let Some(sub_type) = collection.sub_type {
        line.push(' ');
        line.push_str(&palette.dim(&format!("/{sub_type}")));
    }
    if collection.archived_at.is_some() {
        line.push(' ');
        line.push_str(&palette.dim("(archived)"));
    }
    line
}

fn format_history_row(row: &HistoryRecord, palette: &Palette) -> String {
    let from = row
        .from_collection_id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{} {} {} {} -> #{}",
        palette.dim(&row.migrated_at),
        row.item_type,
        palette.id(&format!("#{}", row.item_id)),
        from,
        row.to_collection_id
    );
    if let Some(by) = row.migrated_by.as_deref().and_then(non_empty) {
        line.push_str(&format!(" by {by}"));
    }
    if let Some(reason) = row.reason.as_deref().and_then(non_empty) {
        line.push(' ');
        line.push_str(&palette.dim(&format!("({reason})")));
    }
    line
}

fn indentation_prefix(depth: usize, palette: &Palette) -> String {
    if depth <= 1 {
        return String::new();
    }
    let spaces = "  ".repeat(depth - 2);
    palette.dim(&format!("{spaces}↳ "))
}

fn filter_summary(filter: &ListFilterSummary) -> Option<String> {
    let mut parts = Vec::new();
    if filter.include_archived {
        parts.push("archived=true".to_string());
    }
    if let Some(status) = filter.status {
        parts.push(format!("status={status}"));
    }
    if let Some(collection_id) = filter.collection_id {
        parts.push(format!("collection={collection_id}"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub fn status(&self, status: ItemStatus) -> String {
        self.paint(status_color_code(status), &format!("[{status}]"))
    }

    fn label(&self, text: &str) -> String {
        self.paint("35", &format!("({text})"))
    }
}

fn status_color_code(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Created => "34",
        ItemStatus::InProgress => "33",
        ItemStatus::Finished => "32",
        ItemStatus::Migrated => "36",
        ItemStatus::Canceled | ItemStatus::Deleted => "31",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        filter_summary, format_history_row, format_task_row, indentation_prefix, ListFilterSummary,
        Palette,
    };
    use crate::db::history::HistoryRecord;
    use crate::db::tasks::TaskRecord;
    use crate::domain::{ItemKind, ItemStatus, Metadata};

    fn sample_task() -> TaskRecord {
        TaskRecord {
            id: 7,
            title: "Write the report".to_string(),
            description: None,
            topic: Some("work".to_string()),
            status: ItemStatus::InProgress,
            create_date: Some("2026-03-01T09:00:00Z".to_string()),
            start_date: None,
            end_date: None,
            canceled_date: None,
            migrated_from_id: None,
            migrated_to_id: None,
            template_id: Some(2),
            instance_number: Some(3),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn filter_summary_formats_only_active_filters() {
        let filter = ListFilterSummary {
            status: Some(ItemStatus::InProgress),
            collection_id: Some(4),
            include_archived: true,
        };
        assert_eq!(
            filter_summary(&filter).as_deref(),
            Some("archived=true status=IN_PROGRESS collection=4")
        );
    }

    #[test]
    fn filter_summary_is_none_for_empty_filters() {
        assert!(filter_summary(&ListFilterSummary::default()).is_none());
    }

    #[test]
    fn task_rows_show_status_topic_and_instance() {
        let palette = Palette { enabled: false };
        assert_eq!(
            format_task_row(&sample_task(), 0, &palette),
            "#7 [IN_PROGRESS] Write the report (work) #3"
        );
    }

    #[test]
    fn depth_indents_only_beyond_the_first_hop() {
        let palette = Palette { enabled: false };
        assert_eq!(indentation_prefix(1, &palette), "");
        assert_eq!(indentation_prefix(3, &palette), "  ↳ ");
    }

    #[test]
    fn history_rows_mark_missing_origin() {
        let palette = Palette { enabled: false };
        let row = HistoryRecord {
            id: 1,
            item_id: 5,
            item_type: ItemKind::Event,
            from_collection_id: None,
            to_collection_id: 9,
            migrated_at: "2026-03-02T10:00:00Z".to_string(),
            migrated_by: Some("me".to_string()),
            reason: Some("rescheduled".to_string()),
        };
        assert_eq!(
            format_history_row(&row, &palette),
            "2026-03-02T10:00:00Z Event #5 - -> #9 by me (rescheduled)"
        );
    }

    #[test]
    fn painted_output_wraps_ansi_codes() {
        let palette = Palette { enabled: true };
        assert_eq!(palette.status(ItemStatus::Finished), "\x1b[32m[FINISHED]\x1b[0m");
    }
}
