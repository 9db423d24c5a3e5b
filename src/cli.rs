use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

pub use crate::cli_ops::*;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "jrnl")]
#[command(bin_name = "jrnl")]
#[command(version)]
#[command(about = "A local task and event journal with collections, dependencies, and templates")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "JRNL_DB_PATH",
        global = true,
        help = "Path to the journal SQLite database (default .journal/journal.sqlite)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'c',
        long,
        env = "JRNL_CONFIG",
        global = true,
        help = "Path to a TOML configuration file."
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create, list, and change tasks.")]
    Task(TaskArgs),
    #[command(about = "Create, list, and change events.")]
    Event(EventArgs),
    #[command(about = "Manage collections and their members.")]
    Collection(CollectionArgs),
    #[command(about = "Manage task dependencies and derived views.")]
    Dep(DepArgs),
    #[command(about = "Move items between collections or supersede tasks.")]
    Migrate(MigrateArgs),
    #[command(about = "Query the collection migration history.")]
    History(HistoryArgs),
    #[command(about = "Manage task and event templates.")]
    Template(TemplateArgs),
    #[command(about = "Spawn and complete template instances.")]
    Instance(InstanceArgs),
    #[command(about = "Invoke a named tool with JSON arguments.")]
    Tool(ToolArgs),
    #[command(about = "List the available tool names.")]
    Tools,
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TaskSubcommands {
    #[command(about = "Create a task.")]
    New(TaskNewArgs),
    #[command(about = "Show one task.")]
    Show(ShowArgs),
    #[command(about = "List tasks.")]
    Ls(ItemListArgs),
    #[command(about = "Update task fields.")]
    Update(TaskUpdateArgs),
    #[command(about = "Mark a task in progress.")]
    Start(IdArgs),
    #[command(about = "Finish a task; spawns the next instance for auto-spawn templates.")]
    Done(DoneArgs),
    #[command(about = "Cancel a task.")]
    Cancel(IdArgs),
    #[command(about = "Delete a task, its edges, and its memberships.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct TaskNewArgs {
    #[arg(help = "Task title.")]
    pub title: String,

    #[arg(short = 'D', long = "desc", help = "Optional description text.")]
    pub description: Option<String>,

    #[arg(short = 't', long, help = "Optional topic.")]
    pub topic: Option<String>,

    #[arg(short = 'C', long = "collection", help = "Collection to place the task in.")]
    pub collection_id: Option<i64>,

    #[arg(short = 'm', long, help = "Metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct TaskUpdateArgs {
    #[arg(help = "Task id.")]
    pub id: i64,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description.")]
    pub description: Option<String>,

    #[arg(long, help = "New topic.")]
    pub topic: Option<String>,

    #[arg(long, help = "New status, for example CREATED or IN_PROGRESS.")]
    pub status: Option<crate::domain::ItemStatus>,

    #[arg(short = 'm', long, help = "Replacement metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    #[command(subcommand)]
    pub command: EventSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum EventSubcommands {
    #[command(about = "Create an event.")]
    New(EventNewArgs),
    #[command(about = "Show one event.")]
    Show(ShowArgs),
    #[command(about = "List events, scheduled ones first.")]
    Ls(ItemListArgs),
    #[command(about = "Update event fields.")]
    Update(EventUpdateArgs),
    #[command(about = "Mark an event in progress.")]
    Start(IdArgs),
    #[command(about = "Finish an event; spawns the next instance for auto-spawn templates.")]
    Done(DoneArgs),
    #[command(about = "Cancel an event.")]
    Cancel(IdArgs),
    #[command(about = "Delete an event and its memberships.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct EventNewArgs {
    #[arg(help = "Event title.")]
    pub title: String,

    #[arg(short = 'D', long = "desc", help = "Optional description text.")]
    pub description: Option<String>,

    #[arg(short = 'l', long, help = "Where the event happens.")]
    pub location: Option<String>,

    #[arg(long, help = "Related link.")]
    pub link: Option<String>,

    #[arg(short = 'a', long = "at", help = "Scheduled time as an RFC 3339 timestamp.")]
    pub scheduled_date: Option<String>,

    #[arg(short = 'C', long = "collection", help = "Collection to place the event in.")]
    pub collection_id: Option<i64>,

    #[arg(short = 'm', long, help = "Metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct EventUpdateArgs {
    #[arg(help = "Event id.")]
    pub id: i64,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description.")]
    pub description: Option<String>,

    #[arg(long, help = "New location.")]
    pub location: Option<String>,

    #[arg(long, help = "New link.")]
    pub link: Option<String>,

    #[arg(long = "at", help = "New scheduled time as an RFC 3339 timestamp.")]
    pub scheduled_date: Option<String>,

    #[arg(long, help = "New status.")]
    pub status: Option<crate::domain::ItemStatus>,

    #[arg(short = 'm', long, help = "Replacement metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
