use clap::{Args, Subcommand, ValueEnum};

use crate::domain::{
    CollectionSubType, CollectionType, CreatedBy, DependencyType, ItemKind, ItemStatus,
    TemplateRef,
};

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Record id.")]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct DoneArgs {
    #[arg(help = "Record id.")]
    pub id: i64,

    #[arg(long, help = "Only mark finished; never spawn a follow-up instance.")]
    pub no_spawn: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Record id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ItemListArgs {
    #[arg(short = 's', long, help = "Only items with this status.")]
    pub status: Option<ItemStatus>,

    #[arg(short = 'C', long = "collection", help = "Only members of this collection.")]
    pub collection_id: Option<i64>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: CollectionSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum CollectionSubcommands {
    #[command(about = "Create a collection.")]
    New(CollectionNewArgs),
    #[command(about = "Show one collection.")]
    Show(ShowArgs),
    #[command(about = "List collections.")]
    Ls(CollectionListArgs),
    #[command(about = "Archive a collection.")]
    Archive(IdArgs),
    #[command(about = "Restore an archived collection.")]
    Unarchive(IdArgs),
    #[command(about = "Delete a collection and its memberships.")]
    Rm(IdArgs),
    #[command(about = "Add an item to a collection.")]
    Add(MembershipArgs),
    #[command(about = "Remove an item from a collection.")]
    Remove(MembershipArgs),
    #[command(about = "List the members of a collection.")]
    Items(ShowArgs),
    #[command(about = "List the collections holding an item.")]
    Containing(ItemRefArgs),
}

#[derive(Debug, Args)]
pub struct CollectionNewArgs {
    #[arg(help = "Collection title.")]
    pub title: String,

    #[arg(
        short = 'k',
        long = "type",
        default_value = "PROJECT",
        help = "Collection type: DEFAULT, QUARTERLY, MONTHLY, DAILY, PROJECT, or CUSTOM."
    )]
    pub collection_type: CollectionType,

    #[arg(long = "sub-type", help = "Sub type: TASK, EVENT, PLAN, LOG, or CUSTOM.")]
    pub sub_type: Option<CollectionSubType>,

    #[arg(short = 'D', long = "desc", help = "Short description.")]
    pub description: Option<String>,

    #[arg(long = "long-desc", help = "Long description.")]
    pub long_description: Option<String>,

    #[arg(long = "start", help = "Start date as an RFC 3339 timestamp.")]
    pub start_date: Option<String>,

    #[arg(long = "end", help = "End date as an RFC 3339 timestamp.")]
    pub end_date: Option<String>,

    #[arg(short = 'm', long, help = "Metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct CollectionListArgs {
    #[arg(short = 'k', long = "type", help = "Only collections of this type.")]
    pub collection_type: Option<CollectionType>,

    #[arg(long = "sub-type", help = "Only collections of this sub type.")]
    pub sub_type: Option<CollectionSubType>,

    #[arg(short = 'a', long, help = "Include archived collections.")]
    pub all: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MembershipArgs {
    #[arg(help = "Collection id.")]
    pub collection_id: i64,

    #[arg(help = "Item type: Task, Event, or Collection.")]
    pub item_type: ItemKind,

    #[arg(help = "Item id.")]
    pub item_id: i64,
}

#[derive(Debug, Args)]
pub struct ItemRefArgs {
    #[arg(help = "Item type: Task, Event, or Collection.")]
    pub item_type: ItemKind,

    #[arg(help = "Item id.")]
    pub item_id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum DepSubcommands {
    #[command(about = "Record that a task depends on another.")]
    Add(DepAddArgs),
    #[command(about = "Remove the dependency between two tasks.")]
    Rm(DepPairArgs),
    #[command(about = "Remove a dependency edge by id.")]
    RmEdge(IdArgs),
    #[command(about = "List the direct dependencies and edges of a task.")]
    Ls(ShowArgs),
    #[command(about = "List tasks that depend directly on a task.")]
    Dependents(ShowArgs),
    #[command(about = "List everything a task waits on, up to ten hops.")]
    All(ShowArgs),
    #[command(about = "List open tasks with nothing outstanding blocking them.")]
    Unblocked(DepFilterArgs),
    #[command(about = "List open tasks waiting on an unfinished blocker.")]
    Blocked(DepFilterArgs),
    #[command(about = "Show the ten deepest tasks by longest blocking chain.")]
    Critical(JsonArgs),
}

#[derive(Debug, Args)]
pub struct DepAddArgs {
    #[arg(help = "Dependent task id.")]
    pub task_id: i64,

    #[arg(help = "Id of the task it depends on.")]
    pub depends_on_task_id: i64,

    #[arg(
        short = 'k',
        long = "type",
        default_value = "blocks",
        help = "Dependency type: blocks, related, or suggested."
    )]
    pub dependency_type: DependencyType,

    #[arg(long = "by", default_value = "user", help = "Creator: user or ai_suggested.")]
    pub created_by: CreatedBy,
}

#[derive(Debug, Args)]
pub struct DepPairArgs {
    #[arg(help = "Dependent task id.")]
    pub task_id: i64,

    #[arg(help = "Id of the task it depends on.")]
    pub depends_on_task_id: i64,
}

#[derive(Debug, Args)]
pub struct DepFilterArgs {
    #[arg(short = 'C', long = "collection", help = "Only members of this collection.")]
    pub collection_id: Option<i64>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum MigrateSubcommands {
    #[command(about = "Move a task or event into a collection, recording history.")]
    Item(MigrateItemArgs),
    #[command(about = "Mark a task as superseded by another task.")]
    Supersede(SupersedeArgs),
}

#[derive(Debug, Args)]
pub struct MigrateItemArgs {
    #[arg(help = "Item type: Task or Event.")]
    pub item_type: ItemKind,

    #[arg(help = "Item id.")]
    pub item_id: i64,

    #[arg(help = "Destination collection id.")]
    pub to_collection_id: i64,

    #[arg(long = "by", help = "Who moved the item.")]
    pub migrated_by: Option<String>,

    #[arg(short = 'r', long, help = "Why the item moved.")]
    pub reason: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SupersedeArgs {
    #[arg(help = "Task being replaced.")]
    pub task_id: i64,

    #[arg(help = "Replacement task.")]
    pub to_task_id: i64,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistorySubcommands,
}

#[derive(Debug, Subcommand)]
pub enum HistorySubcommands {
    #[command(about = "Show the moves of one item, oldest first.")]
    Item(ItemRefArgs),
    #[command(about = "Show moves out of a collection.")]
    From(HistoryCollectionArgs),
    #[command(about = "Show moves into a collection.")]
    To(HistoryCollectionArgs),
    #[command(about = "Show every recorded move, newest first.")]
    All(HistoryAllArgs),
    #[command(about = "Count the moves of one item.")]
    Count(ItemRefArgs),
    #[command(about = "Rank items by number of moves.")]
    Top(HistoryTopArgs),
}

#[derive(Debug, Args)]
pub struct HistoryCollectionArgs {
    #[arg(help = "Collection id.")]
    pub collection_id: i64,

    #[arg(short = 'k', long = "item-type", help = "Only Task or Event rows.")]
    pub item_type: Option<ItemKind>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HistoryAllArgs {
    #[arg(short = 'k', long = "item-type", help = "Only Task or Event rows.")]
    pub item_type: Option<ItemKind>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HistoryTopArgs {
    #[arg(short = 'k', long = "item-type", help = "Only Task or Event rows.")]
    pub item_type: Option<ItemKind>,

    #[arg(
        short = 'n',
        long,
        default_value_t = crate::migration::MOST_MIGRATED_LIMIT,
        help = "Maximum number of rows."
    )]
    pub limit: usize,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKindArg {
    Task,
    Event,
}

impl TemplateKindArg {
    pub fn with_id(self, id: i64) -> TemplateRef {
        match self {
            TemplateKindArg::Task => TemplateRef::Task(id),
            TemplateKindArg::Event => TemplateRef::Event(id),
        }
    }
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TemplateSubcommands {
    #[command(about = "Create a template.")]
    New(TemplateNewArgs),
    #[command(about = "Show one template.")]
    Show(TemplateIdArgs),
    #[command(about = "List templates of one kind.")]
    Ls(TemplateListArgs),
    #[command(about = "Update template fields.")]
    Update(TemplateUpdateArgs),
    #[command(about = "Delete a template; its instances are kept.")]
    Rm(TemplateIdArgs),
    #[command(about = "List instances, newest first.")]
    Instances(TemplateIdArgs),
    #[command(about = "Count instances by state.")]
    Stats(TemplateIdArgs),
}

#[derive(Debug, Args)]
pub struct TemplateNewArgs {
    #[arg(value_enum, help = "Template kind.")]
    pub kind: TemplateKindArg,

    #[arg(help = "Template title.")]
    pub title: String,

    #[arg(short = 'D', long = "desc", help = "Description copied to instances.")]
    pub description: Option<String>,

    #[arg(short = 't', long, help = "Topic for task instances.")]
    pub topic: Option<String>,

    #[arg(short = 'l', long, help = "Location for event instances.")]
    pub location: Option<String>,

    #[arg(long, help = "Link for event instances.")]
    pub link: Option<String>,

    #[arg(long, help = "Spawn the next instance whenever one is completed.")]
    pub auto_spawn: bool,

    #[arg(short = 'C', long = "collection", help = "Default collection for new instances.")]
    pub default_collection_id: Option<i64>,

    #[arg(short = 'm', long, help = "Metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct TemplateIdArgs {
    #[arg(value_enum, help = "Template kind.")]
    pub kind: TemplateKindArg,

    #[arg(help = "Template id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TemplateListArgs {
    #[arg(value_enum, help = "Template kind.")]
    pub kind: TemplateKindArg,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TemplateUpdateArgs {
    #[arg(value_enum, help = "Template kind.")]
    pub kind: TemplateKindArg,

    #[arg(help = "Template id.")]
    pub id: i64,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description.")]
    pub description: Option<String>,

    #[arg(long, help = "New topic (task templates).")]
    pub topic: Option<String>,

    #[arg(long, help = "New location (event templates).")]
    pub location: Option<String>,

    #[arg(long, help = "New link (event templates).")]
    pub link: Option<String>,

    #[arg(long, help = "Turn auto-spawn on or off.")]
    pub auto_spawn: Option<bool>,

    #[arg(long = "collection", help = "New default collection.")]
    pub default_collection_id: Option<i64>,

    #[arg(short = 'm', long, help = "Replacement metadata as a JSON object.")]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct InstanceArgs {
    #[command(subcommand)]
    pub command: InstanceSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum InstanceSubcommands {
    #[command(about = "Spawn the next numbered instance of a template.")]
    Spawn(InstanceSpawnArgs),
    #[command(about = "Complete an instance and chain the next one if enabled.")]
    Done(InstanceDoneArgs),
}

#[derive(Debug, Args)]
pub struct InstanceSpawnArgs {
    #[arg(value_enum, help = "Template kind.")]
    pub kind: TemplateKindArg,

    #[arg(help = "Template id.")]
    pub template_id: i64,

    #[arg(short = 'C', long = "collection", help = "Collection overriding the template default.")]
    pub collection_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct InstanceDoneArgs {
    #[arg(help = "Item type: Task or Event.")]
    pub item_type: ItemKind,

    #[arg(help = "Item id.")]
    pub item_id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ToolArgs {
    #[arg(help = "Tool name; see `jrnl tools`.")]
    pub name: String,

    #[arg(short = 'a', long, default_value = "{}", help = "Tool arguments as JSON.")]
    pub args: String,
}
