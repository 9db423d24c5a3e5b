mod app;
mod cli;
mod cli_ops;
mod commands;
mod config;
mod db;
mod dependencies;
mod domain;
mod graph;
mod logging;
mod membership;
mod migration;
mod spawner;
#[cfg(test)]
mod test_support;
mod tools;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    let config = config::JournalConfig::load(cli.config.as_deref())?;
    logging::init(&config.log);

    if let Commands::Tools = &cli.command {
        for name in tools::TOOL_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let db_path = config.resolve_db_path(cli.db.as_deref());
    let app = app::App::open_with(&db_path, &config.store)?;

    match cli.command {
        Commands::Task(args) => commands::run_task_command(&app, args.command)?,
        Commands::Event(args) => commands::run_event_command(&app, args.command)?,
        Commands::Collection(args) => commands::run_collection_command(&app, args.command)?,
        Commands::Dep(args) => commands::run_dep_command(&app, args.command)?,
        Commands::Migrate(args) => commands::run_migrate_command(&app, args.command)?,
        Commands::History(args) => commands::run_history_command(&app, args.command)?,
        Commands::Template(args) => commands::run_template_command(&app, args.command)?,
        Commands::Instance(args) => commands::run_instance_command(&app, args.command)?,
        Commands::Tool(args) => {
            print_json(&tools::dispatch_raw(&app, &args.name, &args.args));
        }
        Commands::Tools => unreachable!("tool listing is handled before the store opens"),
    }
    Ok(())
}
