use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use promptlib::{
    error_help, init_logging, log_command_execution, Config, LogConfig, StartupPolicy, Store,
};

mod cli;
mod commands;

use cli::{Cli, Commands, COMMAND_NAMES};
use commands::core::{
    handle_add, handle_delete, handle_edit, handle_find, handle_init, handle_ls, handle_path,
    handle_show, handle_use,
};
use commands::export::{handle_export, handle_report};
use commands::migrate::handle_migrate;
use commands::suggest::handle_suggest;

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let clap::error::ErrorKind::InvalidSubcommand = e.kind() {
                if let Some(cmd) = env::args().nth(1) {
                    eprintln!("{}", error_help::format_command_typo(&cmd, COMMAND_NAMES));
                    std::process::exit(1);
                }
            }
            e.exit();
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Path => "path",
        Commands::Migrate { .. } => "migrate",
        Commands::Add { .. } => "add",
        Commands::Edit { .. } => "edit",
        Commands::Delete { .. } => "delete",
        Commands::Ls { .. } => "ls",
        Commands::Find { .. } => "find",
        Commands::Show { .. } => "show",
        Commands::Use { .. } => "use",
        Commands::Export { .. } => "export",
        Commands::Report { .. } => "report",
        Commands::Suggest { .. } => "suggest",
    }
}

fn startup_policy(cli: &Cli, config: &Config) -> StartupPolicy {
    if cli.lenient {
        StartupPolicy::Lenient
    } else if cli.strict {
        StartupPolicy::Strict
    } else {
        config.startup
    }
}

fn run(cli: Cli, config: &Config, slot: &mut Option<Store>, start: Instant) -> Result<()> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let path: PathBuf = match &cli.file {
        Some(path) => path.clone(),
        None => config.library_path()?,
    };

    match command {
        Commands::Init => return handle_init(&path, start),
        Commands::Path => return handle_path(&path, config, start),
        _ => {}
    }

    // Migration rewrites an existing document; a missing one is always an error
    let policy = match command {
        Commands::Migrate { .. } => StartupPolicy::Strict,
        _ => startup_policy(&cli, config),
    };
    let store = slot.insert(Store::open(&path, policy, &config.author)?);

    match command {
        Commands::Init | Commands::Path => Ok(()),
        Commands::Migrate { dry_run } => handle_migrate(store, *dry_run, start),
        Commands::Add {
            title,
            category,
            tags,
            body,
            system,
            edit,
        } => handle_add(
            store,
            config,
            title,
            category.as_deref(),
            tags.as_deref(),
            body.clone(),
            system.clone(),
            *edit,
            start,
        ),
        Commands::Edit {
            query,
            title,
            category,
            tags,
            body,
            system,
            no_system,
        } => handle_edit(
            store,
            config,
            query,
            title.clone(),
            category.clone(),
            tags.as_deref(),
            body.clone(),
            system.clone(),
            *no_system,
            start,
        ),
        Commands::Delete { query, yes } => handle_delete(store, query, *yes, start),
        Commands::Ls { category, query } => {
            handle_ls(store, category.as_deref(), query.as_deref(), start)
        }
        Commands::Find { query } => handle_find(store, query, start),
        Commands::Show { query, json } => handle_show(store, query, *json, start),
        Commands::Use {
            query,
            vars,
            with_system,
        } => handle_use(store, config, query, vars, *with_system, start),
        Commands::Export { query, out, stdout } => {
            handle_export(store, query, out.as_deref(), *stdout, start)
        }
        Commands::Report { format, out } => handle_report(store, format, out.as_deref(), start),
        Commands::Suggest {
            field,
            text,
            cursor,
            accept,
        } => handle_suggest(store, config, *field, text, *cursor, *accept),
    }
}

fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = parse_cli();

    // Only initialize logging if explicitly requested via env var
    if LogConfig::requested() {
        if let Err(e) = init_logging(LogConfig::from_env()) {
            eprintln!("warning: {}", e);
        }
    }

    let start = Instant::now();
    let name = cli.command.as_ref().map(command_name).unwrap_or("help");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprint!("{}", error_help::explain(&e, &[]));
            std::process::exit(1);
        }
    };

    let mut store: Option<Store> = None;
    let result = run(cli, &config, &mut store, start);
    log_command_execution(name, start.elapsed().as_millis() as u64, &result);

    if let Err(e) = result {
        let records = store.as_ref().map(Store::records).unwrap_or_default();
        eprint!("{}", error_help::explain(&e, records));
        std::process::exit(1);
    }
}
