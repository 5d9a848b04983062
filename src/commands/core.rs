// Prompt management commands: init, path, add, edit, delete, ls, find, show, use

use anyhow::{Context, Result};
use colored::*;
use is_terminal::IsTerminal;
use std::path::Path;
use std::time::Instant;

use super::common::{interactive, preview, read_body, resolve, resolve_id, status};
use promptlib::edit::edit_content;
use promptlib::logging::log_performance_metric;
use promptlib::record::{format_timestamp, parse_tag_list, UNCATEGORIZED};
use promptlib::{
    config_path, filter, group_by_category, Config, NewRecord, PromptRecord, RecordPatch, Store,
    TemplateProcessor,
};

pub fn handle_init(path: &Path, start: Instant) -> Result<()> {
    if Store::init(path)? {
        status(&format!("Created {}", path.display()), start);
    } else {
        println!("Library already exists at {}", path.display());
    }
    Ok(())
}

pub fn handle_path(path: &Path, config: &Config, start: Instant) -> Result<()> {
    println!("library: {}", path.display());
    println!("config:  {}", config_path()?.display());
    println!("startup: {}", config.startup);
    if interactive() && !path.exists() {
        println!(
            "\n{} run {} to create it ({}ms)",
            "Library file does not exist yet:".yellow(),
            "plib init".cyan(),
            start.elapsed().as_millis()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_add(
    store: &mut Store,
    config: &Config,
    title: &str,
    category: Option<&str>,
    tags: Option<&str>,
    body: Option<String>,
    system: Option<String>,
    edit: bool,
    start: Instant,
) -> Result<()> {
    let body = read_body(config, body, edit, "")?.unwrap_or_default();
    let new = NewRecord {
        title: title.to_string(),
        category: category.unwrap_or(UNCATEGORIZED).to_string(),
        body,
        tags: tags.map(parse_tag_list).unwrap_or_default(),
        system,
    };

    let record = store.add(new)?;
    status(&format!("Added {} ({})", record.title.bold(), record.id), start);
    if !interactive() {
        println!("{}", record.id);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    store: &mut Store,
    config: &Config,
    query: &str,
    title: Option<String>,
    category: Option<String>,
    tags: Option<&str>,
    body: Option<String>,
    system: Option<String>,
    no_system: bool,
    start: Instant,
) -> Result<()> {
    let id = resolve_id(store, query)?;
    let mut patch = RecordPatch {
        title,
        category,
        body,
        tags: tags.map(parse_tag_list),
        system: if no_system { Some(None) } else { system.map(Some) },
    };

    if patch.is_empty() {
        let current = store
            .get(&id)
            .map(|r| r.body.clone())
            .unwrap_or_default();
        let edited = edit_content(&config.editor(), &current)?;
        if edited == current {
            println!("No changes to {}", id);
            return Ok(());
        }
        patch.body = Some(edited);
    }

    let record = store.update(&id, patch)?;
    status(&format!("Updated {}", record.title.bold()), start);
    Ok(())
}

pub fn handle_delete(store: &mut Store, query: &str, yes: bool, start: Instant) -> Result<()> {
    let record = resolve(store, query)?;
    let id = record.id.clone();

    if !yes {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("Refusing to delete '{}' without confirmation; pass --yes", id);
        }
        println!("\n{}", "About to delete:".yellow().bold());
        println!("  {} - {}", record.title.bold(), record.category);
        let snippet = preview(&record.body, 60);
        if !snippet.is_empty() {
            println!("  {}", snippet.dimmed());
        }
        println!("\n{}", format!("Delete '{}'? [y/N] ", id).red());

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Deletion cancelled");
            return Ok(());
        }
    }

    store.delete(&id)?;
    status(&format!("Deleted {}", id), start);
    Ok(())
}

fn print_groups(records: &[&PromptRecord], start: Instant) {
    let index = group_by_category(records.iter().copied());

    if interactive() {
        println!(
            "📋 {} ({}ms)",
            format!("{} prompts in {} categories", index.record_count(), index.category_count())
                .green(),
            start.elapsed().as_millis()
        );
    }
    for group in index.iter() {
        if interactive() {
            println!("\n{} ({})", group.name.bold(), group.len());
        } else {
            println!("{}", group.name);
        }
        for record in &group.records {
            let tags = if record.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", record.tags.join(", "))
            };
            if interactive() {
                println!(
                    "  {:<28} {}{}",
                    record.title.bold(),
                    record.id.dimmed(),
                    tags.cyan()
                );
            } else {
                println!("  {}\t{}{}", record.id, record.title, tags);
            }
        }
    }
}

pub fn handle_ls(
    store: &Store,
    category: Option<&str>,
    query: Option<&str>,
    start: Instant,
) -> Result<()> {
    if store.is_empty() {
        println!(
            "No prompts yet. Create one with: {} add <title>",
            "plib".bold()
        );
        return Ok(());
    }

    let filter_start = Instant::now();
    let mut records = filter(store.records(), query.unwrap_or(""));
    log_performance_metric(
        "filter_time",
        filter_start.elapsed().as_secs_f64() * 1000.0,
        "ms",
        Some("ls"),
    );
    if let Some(category) = category {
        records.retain(|r| r.category.eq_ignore_ascii_case(category));
    }
    print_groups(&records, start);
    Ok(())
}

pub fn handle_find(store: &Store, query: &str, start: Instant) -> Result<()> {
    let filter_start = Instant::now();
    let records = filter(store.records(), query);
    log_performance_metric(
        "filter_time",
        filter_start.elapsed().as_secs_f64() * 1000.0,
        "ms",
        Some("find"),
    );
    if records.is_empty() {
        println!("No prompts match '{}'", query);
        return Ok(());
    }
    print_groups(&records, start);
    Ok(())
}

pub fn handle_show(store: &Store, query: &str, json: bool, start: Instant) -> Result<()> {
    let record = resolve(store, query)?;
    if json {
        println!("{}", promptlib::export_record(record)?);
        return Ok(());
    }

    if interactive() {
        println!("{} ({}ms)", record.title.bold().green(), start.elapsed().as_millis());
        println!("  {} {}", "id:".dimmed(), record.id);
        println!("  {} {}", "category:".dimmed(), record.category);
        if !record.tags.is_empty() {
            println!("  {} {}", "tags:".dimmed(), record.tags.join(", ").cyan());
        }
        println!(
            "  {} {} · {} {} · {} {}",
            "created".dimmed(),
            format_timestamp(&record.meta.created_at),
            "updated".dimmed(),
            format_timestamp(&record.meta.updated_at),
            "used".dimmed(),
            record.meta.usage_count
        );
        if let Some(system) = &record.system {
            println!("\n{}\n{}", "System:".yellow(), system);
        }
        println!();
    }
    println!("{}", record.body);
    Ok(())
}

pub fn handle_use(
    store: &mut Store,
    config: &Config,
    query: &str,
    vars: &[String],
    with_system: bool,
    start: Instant,
) -> Result<()> {
    let id = resolve_id(store, query)?;

    let mut processor = TemplateProcessor::new().with_username(config.username.clone());
    for assignment in vars {
        processor
            .set_assignment(assignment)
            .with_context(|| format!("Invalid --var '{}'", assignment))?;
    }

    let record = store.record_usage(&id)?;
    let rendered = processor.render(&record.body);
    let missing = processor.unresolved(&record.body);

    if with_system {
        if let Some(system) = &record.system {
            println!("{}\n", processor.render(system));
        }
    }
    println!("{}", rendered);

    if !missing.is_empty() {
        eprintln!(
            "{} no value for {} (use --var name=value)",
            "warning:".yellow(),
            missing
                .iter()
                .map(|m| format!("{{{{{}}}}}", m))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if interactive() {
        eprintln!(
            "{} used {} times ({}ms)",
            "✓".green(),
            record.meta.usage_count,
            start.elapsed().as_millis()
        );
    }
    Ok(())
}
