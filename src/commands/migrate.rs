// Legacy library conversion

use anyhow::Result;
use colored::*;
use std::time::Instant;

use super::common::status;
use promptlib::Store;

pub fn handle_migrate(store: &mut Store, dry_run: bool, start: Instant) -> Result<()> {
    let shape = store.source_shape();
    if !shape.is_legacy() {
        println!("{} is already in the current format", store.path().display());
        return Ok(());
    }

    println!(
        "{} {} document with {} prompts",
        "Found".yellow(),
        shape,
        store.len()
    );
    for note in store.migration_notes() {
        println!("  {} {}", "dropped:".dimmed(), note);
    }

    if dry_run {
        println!("Dry run: nothing written");
        return Ok(());
    }

    store.save()?;
    status(
        &format!("Rewrote {} in the current format", store.path().display()),
        start,
    );
    Ok(())
}
