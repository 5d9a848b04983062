// Export commands: single record JSON and bulk reports

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::common::{resolve, status};
use promptlib::export::{
    default_file_name, export_record, report, write_record_file, write_report, ReportFormat,
};
use promptlib::Store;

pub fn handle_export(
    store: &Store,
    query: &str,
    out: Option<&Path>,
    stdout: bool,
    start: Instant,
) -> Result<()> {
    let record = resolve(store, query)?;

    if stdout {
        println!("{}", export_record(record)?);
        return Ok(());
    }

    let target = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_file_name(record)));
    let written = write_record_file(record, &target)?;
    status(&format!("Exported {} to {}", record.id, written.display()), start);
    Ok(())
}

pub fn handle_report(
    store: &Store,
    format: &str,
    out: Option<&Path>,
    start: Instant,
) -> Result<()> {
    let format: ReportFormat = format.parse()?;

    match out {
        Some(path) => {
            write_report(store.records(), format, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            status(
                &format!(
                    "Wrote {} prompts as {} to {}",
                    store.len(),
                    format.extension(),
                    path.display()
                ),
                start,
            );
        }
        None => print!("{}", report(store.records(), format)?),
    }
    Ok(())
}
