use anyhow::{Context, Result};
use std::io::Write;
use std::process::Command;
use tempfile::Builder;

use crate::config::EditorConfig;

/// Open `content` in the configured editor and return what the user saved
pub fn edit_content(editor: &EditorConfig, content: &str) -> Result<String> {
    let mut temp_file = Builder::new()
        .prefix("plib-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create scratch file")?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;

    let status = Command::new(&editor.command)
        .args(&editor.args)
        .arg(temp_file.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", editor.command))?;

    if !status.success() {
        anyhow::bail!("Editor '{}' exited with non-zero status", editor.command);
    }

    let edited = std::fs::read_to_string(temp_file.path())?;
    Ok(edited)
}
