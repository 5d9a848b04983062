//! User configuration
//!
//! Settings live in `config.toml` under the base directory
//! (`$PROMPTLIB_HOME`, else `~/.promptlib`). A missing file means defaults;
//! environment variables override individual keys afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::DEFAULT_AUTHOR;
use crate::storage::StartupPolicy;
use crate::suggest::{default_tokens, Token, DEFAULT_MAX_SUGGESTIONS};

pub const CONFIG_FILE: &str = "config.toml";
pub const LIBRARY_FILE: &str = "prompts.json";

/// External editor used for prompt bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Editor command (e.g., "code", "nvim", "nano")
    pub command: String,
    /// Extra arguments placed before the file path (e.g., ["--wait"])
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let command = env::var("VISUAL")
            .or_else(|_| env::var("EDITOR"))
            .unwrap_or_else(|_| {
                if cfg!(windows) {
                    "notepad".to_string()
                } else {
                    "vi".to_string()
                }
            });
        Self {
            command,
            args: vec![],
        }
    }
}

/// Everything `config.toml` can set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library document; relative paths resolve against the base directory
    pub library_path: Option<PathBuf>,
    pub startup: StartupPolicy,
    /// Author stamped on new records
    pub author: String,
    /// Value for `{{username}}`
    pub username: Option<String>,
    pub max_suggestions: usize,
    pub tokens: Vec<Token>,
    pub editor: Option<EditorConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: None,
            startup: StartupPolicy::default(),
            author: DEFAULT_AUTHOR.to_string(),
            username: None,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            tokens: default_tokens(),
            editor: None,
        }
    }
}

impl Config {
    /// Load from the default base directory and apply environment overrides
    pub fn load() -> Result<Self> {
        let base = base_dir()?;
        let mut config = Self::load_from(&base.join(CONFIG_FILE))?;
        config.apply_env()?;
        config.resolve_library_path(&base);
        Ok(config)
    }

    /// Parse `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        if config.author.trim().is_empty() {
            config.author = DEFAULT_AUTHOR.to_string();
        }
        if config.max_suggestions == 0 {
            config.max_suggestions = DEFAULT_MAX_SUGGESTIONS;
        }
        Ok(config)
    }

    /// `PROMPTLIB_FILE`, `PROMPTLIB_STARTUP` and `PROMPTLIB_AUTHOR` win over the file
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(file) = lookup("PROMPTLIB_FILE").filter(|v| !v.is_empty()) {
            self.library_path = Some(PathBuf::from(file));
        }
        if let Some(startup) = lookup("PROMPTLIB_STARTUP").filter(|v| !v.is_empty()) {
            self.startup = startup
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PROMPTLIB_STARTUP value: {}", e))?;
        }
        if let Some(author) = lookup("PROMPTLIB_AUTHOR").filter(|v| !v.trim().is_empty()) {
            self.author = author;
        }
        Ok(())
    }

    fn resolve_library_path(&mut self, base: &Path) {
        let path = match self.library_path.take() {
            Some(path) if path.is_relative() => base.join(path),
            Some(path) => path,
            None => base.join(LIBRARY_FILE),
        };
        self.library_path = Some(path);
    }

    /// Library document location; defaults to `prompts.json` in the base directory
    pub fn library_path(&self) -> Result<PathBuf> {
        match &self.library_path {
            Some(path) => Ok(path.clone()),
            None => Ok(base_dir()?.join(LIBRARY_FILE)),
        }
    }

    pub fn editor(&self) -> EditorConfig {
        self.editor.clone().unwrap_or_default()
    }
}

/// `$PROMPTLIB_HOME`, else `~/.promptlib`
pub fn base_dir() -> Result<PathBuf> {
    if let Ok(home) = env::var("PROMPTLIB_HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".promptlib"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(base_dir()?.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.startup, StartupPolicy::Strict);
        assert_eq!(config.author, "local");
        assert_eq!(config.max_suggestions, 10);
        assert_eq!(config.tokens.len(), 4);
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
library_path = "lib/prompts.json"
startup = "lenient"
author = "ada"
username = "Ada"
max_suggestions = 5

[[tokens]]
marker = "{{tone}}"
help = "Voice of the answer"

[editor]
command = "code"
args = ["--wait"]
"#,
        )
        .unwrap();
        assert_eq!(config.startup, StartupPolicy::Lenient);
        assert_eq!(config.author, "ada");
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.tokens, vec![Token::new("{{tone}}", "Voice of the answer")]);
        assert_eq!(config.editor().args, vec!["--wait"]);

        let mut config = config;
        config.resolve_library_path(Path::new("/base"));
        assert_eq!(
            config.library_path().unwrap(),
            PathBuf::from("/base/lib/prompts.json")
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "startup = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_unknown_startup_rejected() {
        assert!(Config::parse("startup = \"sometimes\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|name| match name {
                "PROMPTLIB_FILE" => Some("/tmp/other.json".to_string()),
                "PROMPTLIB_STARTUP" => Some("lenient".to_string()),
                "PROMPTLIB_AUTHOR" => Some("ci".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.library_path, Some(PathBuf::from("/tmp/other.json")));
        assert_eq!(config.startup, StartupPolicy::Lenient);
        assert_eq!(config.author, "ci");

        let err = config.apply_overrides(|name| {
            (name == "PROMPTLIB_STARTUP").then(|| "maybe".to_string())
        });
        assert!(err.is_err());
    }
}
