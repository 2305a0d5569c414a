// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then `config.toml`, then
//! `PROJDECK_*` environment variables. CLI flags are applied on top by the
//! caller. Writes go through [`persist`], which touches one key of the file
//! and nothing else.

use crate::git::{GitCli, DEFAULT_GIT_TIMEOUT_SECS};
use crate::launcher::{Launcher, DEFAULT_EDITOR};
use crate::scanner::ScanConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `PROJDECK_PROJECTS_PATH`
pub const ENV_PREFIX: &str = "PROJDECK";

/// Keys accepted by [`Settings::get`] and [`Settings::set`]
pub const KEYS: &[&str] = &[
    "projects_path",
    "data_dir",
    "include_hidden",
    "concurrency",
    "exclude",
    "editor",
    "terminal",
    "git_timeout",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory whose children are scanned
    pub projects_path: PathBuf,
    /// Directory for persistent data (tags)
    pub data_dir: PathBuf,
    /// Include dot-directories in scans
    pub include_hidden: bool,
    /// Maximum directories or repositories inspected at once
    pub concurrency: usize,
    /// Extra glob patterns for directory names to skip
    pub exclude: Vec<String>,
    /// Editor command line
    pub editor: String,
    /// Terminal command line; platform default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    /// Seconds a single git invocation may take
    pub git_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_path: default_projects_path(),
            data_dir: default_data_dir(),
            include_hidden: false,
            concurrency: 8,
            exclude: Vec::new(),
            editor: DEFAULT_EDITOR.to_string(),
            terminal: None,
            git_timeout: DEFAULT_GIT_TIMEOUT_SECS,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "hyperpolymath", "projdeck")
}

fn default_projects_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join("Documents").join("Projects"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".projdeck")
        })
}

/// Location of `config.toml` when no path is given
#[must_use]
pub fn default_config_file() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".projdeck").join("config.toml"))
}

/// Load settings from `path` (or the default file) and the environment
pub fn load(path: Option<&Path>) -> Result<Settings> {
    read_layers(path, true)
}

/// Load settings from `path` (or the default file) without environment overrides
pub fn load_file(path: Option<&Path>) -> Result<Settings> {
    read_layers(path, false)
}

fn read_layers(path: Option<&Path>, with_env: bool) -> Result<Settings> {
    let file = path.map_or_else(default_config_file, Path::to_path_buf);
    tracing::debug!(file = %file.display(), with_env, "loading settings");

    let mut builder = config::Config::builder().add_source(
        config::File::from(file.as_path())
            .format(config::FileFormat::Toml)
            .required(false),
    );
    if with_env {
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude"),
        );
    }

    builder
        .build()
        .with_context(|| format!("Failed to read configuration from {}", file.display()))?
        .try_deserialize()
        .with_context(|| format!("Invalid configuration in {}", file.display()))
}

/// Set one key in the TOML file at `path` (or the default file).
///
/// The value is validated like [`Settings::set`]. Only `key` changes on disk:
/// keys the file already holds are kept, and defaults or environment
/// overrides are never written. Returns the file and the stored value.
pub fn persist(path: Option<&Path>, key: &str, value: &str) -> Result<(PathBuf, String)> {
    let file = path.map_or_else(default_config_file, Path::to_path_buf);

    let mut table: toml::Table = match std::fs::read_to_string(&file) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", file.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", file.display()));
        }
    };

    let mut settings = load_file(Some(&file))?;
    settings.set(key, value)?;

    let serialized = toml::to_string(&settings).context("Failed to serialize settings")?;
    let mut fields: toml::Table =
        toml::from_str(&serialized).context("Failed to serialize settings")?;
    match fields.remove(key) {
        Some(stored) => table.insert(key.to_string(), stored),
        None => table.remove(key),
    };

    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&table).context("Failed to serialize settings")?;
    std::fs::write(&file, content)
        .with_context(|| format!("Failed to write {}", file.display()))?;

    Ok((file, settings.get(key).unwrap_or_default()))
}

impl Settings {
    /// Scanner options derived from these settings
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            include_hidden: self.include_hidden,
            concurrency: self.concurrency.max(1),
            exclude: self.exclude.clone(),
        }
    }

    /// Launcher using the configured editor and terminal
    #[must_use]
    pub fn launcher(&self) -> Launcher {
        Launcher::new(self.editor.clone(), self.terminal.clone())
    }

    /// Git backend honoring the configured timeout
    #[must_use]
    pub fn git(&self) -> GitCli {
        GitCli::new().with_timeout(Duration::from_secs(self.git_timeout.max(1)))
    }

    /// Current value of `key` as display text
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "projects_path" => self.projects_path.display().to_string(),
            "data_dir" => self.data_dir.display().to_string(),
            "include_hidden" => self.include_hidden.to_string(),
            "concurrency" => self.concurrency.to_string(),
            "exclude" => self.exclude.join(","),
            "editor" => self.editor.clone(),
            "terminal" => self.terminal.clone().unwrap_or_default(),
            "git_timeout" => self.git_timeout.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Parse `value` into `key`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "projects_path" => self.projects_path = PathBuf::from(value),
            "data_dir" => self.data_dir = PathBuf::from(value),
            "include_hidden" => {
                self.include_hidden = value.parse().with_context(|| {
                    format!("include_hidden must be true or false, got '{value}'")
                })?;
            }
            "concurrency" => {
                let n: usize = value.parse().with_context(|| {
                    format!("concurrency must be a positive integer, got '{value}'")
                })?;
                anyhow::ensure!(n > 0, "concurrency must be at least 1");
                self.concurrency = n;
            }
            "git_timeout" => {
                let secs: u64 = value.parse().with_context(|| {
                    format!("git_timeout must be a number of seconds, got '{value}'")
                })?;
                anyhow::ensure!(secs > 0, "git_timeout must be at least 1 second");
                self.git_timeout = secs;
            }
            "exclude" => {
                self.exclude = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            "editor" => {
                anyhow::ensure!(!value.is_empty(), "editor cannot be empty");
                self.editor = value.to_string();
            }
            "terminal" => {
                self.terminal = (!value.is_empty()).then(|| value.to_string());
            }
            other => anyhow::bail!("Unknown setting: {}. Valid: {}", other, KEYS.join(", ")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.editor, "code");
        assert!(!settings.include_hidden);
        assert_eq!(settings.git_timeout, 10);
        assert!(
            settings.projects_path.ends_with("Projects")
                || settings.projects_path == Path::new(".")
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(settings.concurrency, Settings::default().concurrency);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            "projects_path = \"/work/projects\"\nconcurrency = 3\nexclude = [\"archive-*\"]\n",
        )
        .unwrap();

        let settings = load(Some(&file)).unwrap();
        assert_eq!(settings.projects_path, PathBuf::from("/work/projects"));
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.exclude, vec!["archive-*"]);
        assert_eq!(settings.editor, "code");
    }

    #[test]
    fn test_persist_then_load() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("config.toml");

        persist(Some(&file), "editor", "nvim").unwrap();
        persist(Some(&file), "terminal", "alacritty").unwrap();
        let (written, stored) = persist(Some(&file), "exclude", "old-*, tmp").unwrap();
        assert_eq!(written, file);
        assert_eq!(stored, "old-*,tmp");

        let loaded = load_file(Some(&file)).unwrap();
        assert_eq!(loaded.editor, "nvim");
        assert_eq!(loaded.terminal.as_deref(), Some("alacritty"));
        assert_eq!(loaded.exclude, vec!["old-*", "tmp"]);
    }

    #[test]
    fn test_persist_writes_only_the_key() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "concurrency = 3\nunrelated = \"kept\"\n").unwrap();

        persist(Some(&file), "terminal", "alacritty").unwrap();

        let table: toml::Table = toml::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["concurrency", "terminal", "unrelated"]);
        assert_eq!(table["concurrency"].as_integer(), Some(3));
        assert_eq!(table["terminal"].as_str(), Some("alacritty"));

        // Clearing the terminal drops the key again
        persist(Some(&file), "terminal", "").unwrap();
        let table: toml::Table = toml::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert!(!table.contains_key("terminal"));
    }

    #[test]
    fn test_persist_rejects_invalid_value() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "concurrency = 3\n").unwrap();

        assert!(persist(Some(&file), "concurrency", "0").is_err());
        assert!(persist(Some(&file), "colour", "blue").is_err());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "concurrency = 3\n");
    }

    #[test]
    fn test_set_validates() {
        let mut settings = Settings::default();
        assert!(settings.set("concurrency", "0").is_err());
        assert!(settings.set("concurrency", "many").is_err());
        assert!(settings.set("include_hidden", "maybe").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert!(settings.set("git_timeout", "0").is_err());

        settings.set("git_timeout", "30").unwrap();
        assert_eq!(settings.get("git_timeout").as_deref(), Some("30"));

        settings.set("include_hidden", "true").unwrap();
        assert_eq!(settings.get("include_hidden").as_deref(), Some("true"));
        settings.set("terminal", "").unwrap();
        assert_eq!(settings.terminal, None);
        assert_eq!(settings.get("nonsense"), None);
    }

    #[test]
    fn test_scan_config_from_settings() {
        let settings = Settings {
            include_hidden: true,
            concurrency: 0,
            exclude: vec!["tmp-*".into()],
            ..Settings::default()
        };
        let scan = settings.scan_config();
        assert!(scan.include_hidden);
        assert_eq!(scan.concurrency, 1);
        assert_eq!(scan.exclude, vec!["tmp-*"]);
    }
}
