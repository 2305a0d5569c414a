// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Project directory scanning
//!
//! Walks one level below the projects root, decides which children look like
//! projects, and builds a [`ProjectRecord`] per child. Root-level problems fail
//! the whole scan; anything that goes wrong inside one child becomes a
//! [`ScanEntry::Failed`] for that child only.

use crate::error::ScanError;
use crate::id::slug;
use crate::stack::detect_tech_stack;
use crate::status::classify;
use crate::tags::TagStore;
use crate::types::{EntryError, ProjectRecord, ScanEntry, ScanReport, Status};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Tooling, VCS and build directories never reported as projects
pub const IGNORED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    ".next",
    ".cache",
    ".pnpm",
    "dist",
    "build",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
];

/// Any one of these marks a directory as a recognized project
pub const PROJECT_INDICATORS: &[&str] = &[
    "package.json",
    ".git",
    "README.md",
    "README.txt",
    "README",
    "pyproject.toml",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Makefile",
];

/// Manifests checked for `has_manifest` and descriptions, in priority order
pub const MANIFEST_FILES: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml"];

/// README variants, in lookup order
pub const README_FILES: &[&str] = &[
    "README.md",
    "README.txt",
    "README",
    "readme.md",
    "Readme.md",
];

/// READMEs longer than this are truncated when loaded
pub const MAX_README_BYTES: usize = 50_000;

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Report directories whose name starts with `.`
    pub include_hidden: bool,
    /// Upper bound on directories inspected at once
    pub concurrency: usize,
    /// Extra glob patterns matched against child directory names
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            concurrency: 8,
            exclude: Vec::new(),
        }
    }
}

/// Scan `root` with the current time as the classification instant
pub async fn scan_path(
    root: &Path,
    config: &ScanConfig,
    tags: Arc<dyn TagStore>,
) -> Result<ScanReport, ScanError> {
    scan_path_at(root, config, tags, Utc::now()).await
}

/// Scan `root`, classifying every record against `now`
pub async fn scan_path_at(
    root: &Path,
    config: &ScanConfig,
    tags: Arc<dyn TagStore>,
    now: DateTime<Utc>,
) -> Result<ScanReport, ScanError> {
    info!(root = %root.display(), "scanning projects");

    let exclude = build_exclude_set(&config.exclude)?;
    check_root(root).await?;
    let candidates = list_candidates(root, config, &exclude).await?;
    debug!(count = candidates.len(), "candidate directories");

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, (name, path)) in candidates.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let tags = Arc::clone(&tags);
        join_set.spawn(async move {
            // The semaphore is never closed, so acquire only fails after drop.
            let _permit = semaphore.acquire_owned().await.ok();
            let entry = match scan_project(&path, &name, tags.as_ref(), now).await {
                Ok(record) => ScanEntry::Project(record),
                Err(message) => {
                    warn!(path = %path.display(), error = %message, "failed to scan directory");
                    ScanEntry::Failed(EntryError { path, message })
                }
            };
            (idx, entry)
        });
    }

    let mut slots: Vec<Option<ScanEntry>> = vec![None; candidates.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, entry)) => slots[idx] = Some(entry),
            Err(e) => warn!(error = %e, "directory scan task aborted"),
        }
    }

    let entries: Vec<ScanEntry> = slots
        .into_iter()
        .zip(candidates)
        .map(|(slot, (_, path))| {
            slot.unwrap_or_else(|| {
                ScanEntry::Failed(EntryError {
                    path,
                    message: "scan task aborted".to_string(),
                })
            })
        })
        .collect();

    let report = ScanReport {
        root: root.to_path_buf(),
        scanned_at: now,
        entries,
    };

    for id in report.duplicate_ids() {
        warn!(id = %id, "several directories share the same project id");
    }
    info!(
        projects = report.projects().count(),
        errors = report.errors().count(),
        "scan complete"
    );

    Ok(report)
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidExclude {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidExclude {
        pattern: patterns.join(", "),
        source,
    })
}

async fn check_root(root: &Path) -> Result<(), ScanError> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ScanError::NotFound {
            path: root.to_path_buf(),
        }),
        Err(source) => Err(ScanError::Unreadable {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Whether a child directory name is filtered out before inspection
fn is_excluded(name: &str, config: &ScanConfig, exclude: &GlobSet) -> bool {
    IGNORED_DIRECTORIES.contains(&name)
        || (!config.include_hidden && name.starts_with('.'))
        || exclude.is_match(name)
}

/// Child directories of `root` that survive filtering, sorted by name
async fn list_candidates(
    root: &Path,
    config: &ScanConfig,
    exclude: &GlobSet,
) -> Result<Vec<(String, PathBuf)>, ScanError> {
    let unreadable = |source: std::io::Error| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(unreadable)?;
    let mut candidates = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_excluded(&name, config, exclude) {
            debug!(name = %name, "skipping excluded directory");
            continue;
        }

        let path = entry.path();
        // `file_type` does not follow symlinks; `metadata` does.
        let is_dir = match entry.file_type().await {
            Ok(ft) if ft.is_dir() => true,
            Ok(ft) if ft.is_symlink() => tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()),
            Ok(_) => false,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot determine entry type");
                tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir())
            }
        };

        if is_dir {
            candidates.push((name, path));
        }
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(candidates)
}

async fn any_exists(dir: &Path, names: &[&str]) -> std::io::Result<bool> {
    for name in names {
        if tokio::fs::try_exists(dir.join(name)).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Build the record for one directory. Errors carry a human-readable message.
async fn scan_project(
    path: &Path,
    name: &str,
    tags: &dyn TagStore,
    now: DateTime<Utc>,
) -> Result<ProjectRecord, String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| format!("failed to read metadata: {e}"))?;
    let last_modified: DateTime<Utc> = metadata
        .modified()
        .map_err(|e| format!("modification time unavailable: {e}"))?
        .into();

    let is_project = any_exists(path, PROJECT_INDICATORS)
        .await
        .map_err(|e| format!("failed to check project indicators: {e}"))?;
    let has_manifest = any_exists(path, MANIFEST_FILES)
        .await
        .map_err(|e| format!("failed to check manifests: {e}"))?;
    let has_readme = any_exists(path, README_FILES)
        .await
        .map_err(|e| format!("failed to check README files: {e}"))?;
    let manifest_description = if has_manifest {
        read_description(path).await
    } else {
        None
    };
    let description = match manifest_description {
        Some(d) => Some(d),
        None if has_readme => readme_description(path).await,
        None => None,
    };
    let tech_stack = detect_tech_stack(path)
        .await
        .map_err(|e| format!("failed to detect tech stack: {e}"))?;

    let id = slug(name);
    let project_tags = tags
        .get(&id)
        .await
        .map_err(|e| format!("failed to load tags: {e}"))?;

    let status = if is_project {
        classify(None, last_modified, now)
    } else {
        Status::Unknown
    };

    Ok(ProjectRecord {
        id,
        name: name.to_string(),
        path: path.to_path_buf(),
        description,
        last_modified,
        has_manifest,
        has_readme,
        tech_stack,
        tags: project_tags,
        status,
        repo: None,
    })
}

// =============================================================================
// Manifest descriptions
// =============================================================================

/// Description from the first manifest that has one. Parse errors are ignored.
pub async fn read_description(dir: &Path) -> Option<String> {
    for manifest in MANIFEST_FILES {
        let Ok(content) = tokio::fs::read_to_string(dir.join(manifest)).await else {
            continue;
        };
        let description = match *manifest {
            "package.json" => package_json_description(&content),
            "Cargo.toml" => cargo_description(&content),
            "pyproject.toml" => pyproject_description(&content),
            _ => None,
        };
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if description.is_some() {
            return description;
        }
    }
    None
}

fn package_json_description(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    value.get("description")?.as_str().map(String::from)
}

fn cargo_description(content: &str) -> Option<String> {
    let table: toml::Table = toml::from_str(content).ok()?;
    table
        .get("package")?
        .get("description")?
        .as_str()
        .map(String::from)
}

fn pyproject_description(content: &str) -> Option<String> {
    let table: toml::Table = toml::from_str(content).ok()?;
    table
        .get("project")
        .and_then(|p| p.get("description"))
        .or_else(|| table.get("tool")?.get("poetry")?.get("description"))?
        .as_str()
        .map(String::from)
}

// =============================================================================
// README
// =============================================================================

/// Content of the first readable README, truncated to [`MAX_README_BYTES`]
pub async fn read_readme(dir: &Path) -> Option<String> {
    for file_name in README_FILES {
        if let Ok(content) = tokio::fs::read_to_string(dir.join(file_name)).await {
            return Some(truncate_readme(content));
        }
    }
    None
}

/// Shortest README line accepted as a description
const MIN_README_DESCRIPTION_CHARS: usize = 20;

/// README description lines are cut to this many characters
const MAX_README_DESCRIPTION_CHARS: usize = 200;

/// First prose line among the three lines after a README's first line.
///
/// Headings and lines of [`MIN_README_DESCRIPTION_CHARS`] characters or fewer
/// are skipped.
pub async fn readme_description(dir: &Path) -> Option<String> {
    for file_name in README_FILES {
        if let Ok(content) = tokio::fs::read_to_string(dir.join(file_name)).await {
            return description_line(&content);
        }
    }
    None
}

fn description_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
        .take(3)
        .find(|line| {
            !line.starts_with('#') && line.chars().count() > MIN_README_DESCRIPTION_CHARS
        })
        .map(|line| line.chars().take(MAX_README_DESCRIPTION_CHARS).collect())
}

fn truncate_readme(mut content: String) -> String {
    if content.len() <= MAX_README_BYTES {
        return content;
    }
    let mut cut = MAX_README_BYTES;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    content.truncate(cut);
    content.push_str("\n\n... (truncated)");
    content
}
