// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Projdeck library - a deck of your local projects
//!
//! This crate scans a directory of software projects, enriches each one with
//! git status, classifies it into a coarse lifecycle status, and keeps
//! user-assigned tags that survive rescans.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod id;
pub mod launcher;
pub mod portfolio;
pub mod scanner;
pub mod stack;
pub mod status;
pub mod tags;

/// Core data types shared by the scanner, the enricher and the CLI
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::path::PathBuf;
    use std::str::FromStr;

    // =========================================================================
    // Status
    // =========================================================================

    /// Coarse lifecycle label computed from git state and recency
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Status {
        /// Touched or committed within the last 7 days
        Active,
        /// Untouched for more than 30 days
        Stale,
        /// Repository with no local changes, 7-30 days old
        Clean,
        /// Repository with uncommitted changes
        Dirty,
        /// Not enough evidence for anything else
        Unknown,
    }

    impl Status {
        /// Every status, in display order
        pub const ALL: [Status; 5] = [
            Self::Active,
            Self::Dirty,
            Self::Clean,
            Self::Stale,
            Self::Unknown,
        ];

        /// Lowercase label used in output and filters
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Active => "active",
                Self::Stale => "stale",
                Self::Clean => "clean",
                Self::Dirty => "dirty",
                Self::Unknown => "unknown",
            }
        }

        /// Sort rank: projects needing attention first
        #[must_use]
        pub fn rank(&self) -> u8 {
            match self {
                Self::Dirty => 0,
                Self::Active => 1,
                Self::Clean => 2,
                Self::Stale => 3,
                Self::Unknown => 4,
            }
        }
    }

    impl fmt::Display for Status {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for Status {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::ALL
                .into_iter()
                .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
                .ok_or_else(|| {
                    format!(
                        "unknown status '{s}' (expected active, dirty, clean, stale or unknown)"
                    )
                })
        }
    }

    // =========================================================================
    // Project Records
    // =========================================================================

    /// Git state of a project directory
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RepoInfo {
        /// Current branch, or "HEAD" when detached
        pub branch: String,
        /// True when the working tree has any changes, untracked files included
        pub is_dirty: bool,
        /// Number of changed or untracked paths
        pub uncommitted_changes: usize,
        /// Commits on the branch not yet on its upstream
        pub ahead_by: usize,
        /// Commits on the upstream not yet on the branch
        pub behind_by: usize,
        /// Committer time of HEAD, absent for repositories without commits
        pub last_commit_at: Option<DateTime<Utc>>,
        /// Trimmed message of HEAD
        pub last_commit_message: Option<String>,
    }

    /// Technologies inferred from the files in a project directory
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TechStack {
        /// Programming languages, e.g. "Rust", "TypeScript"
        #[serde(default)]
        pub languages: Vec<String>,
        /// Frameworks, e.g. "React", "Django"
        #[serde(default)]
        pub frameworks: Vec<String>,
        /// Tooling, e.g. "Docker"
        #[serde(default)]
        pub tools: Vec<String>,
    }

    impl TechStack {
        /// Nothing was detected
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.languages.is_empty() && self.frameworks.is_empty() && self.tools.is_empty()
        }

        /// Every entry: languages, then frameworks, then tools
        pub fn iter(&self) -> impl Iterator<Item = &str> {
            self.languages
                .iter()
                .chain(&self.frameworks)
                .chain(&self.tools)
                .map(String::as_str)
        }
    }

    /// One scanned directory
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProjectRecord {
        /// Slug of `name`, see [`crate::id::slug`]
        pub id: String,
        /// Raw directory name
        pub name: String,
        /// Absolute path, the handle for every re-query
        pub path: PathBuf,
        /// Description from a manifest, else from the README
        pub description: Option<String>,
        /// Directory mtime at scan time
        pub last_modified: DateTime<Utc>,
        /// A package manifest is present
        pub has_manifest: bool,
        /// A README is present
        pub has_readme: bool,
        /// Detected languages, frameworks and tools
        #[serde(default)]
        pub tech_stack: TechStack,
        /// User tags, in insertion order
        #[serde(default)]
        pub tags: Vec<String>,
        /// Computed status, never persisted as authoritative
        pub status: Status,
        /// Git state, present only for recognized repositories
        pub repo: Option<RepoInfo>,
    }

    impl ProjectRecord {
        /// Whether enrichment attached git state to this record
        #[must_use]
        pub fn is_repository(&self) -> bool {
            self.repo.is_some()
        }

        /// Case-insensitive match against name, description, tags and tech stack
        #[must_use]
        pub fn matches_text(&self, needle: &str) -> bool {
            let needle = needle.to_lowercase();
            self.name.to_lowercase().contains(&needle)
                || self
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                || self
                    .tech_stack
                    .iter()
                    .any(|t| t.to_lowercase().contains(&needle))
        }
    }

    // =========================================================================
    // Scan Results
    // =========================================================================

    /// A directory that could not be turned into a record
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntryError {
        /// Directory that failed
        pub path: PathBuf,
        /// What went wrong
        pub message: String,
    }

    /// Outcome for one child directory of the scanned root
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum ScanEntry {
        /// Directory scanned successfully
        Project(ProjectRecord),
        /// Directory failed, siblings unaffected
        Failed(EntryError),
    }

    /// Result of scanning one root directory
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ScanReport {
        /// The scanned root
        pub root: PathBuf,
        /// Instant every record was classified against
        pub scanned_at: DateTime<Utc>,
        /// One entry per qualifying child directory
        pub entries: Vec<ScanEntry>,
    }

    impl ScanReport {
        /// Successfully scanned records
        pub fn projects(&self) -> impl Iterator<Item = &ProjectRecord> {
            self.entries.iter().filter_map(|e| match e {
                ScanEntry::Project(p) => Some(p),
                ScanEntry::Failed(_) => None,
            })
        }

        /// Per-directory failures
        pub fn errors(&self) -> impl Iterator<Item = &EntryError> {
            self.entries.iter().filter_map(|e| match e {
                ScanEntry::Failed(err) => Some(err),
                ScanEntry::Project(_) => None,
            })
        }

        /// Ids produced by more than one directory
        #[must_use]
        pub fn duplicate_ids(&self) -> Vec<String> {
            crate::id::duplicates(self.projects().map(|p| p.id.as_str()))
        }

        /// Split into records and errors, preserving order
        #[must_use]
        pub fn into_parts(self) -> (Vec<ProjectRecord>, Vec<EntryError>) {
            let mut projects = Vec::new();
            let mut errors = Vec::new();
            for entry in self.entries {
                match entry {
                    ScanEntry::Project(p) => projects.push(p),
                    ScanEntry::Failed(e) => errors.push(e),
                }
            }
            (projects, errors)
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::git::{enrich_at, GitCli, RepoIntrospector};
    pub use crate::portfolio::{Portfolio, ProjectQuery, SortKey};
    pub use crate::scanner::{scan_path, scan_path_at, ScanConfig};
    pub use crate::tags::{JsonTagStore, MemoryTagStore, TagStore};
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
