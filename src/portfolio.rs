// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Portfolio service: scan, enrich, filter, sort and look up projects

use crate::config::Settings;
use crate::error::ScanError;
use crate::git::{self, RepoIntrospector};
use crate::scanner::{self, read_readme};
use crate::tags::TagStore;
use crate::types::{EntryError, ProjectRecord, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Ordering applied to listed projects
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recently modified first
    #[default]
    Modified,
    /// Alphabetical by directory name, case-insensitive
    Name,
    /// Dirty, active, clean, stale, unknown
    Status,
}

/// Filters and ordering for [`Portfolio::list`]
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    /// Keep only projects with this status
    pub status: Option<Status>,
    /// Keep only projects carrying this tag
    pub tag: Option<String>,
    /// Case-insensitive substring over name, description, tags and tech stack
    pub search: Option<String>,
    /// Primary sort key
    pub sort: SortKey,
    /// Invert the primary ordering
    pub reverse: bool,
    /// Skip git enrichment entirely
    pub skip_git: bool,
}

impl ProjectQuery {
    fn matches(&self, record: &ProjectRecord) -> bool {
        if self.status.is_some_and(|s| s != record.status) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !record.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => record.matches_text(needle),
            _ => true,
        }
    }
}

/// Listed projects plus what went wrong along the way
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    /// Projects passing the query, in query order
    pub projects: Vec<ProjectRecord>,
    /// Directories that could not be scanned
    pub errors: Vec<EntryError>,
    /// Projects found before filtering
    pub total: usize,
    /// Instant every record was classified against
    pub scanned_at: DateTime<Utc>,
    /// Ids shared by several directories
    pub duplicate_ids: Vec<String>,
}

/// A single project with its README and browsable remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    /// The project itself
    #[serde(flatten)]
    pub record: ProjectRecord,
    /// README content, truncated when very large
    pub readme: Option<String>,
    /// HTTPS form of the preferred remote
    pub remote_url: Option<String>,
}

/// Number of projects per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Recently touched
    pub active: usize,
    /// Untouched for over a month
    pub stale: usize,
    /// Clean repositories
    pub clean: usize,
    /// Repositories with uncommitted changes
    pub dirty: usize,
    /// Everything else
    pub unknown: usize,
}

impl StatusCounts {
    /// Tally `records`
    #[must_use]
    pub fn of(records: &[ProjectRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            *counts.slot(record.status) += 1;
        }
        counts
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Active => &mut self.active,
            Status::Stale => &mut self.stale,
            Status::Clean => &mut self.clean,
            Status::Dirty => &mut self.dirty,
            Status::Unknown => &mut self.unknown,
        }
    }

    /// Count for one status
    #[must_use]
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Active => self.active,
            Status::Stale => self.stale,
            Status::Clean => self.clean,
            Status::Dirty => self.dirty,
            Status::Unknown => self.unknown,
        }
    }

    /// Sum over every status
    #[must_use]
    pub fn total(&self) -> usize {
        Status::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Settings plus the two injected backends
pub struct Portfolio {
    settings: Settings,
    tags: Arc<dyn TagStore>,
    git: Arc<dyn RepoIntrospector>,
}

impl Portfolio {
    /// Build a portfolio over `settings.projects_path`
    pub fn new(
        settings: Settings,
        tags: Arc<dyn TagStore>,
        git: Arc<dyn RepoIntrospector>,
    ) -> Self {
        Self {
            settings,
            tags,
            git,
        }
    }

    /// Scanned root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.settings.projects_path
    }

    /// Scan and enrich the root, then filter and sort per `query`
    pub async fn list(&self, query: &ProjectQuery) -> Result<ProjectList, ScanError> {
        self.list_at(query, Utc::now()).await
    }

    /// [`Portfolio::list`] with a fixed classification instant
    pub async fn list_at(
        &self,
        query: &ProjectQuery,
        now: DateTime<Utc>,
    ) -> Result<ProjectList, ScanError> {
        let report = scanner::scan_path_at(
            self.root(),
            &self.settings.scan_config(),
            Arc::clone(&self.tags),
            now,
        )
        .await?;

        let duplicate_ids = report.duplicate_ids();
        let scanned_at = report.scanned_at;
        let (records, errors) = report.into_parts();

        let records = if query.skip_git {
            records
        } else {
            let concurrency = self.settings.concurrency;
            git::enrich_at(records, Arc::clone(&self.git), concurrency, now).await
        };

        let total = records.len();
        let mut projects: Vec<ProjectRecord> =
            records.into_iter().filter(|r| query.matches(r)).collect();
        sort_records(&mut projects, query.sort, query.reverse);
        debug!(total, shown = projects.len(), "projects listed");

        Ok(ProjectList {
            projects,
            errors,
            total,
            scanned_at,
            duplicate_ids,
        })
    }

    /// Look up one project by id, with README and remote URL.
    ///
    /// When several directories share the id, the first by name wins.
    pub async fn project(&self, id: &str) -> Result<Option<ProjectDetails>, ScanError> {
        let now = Utc::now();
        let report = scanner::scan_path_at(
            self.root(),
            &self.settings.scan_config(),
            Arc::clone(&self.tags),
            now,
        )
        .await?;

        let Some(record) = report.projects().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };

        let Some(record) = git::enrich_at(vec![record], Arc::clone(&self.git), 1, now)
            .await
            .pop()
        else {
            return Ok(None);
        };

        let readme = read_readme(&record.path).await;
        let remote_url = match git::remote_url(self.git.as_ref(), &record.path).await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(project = %record.id, reason = %e, "no remote url");
                None
            }
        };

        Ok(Some(ProjectDetails {
            record,
            readme,
            remote_url,
        }))
    }
}

/// Sort by `key`, breaking ties by name then path
pub fn sort_records(records: &mut [ProjectRecord], key: SortKey, reverse: bool) {
    records.sort_by(|a, b| {
        let primary = match key {
            SortKey::Modified => b.last_modified.cmp(&a.last_modified),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Status => a.status.rank().cmp(&b.status.rank()),
        };
        let primary = if reverse { primary.reverse() } else { primary };
        primary
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.path.cmp(&b.path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::git::{LastCommit, Remote, WorkingTree};
    use crate::tags::MemoryTagStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use filetime::FileTime;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Treats directories containing a `.git` directory as clean repositories
    /// committed `commit_age` ago, with an `origin` remote
    struct MarkerGit {
        now: DateTime<Utc>,
        commit_age: Duration,
    }

    #[async_trait]
    impl RepoIntrospector for MarkerGit {
        async fn is_repository(&self, path: &Path) -> bool {
            path.join(".git").is_dir()
        }

        async fn working_tree(&self, _path: &Path) -> Result<WorkingTree, RepoError> {
            Ok(WorkingTree {
                branch: "main".into(),
                ..WorkingTree::default()
            })
        }

        async fn last_commit(&self, _path: &Path) -> Result<Option<LastCommit>, RepoError> {
            Ok(Some(LastCommit {
                at: self.now - self.commit_age,
                message: "init".into(),
            }))
        }

        async fn remotes(&self, _path: &Path) -> Result<Vec<Remote>, RepoError> {
            Ok(vec![Remote {
                name: "origin".into(),
                url: "git@github.com:example/site.git".into(),
            }])
        }
    }

    fn set_age(path: &Path, now: DateTime<Utc>, age: Duration) {
        let t = now - age;
        filetime::set_file_mtime(path, FileTime::from_unix_time(t.timestamp(), 0)).unwrap();
    }

    /// alpha: fresh Cargo project; beta: old npm project; site: repo with a
    /// commit 40 days ago; notes: no indicators
    fn fixture(now: DateTime<Utc>) -> TempDir {
        let root = TempDir::new().unwrap();
        let mk = |name: &str, files: &[(&str, &str)], age: Duration| {
            let dir = root.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            for (file, body) in files {
                if file.ends_with('/') {
                    std::fs::create_dir(dir.join(file.trim_end_matches('/'))).unwrap();
                } else {
                    std::fs::write(dir.join(file), body).unwrap();
                }
            }
            set_age(&dir, now, age);
        };
        mk(
            "alpha",
            &[(
                "Cargo.toml",
                "[package]\nname = \"alpha\"\ndescription = \"Rusty tool\"\n",
            )],
            Duration::days(1),
        );
        mk(
            "beta",
            &[("package.json", r#"{"description": "Web frontend"}"#)],
            Duration::days(60),
        );
        mk(
            "site",
            &[(".git/", ""), ("README.md", "# Site\n")],
            Duration::days(2),
        );
        mk("notes", &[("todo.txt", "x")], Duration::days(3));
        root
    }

    fn portfolio(root: &Path, now: DateTime<Utc>, tags: MemoryTagStore) -> Portfolio {
        let settings = Settings {
            projects_path: root.to_path_buf(),
            data_dir: PathBuf::from("unused"),
            ..Settings::default()
        };
        Portfolio::new(
            settings,
            Arc::new(tags),
            Arc::new(MarkerGit {
                now,
                commit_age: Duration::days(40),
            }),
        )
    }

    #[tokio::test]
    async fn test_list_default_order_and_statuses() {
        let now = Utc::now();
        let root = fixture(now);
        let portfolio = portfolio(root.path(), now, MemoryTagStore::new());

        let list = portfolio
            .list_at(&ProjectQuery::default(), now)
            .await
            .unwrap();
        let names: Vec<&str> = list.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "site", "notes", "beta"]);
        assert_eq!(list.total, 4);
        assert!(list.errors.is_empty());

        let status_of = |name: &str| {
            let record = list.projects.iter().find(|p| p.name == name);
            record.unwrap().status
        };
        assert_eq!(status_of("alpha"), Status::Active);
        assert_eq!(status_of("beta"), Status::Stale);
        // Last commit wins over the fresh directory mtime
        assert_eq!(status_of("site"), Status::Stale);
        assert_eq!(status_of("notes"), Status::Unknown);

        let counts = StatusCounts::of(&list.projects);
        assert_eq!(counts.stale, 2);
        assert_eq!(counts.total(), 4);
    }

    #[tokio::test]
    async fn test_skip_git_keeps_filesystem_status() {
        let now = Utc::now();
        let root = fixture(now);
        let portfolio = portfolio(root.path(), now, MemoryTagStore::new());

        let query = ProjectQuery {
            skip_git: true,
            ..ProjectQuery::default()
        };
        let list = portfolio.list_at(&query, now).await.unwrap();
        let site = list.projects.iter().find(|p| p.name == "site").unwrap();
        assert!(site.repo.is_none());
        assert_eq!(site.status, Status::Active);
    }

    #[tokio::test]
    async fn test_filters() {
        let now = Utc::now();
        let root = fixture(now);
        let mut map = crate::tags::TagMap::new();
        map.insert("beta".into(), vec!["Client".into()]);
        let portfolio = portfolio(root.path(), now, MemoryTagStore::with_tags(map));

        let by_status = ProjectQuery {
            status: Some(Status::Stale),
            sort: SortKey::Name,
            ..ProjectQuery::default()
        };
        let list = portfolio.list_at(&by_status, now).await.unwrap();
        let names: Vec<&str> = list.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "site"]);
        assert_eq!(list.total, 4);

        let by_tag = ProjectQuery {
            tag: Some("client".into()),
            ..ProjectQuery::default()
        };
        let list = portfolio.list_at(&by_tag, now).await.unwrap();
        assert_eq!(list.projects.len(), 1);
        assert_eq!(list.projects[0].id, "beta");

        let by_text = ProjectQuery {
            search: Some("RUSTY".into()),
            ..ProjectQuery::default()
        };
        let list = portfolio.list_at(&by_text, now).await.unwrap();
        assert_eq!(list.projects.len(), 1);
        assert_eq!(list.projects[0].id, "alpha");
    }

    #[tokio::test]
    async fn test_sort_by_status_reversed() {
        let now = Utc::now();
        let root = fixture(now);
        let portfolio = portfolio(root.path(), now, MemoryTagStore::new());

        let query = ProjectQuery {
            sort: SortKey::Status,
            reverse: true,
            ..ProjectQuery::default()
        };
        let list = portfolio.list_at(&query, now).await.unwrap();
        let names: Vec<&str> = list.projects.iter().map(|p| p.name.as_str()).collect();
        // unknown, then the two stale by name, then active
        assert_eq!(names, vec!["notes", "beta", "site", "alpha"]);
    }

    #[tokio::test]
    async fn test_project_details() {
        let now = Utc::now();
        let root = fixture(now);
        let portfolio = portfolio(root.path(), now, MemoryTagStore::new());

        let details = portfolio.project("site").await.unwrap().unwrap();
        assert!(details.record.is_repository());
        assert_eq!(details.readme.as_deref(), Some("# Site\n"));
        assert_eq!(
            details.remote_url.as_deref(),
            Some("https://github.com/example/site")
        );

        let alpha = portfolio.project("alpha").await.unwrap().unwrap();
        assert_eq!(alpha.remote_url, None);
        assert_eq!(alpha.record.description.as_deref(), Some("Rusty tool"));

        assert!(portfolio.project("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_root_is_root_level_error() {
        let now = Utc::now();
        let root = TempDir::new().unwrap();
        let gone = root.path().join("gone");
        let portfolio = portfolio(&gone, now, MemoryTagStore::new());
        let err = portfolio.list(&ProjectQuery::default()).await.unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }
}
