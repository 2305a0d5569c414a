// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository status enrichment
//!
//! Repository detection opens the directory with gitoxide so that a project
//! sitting inside an unrelated parent repository is not mistaken for one.
//! Working-tree status, HEAD and remotes come from the `git` binary's
//! porcelain output.

use crate::error::RepoError;
use crate::status::classify;
use crate::types::{ProjectRecord, RepoInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Working-tree state as reported by `git status`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTree {
    /// Current branch, "HEAD" when detached
    pub branch: String,
    /// Changed, staged, conflicted or untracked paths
    pub changed_files: usize,
    /// Commits ahead of upstream (0 without upstream)
    pub ahead_by: usize,
    /// Commits behind upstream (0 without upstream)
    pub behind_by: usize,
}

/// HEAD commit metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCommit {
    /// Committer timestamp
    pub at: DateTime<Utc>,
    /// Full message, trimmed
    pub message: String,
}

/// A configured remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Remote name, e.g. `origin`
    pub name: String,
    /// Fetch URL as configured
    pub url: String,
}

/// Read-only view of a repository. Every failure is a [`RepoError`] value.
#[async_trait]
pub trait RepoIntrospector: Send + Sync {
    /// Whether `path` is itself the root of a repository
    async fn is_repository(&self, path: &Path) -> bool;

    /// Branch, dirtiness and upstream divergence
    async fn working_tree(&self, path: &Path) -> Result<WorkingTree, RepoError>;

    /// HEAD commit, `None` for a repository without commits
    async fn last_commit(&self, path: &Path) -> Result<Option<LastCommit>, RepoError>;

    /// Configured remotes in `git remote` order
    async fn remotes(&self, path: &Path) -> Result<Vec<Remote>, RepoError>;
}

// =============================================================================
// git binary backend
// =============================================================================

/// Seconds a git invocation may run before it is killed
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 10;

/// Introspection through the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS),
        }
    }
}

impl GitCli {
    /// Backend using `git` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-command time limit
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-command time limit in effect
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(
        &self,
        path: &Path,
        operation: &'static str,
        args: &[&str],
    ) -> Result<Output, RepoError> {
        let mut cmd = Command::new("git");
        cmd.arg("--no-optional-locks")
            .arg("-C")
            .arg(path)
            .args(args)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(RepoError::command_execution(operation, e)),
            Err(_) => Err(RepoError::command_failed(
                operation,
                format!("timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }

    async fn run_checked(
        &self,
        path: &Path,
        operation: &'static str,
        args: &[&str],
    ) -> Result<String, RepoError> {
        let output = self.run(path, operation, args).await?;
        if !output.status.success() {
            return Err(RepoError::command_failed(
                operation,
                String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RepoIntrospector for GitCli {
    async fn is_repository(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || gix::open(path).is_ok())
            .await
            .unwrap_or(false)
    }

    async fn working_tree(&self, path: &Path) -> Result<WorkingTree, RepoError> {
        let stdout = self
            .run_checked(
                path,
                "git status",
                &["status", "--porcelain=v2", "--branch"],
            )
            .await?;
        parse_status_porcelain(&stdout)
    }

    async fn last_commit(&self, path: &Path) -> Result<Option<LastCommit>, RepoError> {
        let output = self
            .run(path, "git log", &["log", "-1", "--format=%ct%x00%B"])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("does not have any commits")
                || stderr.contains("bad default revision")
            {
                return Ok(None);
            }
            return Err(RepoError::command_failed("git log", stderr));
        }

        parse_last_commit(&String::from_utf8_lossy(&output.stdout))
    }

    async fn remotes(&self, path: &Path) -> Result<Vec<Remote>, RepoError> {
        let stdout = self
            .run_checked(path, "git remote", &["remote", "-v"])
            .await?;
        Ok(parse_remotes(&stdout))
    }
}

/// Parse `git status --porcelain=v2 --branch`
pub fn parse_status_porcelain(stdout: &str) -> Result<WorkingTree, RepoError> {
    let mut branch = None;
    let mut ahead_by = 0;
    let mut behind_by = 0;
    let mut changed_files = 0;

    for line in stdout.lines() {
        if let Some(header) = line.strip_prefix("# ") {
            if let Some(head) = header.strip_prefix("branch.head ") {
                branch = Some(if head == "(detached)" { "HEAD" } else { head }.to_string());
            } else if let Some(ab) = header.strip_prefix("branch.ab ") {
                let (ahead, behind) = parse_ahead_behind(ab).ok_or_else(|| {
                    RepoError::parse("git status", format!("bad branch.ab line: {ab}"))
                })?;
                ahead_by = ahead;
                behind_by = behind;
            }
        } else if !line.is_empty() && !line.starts_with('!') {
            changed_files += 1;
        }
    }

    let branch =
        branch.ok_or_else(|| RepoError::parse("git status", "missing branch.head header"))?;
    Ok(WorkingTree {
        branch,
        changed_files,
        ahead_by,
        behind_by,
    })
}

fn parse_ahead_behind(ab: &str) -> Option<(usize, usize)> {
    let mut parts = ab.split_whitespace();
    let ahead = parts.next()?.strip_prefix('+')?.parse().ok()?;
    let behind = parts.next()?.strip_prefix('-')?.parse().ok()?;
    Some((ahead, behind))
}

/// Parse `git log -1 --format=%ct%x00%B`
fn parse_last_commit(stdout: &str) -> Result<Option<LastCommit>, RepoError> {
    if stdout.trim().is_empty() {
        return Ok(None);
    }
    let (secs, message) = stdout
        .split_once('\0')
        .ok_or_else(|| RepoError::parse("git log", "missing separator"))?;
    let secs: i64 = secs
        .trim()
        .parse()
        .map_err(|_| RepoError::parse("git log", format!("bad timestamp: {secs}")))?;
    let at = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| RepoError::parse("git log", format!("timestamp out of range: {secs}")))?;

    Ok(Some(LastCommit {
        at,
        message: message.trim().to_string(),
    }))
}

/// Parse `git remote -v`, keeping fetch URLs in first-seen order
fn parse_remotes(stdout: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if parts.next() == Some("(push)") || remotes.iter().any(|r| r.name == name) {
            continue;
        }
        remotes.push(Remote {
            name: name.to_string(),
            url: url.to_string(),
        });
    }
    remotes
}

// =============================================================================
// Operations
// =============================================================================

/// Full repository status for `path`.
///
/// Detection runs first; working tree and HEAD are then read concurrently.
pub async fn repo_status(git: &dyn RepoIntrospector, path: &Path) -> Result<RepoInfo, RepoError> {
    if !git.is_repository(path).await {
        return Err(RepoError::NotARepository {
            path: path.to_path_buf(),
        });
    }

    let (tree, commit) = tokio::join!(git.working_tree(path), git.last_commit(path));
    let tree = tree?;
    let commit = commit?;

    Ok(RepoInfo {
        branch: tree.branch,
        is_dirty: tree.changed_files > 0,
        uncommitted_changes: tree.changed_files,
        ahead_by: tree.ahead_by,
        behind_by: tree.behind_by,
        last_commit_at: commit.as_ref().map(|c| c.at),
        last_commit_message: commit.map(|c| c.message),
    })
}

/// Browser-friendly URL of `origin`, or of the first remote without one
pub async fn remote_url(git: &dyn RepoIntrospector, path: &Path) -> Result<String, RepoError> {
    if !git.is_repository(path).await {
        return Err(RepoError::NotARepository {
            path: path.to_path_buf(),
        });
    }

    let remotes = git.remotes(path).await?;
    let remote = remotes
        .iter()
        .find(|r| r.name == "origin")
        .or_else(|| remotes.first())
        .ok_or_else(|| RepoError::NoRemote {
            path: path.to_path_buf(),
        })?;

    Ok(normalize_remote_url(&remote.url))
}

/// Rewrite SSH-style remotes as HTTPS and drop a trailing `.git`.
///
/// `git@github.com:owner/repo.git` and `ssh://git@github.com/owner/repo.git`
/// both become `https://github.com/owner/repo`.
#[must_use]
pub fn normalize_remote_url(url: &str) -> String {
    let url = url.trim();

    let rewritten = if let Some(rest) = url.strip_prefix("ssh://") {
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = host.split_once(':').map_or(host, |(h, _)| h);
        format!("https://{host}/{path}")
    } else if let Some((host, path)) = scp_like(url) {
        format!("https://{host}/{}", path.trim_start_matches('/'))
    } else {
        url.to_string()
    };

    let trimmed = rewritten.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

/// Split `user@host:path` into host and path
fn scp_like(url: &str) -> Option<(&str, &str)> {
    if url.contains("://") {
        return None;
    }
    let (user_host, path) = url.split_once(':')?;
    let (_, host) = user_host.split_once('@')?;
    if host.is_empty() || host.contains('/') || path.is_empty() {
        return None;
    }
    Some((host, path))
}

// =============================================================================
// Enrichment pass
// =============================================================================

/// Attach git state and reclassify, with every record judged against `now`.
///
/// Records whose lookup fails are returned unchanged. Order is preserved.
pub async fn enrich_at(
    mut records: Vec<ProjectRecord>,
    git: Arc<dyn RepoIntrospector>,
    concurrency: usize,
    now: DateTime<Utc>,
) -> Vec<ProjectRecord> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, record) in records.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let git = Arc::clone(&git);
        let path = record.path.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (idx, repo_status(git.as_ref(), &path).await)
        });
    }

    let mut attached = 0usize;
    while let Some(joined) = join_set.join_next().await {
        let (idx, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "git status task aborted");
                continue;
            }
        };
        let record = &mut records[idx];
        match result {
            Ok(info) => {
                record.status = classify(Some(&info), record.last_modified, now);
                record.repo = Some(info);
                attached += 1;
            }
            Err(e) => debug!(project = %record.id, reason = %e, "no git status"),
        }
    }

    info!(
        repositories = attached,
        projects = records.len(),
        "git enrichment complete"
    );
    records
}
