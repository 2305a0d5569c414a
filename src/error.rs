// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Typed errors for the scan, git and tag layers
//!
//! Nothing in the library panics or returns `anyhow` across its public
//! boundary; the CLI wraps these with context.

use std::path::PathBuf;

/// Root-level failure: the whole scan is invalid, no records are produced
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Root path does not exist
    #[error("projects path does not exist: {path}")]
    NotFound {
        /// Requested root
        path: PathBuf,
    },
    /// Root path exists but is not a directory
    #[error("projects path is not a directory: {path}")]
    NotADirectory {
        /// Requested root
        path: PathBuf,
    },
    /// Root could not be listed
    #[error("failed to read projects path {path}: {source}")]
    Unreadable {
        /// Requested root
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// A user exclude pattern is not a valid glob
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        /// Offending pattern
        pattern: String,
        /// Glob compile error
        #[source]
        source: globset::Error,
    },
}

/// Repository introspection failure, returned as a value and never thrown
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The directory is not the root of a git repository
    #[error("{path} is not a git repository")]
    NotARepository {
        /// Inspected directory
        path: PathBuf,
    },
    /// The repository has no remotes configured
    #[error("no remote configured for {path}")]
    NoRemote {
        /// Inspected directory
        path: PathBuf,
    },
    /// The git binary could not be spawned
    #[error("failed to execute `{operation}`: {source}")]
    CommandExecution {
        /// Git subcommand being run
        operation: &'static str,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },
    /// Git ran and exited non-zero
    #[error("`{operation}` failed: {stderr}")]
    CommandFailed {
        /// Git subcommand being run
        operation: &'static str,
        /// Trimmed stderr
        stderr: String,
    },
    /// Git output did not have the expected shape
    #[error("unexpected output from `{operation}`: {detail}")]
    Parse {
        /// Git subcommand being run
        operation: &'static str,
        /// What could not be parsed
        detail: String,
    },
}

impl RepoError {
    /// Spawn failure for `operation`
    #[must_use]
    pub fn command_execution(operation: &'static str, source: std::io::Error) -> Self {
        Self::CommandExecution { operation, source }
    }

    /// Non-zero exit for `operation`
    #[must_use]
    pub fn command_failed(operation: &'static str, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            operation,
            stderr: stderr.into().trim().to_string(),
        }
    }

    /// Malformed output for `operation`
    #[must_use]
    pub fn parse(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            operation,
            detail: detail.into(),
        }
    }
}

/// Tag persistence failure
#[derive(Debug, thiserror::Error)]
pub enum TagStoreError {
    /// Reading or writing the backing file failed
    #[error("tag store I/O error at {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The backing file is not a JSON object of string lists
    #[error("tag store at {path} is corrupt: {source}")]
    Parse {
        /// Backing file
        path: PathBuf,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },
    /// Serializing the tag map failed
    #[error("failed to serialize tags: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Injected or backend-specific failure
    #[error("{0}")]
    Backend(String),
}
