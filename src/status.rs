// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Status classification
//!
//! A strict priority chain: no repository falls back to mtime recency,
//! a dirty repository is always `dirty`, a clean repository is judged by its
//! last commit (or mtime when it has none).

use crate::types::{RepoInfo, Status};
use chrono::{DateTime, Duration, Utc};

/// At or below this age a project is active (inclusive)
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Strictly above this age a project is stale
pub const STALE_AFTER_DAYS: i64 = 30;

/// Recency bucket for a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recency {
    Recent,
    Middle,
    Old,
}

fn recency(reference: DateTime<Utc>, now: DateTime<Utc>) -> Recency {
    let age = now.signed_duration_since(reference);
    if age <= Duration::days(ACTIVE_WINDOW_DAYS) {
        Recency::Recent
    } else if age > Duration::days(STALE_AFTER_DAYS) {
        Recency::Old
    } else {
        Recency::Middle
    }
}

/// Classify a project from its git state and mtime, relative to `now`.
#[must_use]
pub fn classify(
    repo: Option<&RepoInfo>,
    last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Status {
    match repo {
        None => match recency(last_modified, now) {
            Recency::Recent => Status::Active,
            Recency::Old => Status::Stale,
            Recency::Middle => Status::Unknown,
        },
        Some(info) if info.is_dirty => Status::Dirty,
        Some(info) => {
            let reference = info.last_commit_at.unwrap_or(last_modified);
            match recency(reference, now) {
                Recency::Recent => Status::Active,
                Recency::Old => Status::Stale,
                Recency::Middle => Status::Clean,
            }
        }
    }
}
