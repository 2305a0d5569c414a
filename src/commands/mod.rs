// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod open;
pub mod scan;
pub mod show;
pub mod tag;

use crate::config::Settings;
use crate::portfolio::Portfolio;
use crate::tags::JsonTagStore;
use crate::types::Status;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::sync::Arc;

/// Output switches shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print machine-readable JSON instead of text
    pub json: bool,
    /// Use ANSI colors in text output
    pub color: bool,
    /// Suppress informational lines
    pub quiet: bool,
}

impl Output {
    /// Pretty JSON on stdout
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{text}");
        Ok(())
    }

    /// Status padded to a fixed width, colored when enabled
    #[must_use]
    pub fn status(&self, status: Status) -> String {
        let padded = format!("{:<7}", status.as_str());
        if !self.color {
            return padded;
        }
        match status {
            Status::Active => padded.green().to_string(),
            Status::Stale => padded.yellow().to_string(),
            Status::Clean => padded.blue().to_string(),
            Status::Dirty => padded.red().to_string(),
            Status::Unknown => padded.dimmed().to_string(),
        }
    }

    /// Emphasized text
    #[must_use]
    pub fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// De-emphasized text
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Warning line on stderr
    pub fn warn(&self, message: &str) {
        if self.color {
            eprintln!("{} {message}", "warning:".yellow().bold());
        } else {
            eprintln!("warning: {message}");
        }
    }
}

/// Tag store under the configured data directory
#[must_use]
pub fn tag_store(settings: &Settings) -> JsonTagStore {
    JsonTagStore::in_dir(&settings.data_dir)
}

/// Portfolio wired to the JSON tag store and the git binary
#[must_use]
pub fn portfolio(settings: Settings) -> Portfolio {
    let tags = Arc::new(tag_store(&settings));
    let git = Arc::new(settings.git());
    Portfolio::new(settings, tags, git)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_is_padded() {
        let out = Output::default();
        assert_eq!(out.status(Status::Dirty), "dirty  ");
        assert_eq!(out.status(Status::Unknown), "unknown");
    }

    #[test]
    fn test_colored_status_keeps_text() {
        let out = Output {
            color: true,
            ..Output::default()
        };
        let painted = out.status(Status::Active);
        assert!(painted.contains("active"));
        assert!(painted.starts_with('\u{1b}'));
    }
}
