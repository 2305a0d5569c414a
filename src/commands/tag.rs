// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Tag command - edit the labels attached to project ids

use super::{tag_store, Output};
use crate::config::Settings;
use crate::tags::TagStore;
use anyhow::{Context, Result};
use clap::Subcommand;

/// Tag subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum TagAction {
    /// Attach a tag to a project
    Add {
        /// Project id
        id: String,
        /// Tag to add
        tag: String,
    },
    /// Detach a tag from a project
    Remove {
        /// Project id
        id: String,
        /// Tag to remove
        tag: String,
    },
    /// Replace every tag of a project (no tags clears them)
    Set {
        /// Project id
        id: String,
        /// New tags
        tags: Vec<String>,
    },
    /// List tags of one project, or every tag in use
    List {
        /// Project id
        id: Option<String>,
    },
}

/// Run the tag command
pub async fn run(settings: &Settings, action: TagAction, out: Output) -> Result<()> {
    let store = tag_store(settings);
    let location = store.path().display().to_string();

    let (id, tags) = match action {
        TagAction::Add { id, tag } => {
            anyhow::ensure!(!tag.trim().is_empty(), "Tag cannot be empty");
            let tags = store
                .add(&id, &tag)
                .await
                .with_context(|| format!("Failed to update tags in {location}"))?;
            (id, tags)
        }
        TagAction::Remove { id, tag } => {
            let tags = store
                .remove(&id, &tag)
                .await
                .with_context(|| format!("Failed to update tags in {location}"))?;
            (id, tags)
        }
        TagAction::Set { id, tags } => {
            let tags = store
                .set(&id, tags)
                .await
                .with_context(|| format!("Failed to update tags in {location}"))?;
            (id, tags)
        }
        TagAction::List { id: Some(id) } => {
            let tags = store
                .get(&id)
                .await
                .with_context(|| format!("Failed to read tags from {location}"))?;
            (id, tags)
        }
        TagAction::List { id: None } => {
            let all = store
                .unique_tags()
                .await
                .with_context(|| format!("Failed to read tags from {location}"))?;
            if out.json {
                return out.json(&all);
            }
            for tag in all {
                println!("{tag}");
            }
            return Ok(());
        }
    };

    if out.json {
        return out.json(&serde_json::json!({ "id": id, "tags": tags }));
    }
    if tags.is_empty() {
        println!("{}: {}", out.bold(&id), out.dim("(no tags)"));
    } else {
        println!("{}: {}", out.bold(&id), tags.join(", "));
    }
    Ok(())
}
