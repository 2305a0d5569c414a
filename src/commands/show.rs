// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show command - one project with README excerpt and remote

use super::{portfolio, Output};
use crate::config::Settings;
use crate::portfolio::ProjectDetails;
use anyhow::{Context, Result};

/// README lines printed in text mode
const README_EXCERPT_LINES: usize = 15;

/// Run the show command
pub async fn run(settings: Settings, id: &str, out: Output) -> Result<()> {
    let root = settings.projects_path.clone();
    let details = portfolio(settings)
        .project(id)
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?
        .with_context(|| format!("No project with id '{id}' in {}", root.display()))?;

    if out.json {
        return out.json(&details);
    }

    print_details(&details, out);
    Ok(())
}

fn print_details(details: &ProjectDetails, out: Output) {
    let record = &details.record;

    let id = format!("({})", record.id);
    println!("{} {}", out.bold(&record.name), out.dim(&id));
    println!("  path:      {}", record.path.display());
    println!("  status:    {}", out.status(record.status).trim_end());
    let modified = record.last_modified.format("%Y-%m-%d %H:%M UTC");
    println!("  modified:  {modified}");
    if let Some(description) = &record.description {
        println!("  about:     {description}");
    }
    if !record.tech_stack.is_empty() {
        let stack: Vec<&str> = record.tech_stack.iter().collect();
        println!("  stack:     {}", stack.join(", "));
    }
    if !record.tags.is_empty() {
        println!("  tags:      {}", record.tags.join(", "));
    }

    if let Some(repo) = &record.repo {
        println!("  branch:    {}", repo.branch);
        if repo.is_dirty {
            println!("  changes:   {} uncommitted", repo.uncommitted_changes);
        }
        if repo.ahead_by > 0 || repo.behind_by > 0 {
            println!(
                "  upstream:  {} ahead, {} behind",
                repo.ahead_by, repo.behind_by
            );
        }
        match (&repo.last_commit_at, &repo.last_commit_message) {
            (Some(at), Some(message)) => {
                let subject = message.lines().next().unwrap_or_default();
                println!("  commit:    {} {}", at.format("%Y-%m-%d"), subject);
            }
            _ => println!("  commit:    (no commits)"),
        }
    }
    if let Some(url) = &details.remote_url {
        println!("  remote:    {url}");
    }

    if let Some(readme) = &details.readme {
        println!();
        for line in readme.lines().take(README_EXCERPT_LINES) {
            println!("  {}", out.dim(line));
        }
        if readme.lines().count() > README_EXCERPT_LINES {
            println!("  {}", out.dim("..."));
        }
    }
}
