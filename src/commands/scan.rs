// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan command - lists projects under the root with their status

use super::{portfolio, Output};
use crate::config::Settings;
use crate::portfolio::{ProjectList, ProjectQuery, StatusCounts};
use crate::types::{ProjectRecord, Status};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Run the scan command
pub async fn run(
    mut settings: Settings,
    path: Option<PathBuf>,
    include_hidden: bool,
    query: ProjectQuery,
    out: Output,
) -> Result<()> {
    if let Some(path) = path {
        settings.projects_path = path;
    }
    settings.include_hidden |= include_hidden;
    let root = settings.projects_path.clone();
    info!(root = %root.display(), "scan requested");

    let list = portfolio(settings)
        .list(&query)
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    for error in &list.errors {
        out.warn(&format!("{}: {}", error.path.display(), error.message));
    }
    for id in &list.duplicate_ids {
        out.warn(&format!("id '{id}' is shared by several directories"));
    }

    if out.json {
        return out.json(&list);
    }

    print_list(&list, &root, out);
    Ok(())
}

fn print_list(list: &ProjectList, root: &std::path::Path, out: Output) {
    if list.total == 0 {
        println!("No projects found in {}", root.display());
        return;
    }

    if !out.quiet {
        if list.projects.len() == list.total {
            println!("Found {} projects in {}:", list.total, root.display());
        } else {
            println!(
                "Found {} projects in {} ({} shown):",
                list.total,
                root.display(),
                list.projects.len()
            );
        }
        println!();
    }

    let width = list
        .projects
        .iter()
        .map(|p| p.id.len())
        .max()
        .unwrap_or(0)
        .min(32);

    for project in &list.projects {
        println!("{}", project_line(project, width, out));
    }

    if !out.quiet && !list.projects.is_empty() {
        println!();
        println!("{}", summary(&StatusCounts::of(&list.projects)));
    }
}

fn project_line(project: &ProjectRecord, width: usize, out: Output) -> String {
    let mut line = format!(
        "  {} {}",
        out.bold(&format!("{:<width$}", project.id)),
        out.status(project.status)
    );

    if let Some(repo) = &project.repo {
        let mut branch = repo.branch.clone();
        if repo.is_dirty {
            branch.push('*');
        }
        if repo.ahead_by > 0 {
            branch.push_str(&format!(" +{}", repo.ahead_by));
        }
        if repo.behind_by > 0 {
            branch.push_str(&format!(" -{}", repo.behind_by));
        }
        line.push_str(&format!("  [{branch}]"));
    }

    if let Some(description) = &project.description {
        line.push_str(&format!("  {description}"));
    }

    if !project.tags.is_empty() {
        line.push_str(&format!("  {}", out.dim(&format!("#{}", project.tags.join(" #")))));
    }

    line
}

fn summary(counts: &StatusCounts) -> String {
    Status::ALL
        .iter()
        .filter(|s| counts.get(**s) > 0)
        .map(|s| format!("{} {}", counts.get(*s), s))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepoInfo, TechStack};
    use chrono::Utc;

    fn record() -> ProjectRecord {
        ProjectRecord {
            id: "my-app".into(),
            name: "My App".into(),
            path: PathBuf::from("/p/My App"),
            description: Some("Shop frontend".into()),
            last_modified: Utc::now(),
            has_manifest: true,
            has_readme: false,
            tech_stack: TechStack::default(),
            tags: vec!["client".into(), "web".into()],
            status: Status::Dirty,
            repo: Some(RepoInfo {
                branch: "main".into(),
                is_dirty: true,
                uncommitted_changes: 2,
                ahead_by: 1,
                behind_by: 0,
                last_commit_at: None,
                last_commit_message: None,
            }),
        }
    }

    #[test]
    fn test_project_line_plain() {
        let line = project_line(&record(), 8, Output::default());
        assert_eq!(
            line,
            "  my-app   dirty    [main* +1]  Shop frontend  #client #web"
        );
    }

    #[test]
    fn test_summary_skips_empty_statuses() {
        let counts = StatusCounts {
            active: 2,
            dirty: 1,
            ..StatusCounts::default()
        };
        assert_eq!(summary(&counts), "2 active, 1 dirty");
    }
}
