// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Open command - hand a project to an external tool

use super::{portfolio, Output};
use crate::config::Settings;
use crate::launcher::LaunchOutcome;
use anyhow::{Context, Result};
use clap::ValueEnum;

/// Where to open a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpenTarget {
    /// Platform file manager
    Finder,
    /// Terminal in the project directory
    Terminal,
    /// Configured editor
    Editor,
    /// Remote repository page in the browser
    Browser,
}

/// Run the open command
pub async fn run(
    settings: Settings,
    id: &str,
    target: OpenTarget,
    out: Output,
) -> Result<()> {
    let root = settings.projects_path.clone();
    let launcher = settings.launcher();
    let details = portfolio(settings)
        .project(id)
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?
        .with_context(|| format!("No project with id '{id}' in {}", root.display()))?;
    let path = &details.record.path;

    let outcome = match target {
        OpenTarget::Finder => launcher.open_in_file_manager(path),
        OpenTarget::Terminal => launcher.open_in_terminal(path),
        OpenTarget::Editor => launcher.open_in_editor(path),
        OpenTarget::Browser => match &details.remote_url {
            Some(url) => launcher.open_url(url),
            None => LaunchOutcome {
                success: false,
                message: format!("{id} has no remote to open"),
            },
        },
    };

    if out.json {
        out.json(&outcome)?;
    } else if outcome.success && !out.quiet {
        println!("{}", outcome.message);
    }

    anyhow::ensure!(outcome.success, "{}", outcome.message);
    Ok(())
}
