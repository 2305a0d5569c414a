// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Projdeck CLI - a deck of your local projects

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use projdeck::commands::{self, open::OpenTarget, tag::TagAction, Output};
use projdeck::config;
use projdeck::portfolio::{ProjectQuery, SortKey};
use projdeck::types::Status;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "projdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "PROJDECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override (tag storage)
    #[arg(long, env = "PROJDECK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Projects directory override
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the projects directory and list projects with their status
    Scan {
        /// Directory to scan (defaults to the configured projects path)
        path: Option<PathBuf>,

        /// Include directories whose name starts with a dot
        #[arg(long)]
        include_hidden: bool,

        /// Skip git status lookups
        #[arg(long)]
        no_git: bool,

        /// Only show projects with this status
        #[arg(long)]
        status: Option<Status>,

        /// Only show projects with this tag
        #[arg(long)]
        tag: Option<String>,

        /// Only show projects whose name, description, tags or stack contain this text
        #[arg(long)]
        search: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = SortKey::Modified)]
        sort: SortKey,

        /// Reverse the sort order
        #[arg(long)]
        reverse: bool,
    },

    /// Show one project with its README and remote
    Show {
        /// Project id
        id: String,
    },

    /// Manage project tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Open a project in an external tool
    Open {
        /// Project id
        id: String,

        /// Tool to open the project with
        #[arg(long = "with", value_enum, default_value_t = OpenTarget::Editor)]
        with: OpenTarget,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (omit to print all)
        key: Option<String>,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let out = Output {
        json: cli.json,
        color: !cli.no_color,
        quiet: cli.quiet,
    };

    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(root) = cli.root {
        settings.projects_path = root;
    }

    match cli.command {
        Commands::Scan {
            path,
            include_hidden,
            no_git,
            status,
            tag,
            search,
            sort,
            reverse,
        } => {
            let query = ProjectQuery {
                status,
                tag,
                search,
                sort,
                reverse,
                skip_git: no_git,
            };
            commands::scan::run(settings, path, include_hidden, query, out).await
        }
        Commands::Show { id } => commands::show::run(settings, &id, out).await,
        Commands::Tag { action } => commands::tag::run(&settings, action, out).await,
        Commands::Open { id, with } => commands::open::run(settings, &id, with, out).await,
        Commands::Config { key, value } => commands::config::run(
            settings,
            cli.config.as_deref(),
            key.as_deref(),
            value.as_deref(),
            out,
        ),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
