// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Open projects in external tools
//!
//! Every call reports an outcome value; failures to find or spawn a program
//! are never raised as errors.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Editor used when none is configured
pub const DEFAULT_EDITOR: &str = "code";

/// Result of a launch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    /// Whether the program was started
    pub success: bool,
    /// Human-readable description of what happened
    pub message: String,
}

impl LaunchOutcome {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// A program invocation: executable, arguments, optional working directory
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<String>,
}

impl Invocation {
    /// Split a user command line such as `code --new-window`
    fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            cwd: None,
        })
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Launches file managers, terminals, editors and browsers
#[derive(Debug, Clone)]
pub struct Launcher {
    editor: String,
    terminal: Option<String>,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(DEFAULT_EDITOR, None)
    }
}

impl Launcher {
    /// Launcher with an editor command and an optional terminal command
    #[must_use]
    pub fn new(editor: impl Into<String>, terminal: Option<String>) -> Self {
        Self {
            editor: editor.into(),
            terminal: terminal.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Reveal `path` in the platform file manager
    #[must_use]
    pub fn open_in_file_manager(&self, path: &Path) -> LaunchOutcome {
        let target = path.display().to_string();
        let Some(inv) = Invocation::from_command_line(system_opener()) else {
            return LaunchOutcome::failed("no file manager available".into());
        };
        let message = format!("Opened {target} in file manager");
        launch(&inv.arg(target), &message)
    }

    /// Open a terminal whose working directory is `path`
    #[must_use]
    pub fn open_in_terminal(&self, path: &Path) -> LaunchOutcome {
        let target = path.display().to_string();
        let inv = match &self.terminal {
            Some(command) => {
                Invocation::from_command_line(command).map(|inv| inv.cwd(target.clone()))
            }
            None => default_terminal(&target),
        };
        let Some(inv) = inv else {
            return LaunchOutcome::failed("no terminal configured".into());
        };
        launch(&inv, &format!("Opened {target} in terminal"))
    }

    /// Open `path` in the configured editor
    #[must_use]
    pub fn open_in_editor(&self, path: &Path) -> LaunchOutcome {
        let target = path.display().to_string();
        let Some(inv) = Invocation::from_command_line(&self.editor) else {
            return LaunchOutcome::failed("no editor configured".into());
        };
        let label = inv.program.clone();
        let message = format!("Opened {target} in {label}");
        launch(&inv.arg(target), &message)
    }

    /// Open `url` in the default browser
    #[must_use]
    pub fn open_url(&self, url: &str) -> LaunchOutcome {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return LaunchOutcome::failed(format!("refusing to open non-web URL: {url}"));
        }
        let Some(inv) = Invocation::from_command_line(system_opener()) else {
            return LaunchOutcome::failed("no browser opener available".into());
        };
        launch(&inv.arg(url), &format!("Opened {url} in browser"))
    }
}

fn system_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

fn default_terminal(target: &str) -> Option<Invocation> {
    let inv = if cfg!(target_os = "macos") {
        Invocation::from_command_line("open -a Terminal")?.arg(target)
    } else if cfg!(windows) {
        Invocation::from_command_line("cmd /C start cmd /K")?.cwd(target)
    } else {
        Invocation::from_command_line("x-terminal-emulator")?.cwd(target)
    };
    Some(inv)
}

/// Spawn without waiting; the child outlives this call
fn launch(inv: &Invocation, success_message: &str) -> LaunchOutcome {
    if which::which(&inv.program).is_err() {
        warn!(program = %inv.program, "launch target not found");
        return LaunchOutcome::failed(format!("{} is not installed or not on PATH", inv.program));
    }

    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = &inv.cwd {
        cmd.current_dir(dir);
    }

    match cmd.spawn() {
        Ok(child) => {
            debug!(program = %inv.program, pid = child.id(), "launched");
            LaunchOutcome::ok(success_message.to_string())
        }
        Err(e) => LaunchOutcome::failed(format!("Failed to launch {}: {e}", inv.program)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_from_command_line() {
        let inv = Invocation::from_command_line("code --new-window").unwrap();
        assert_eq!(inv.program, "code");
        assert_eq!(inv.args, vec!["--new-window"]);
        assert!(Invocation::from_command_line("   ").is_none());
    }

    #[test]
    fn test_missing_editor_reports_failure() {
        let launcher = Launcher::new("definitely-not-an-editor-4f1c", None);
        let outcome = launcher.open_in_editor(Path::new("/tmp"));
        assert!(!outcome.success);
        assert!(outcome.message.contains("definitely-not-an-editor-4f1c"));
    }

    #[test]
    fn test_blank_editor_reports_failure() {
        let outcome = Launcher::new("", None).open_in_editor(Path::new("/tmp"));
        assert!(!outcome.success);
    }

    #[test]
    fn test_non_web_url_rejected() {
        let outcome = Launcher::default().open_url("file:///etc/passwd");
        assert!(!outcome.success);
        assert!(outcome.message.contains("non-web"));
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_programs_are_spawned() {
        let dir = tempfile::TempDir::new().unwrap();
        let launcher = Launcher::new("true", Some("true".into()));

        let outcome = launcher.open_in_editor(dir.path());
        assert!(outcome.success, "{}", outcome.message);
        assert!(outcome.message.contains("in true"));

        let outcome = launcher.open_in_terminal(dir.path());
        assert!(outcome.success, "{}", outcome.message);
    }
}
