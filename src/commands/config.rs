// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - show, read or persist settings

use super::Output;
use crate::config::{self, Settings, KEYS};
use anyhow::{Context, Result};
use std::path::Path;

/// Run the config command.
///
/// No key prints every setting; a key alone prints its value. Both show the
/// effective values. A key and a value updates only that key in the file at
/// `file` (or the default location).
pub fn run(
    settings: Settings,
    file: Option<&Path>,
    key: Option<&str>,
    value: Option<&str>,
    out: Output,
) -> Result<()> {
    match (key, value) {
        (None, _) => {
            if out.json {
                return out.json(&settings);
            }
            for key in KEYS {
                println!("{key} = {}", settings.get(key).unwrap_or_default());
            }
        }
        (Some(key), None) => {
            let current = settings
                .get(key)
                .with_context(|| format!("Unknown setting: {key}. Valid: {}", KEYS.join(", ")))?;
            if out.json {
                return out.json(&std::collections::BTreeMap::from([(key, current)]));
            }
            println!("{current}");
        }
        (Some(key), Some(value)) => {
            let (written, stored) = config::persist(file, key, value)?;
            tracing::info!(key, file = %written.display(), "setting saved");
            if !out.quiet {
                println!("{key} = {stored} (saved to {})", written.display());
            }
        }
    }
    Ok(())
}
