// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use projdeck::git::parse_status_porcelain;

fuzz_target!(|stdout: &str| {
    if let Ok(tree) = parse_status_porcelain(stdout) {
        assert!(tree.changed_files <= stdout.lines().count());
    }
});
