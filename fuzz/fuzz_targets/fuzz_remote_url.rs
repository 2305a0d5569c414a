// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use projdeck::git::normalize_remote_url;

#[derive(Debug, Arbitrary)]
struct Remote<'a> {
    user: &'a str,
    host: &'a str,
    path: &'a str,
    ssh_scheme: bool,
}

fuzz_target!(|remote: Remote<'_>| {
    let url = if remote.ssh_scheme {
        format!("ssh://{}@{}/{}", remote.user, remote.host, remote.path)
    } else {
        format!("{}@{}:{}", remote.user, remote.host, remote.path)
    };
    let normalized = normalize_remote_url(&url);
    let _ = normalize_remote_url(&normalized);
});
