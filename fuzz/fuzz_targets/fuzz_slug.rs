// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use projdeck::id::slug;

fuzz_target!(|name: &str| {
    let id = slug(name);
    assert_eq!(slug(&id), id);
    assert!(!id.starts_with('-') && !id.ends_with('-'));
    assert!(!id.contains("--"));
});
