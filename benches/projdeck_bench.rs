// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Benchmarks for id derivation, classification and git output parsing

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use projdeck::git::{normalize_remote_url, parse_status_porcelain};
use projdeck::id::slug;
use projdeck::prelude::*;
use projdeck::status::classify;
use std::sync::Arc;

fn bench_slug(c: &mut Criterion) {
    let names = [
        "My App",
        "my_app",
        "Client Site (2024) -- FINAL",
        "über-tool",
        "rust",
    ];
    c.bench_function("slug", |b| {
        b.iter(|| {
            for name in names {
                black_box(slug(black_box(name)));
            }
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let now = Utc::now();
    let repo = RepoInfo {
        branch: "main".into(),
        is_dirty: false,
        uncommitted_changes: 0,
        ahead_by: 0,
        behind_by: 0,
        last_commit_at: Some(now - Duration::days(12)),
        last_commit_message: Some("Fix".into()),
    };
    c.bench_function("classify", |b| {
        b.iter(|| {
            black_box(classify(Some(black_box(&repo)), now - Duration::days(3), now));
            black_box(classify(None, black_box(now - Duration::days(45)), now));
        });
    });
}

fn bench_git_parsing(c: &mut Criterion) {
    let status = "# branch.oid 1f2e3d\n\
                  # branch.head main\n\
                  # branch.upstream origin/main\n\
                  # branch.ab +2 -1\n\
                  1 .M N... 100644 100644 100644 abc abc src/lib.rs\n\
                  ? notes.txt\n";
    c.bench_function("parse_status_porcelain", |b| {
        b.iter(|| black_box(parse_status_porcelain(black_box(status))));
    });
    c.bench_function("normalize_remote_url", |b| {
        b.iter(|| {
            black_box(normalize_remote_url(black_box("git@github.com:owner/repo.git")));
            black_box(normalize_remote_url(black_box("ssh://git@gitlab.com:2222/group/repo.git")));
        });
    });
}

fn bench_scan(c: &mut Criterion) {
    let root = tempfile::TempDir::new().unwrap();
    for i in 0..50 {
        let dir = root.path().join(format!("project-{i}"));
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("package.json"), r#"{"description": "bench"}"#).unwrap();
    }
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let tags: Arc<dyn TagStore> = Arc::new(MemoryTagStore::new());
    let config = ScanConfig::default();

    c.bench_function("scan_50_projects", |b| {
        b.iter(|| {
            runtime
                .block_on(scan_path(root.path(), &config, Arc::clone(&tags)))
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_slug,
    bench_classify,
    bench_git_parsing,
    bench_scan
);
criterion_main!(benches);
