// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Tech stack detection from marker files and manifest dependencies

use crate::types::TechStack;
use std::collections::HashSet;
use std::path::Path;

/// npm dependency name and the framework it implies
const NPM_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("express", "Express"),
];

/// Files scanned for Python framework names
const PYTHON_FILES: &[&str] = &["requirements.txt", "setup.py", "pyproject.toml"];

/// Substring in Python dependency files and the framework it implies
const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
];

fn push(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Detect languages, frameworks and tools used in `dir`.
///
/// Unparseable manifests only lose their framework hints; failing to list the
/// directory is an error.
pub async fn detect_tech_stack(dir: &Path) -> std::io::Result<TechStack> {
    let mut files = HashSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.is_ok_and(|ft| ft.is_file()) {
            files.insert(entry.file_name().to_string_lossy().to_string());
        }
    }
    let has = |name: &str| files.contains(name);

    let mut stack = TechStack::default();

    if has("package.json") {
        push(&mut stack.languages, "JavaScript");
        if let Ok(content) = tokio::fs::read_to_string(dir.join("package.json")).await {
            npm_hints(&content, &mut stack);
        }
    }

    if PYTHON_FILES.iter().any(|f| has(f)) {
        push(&mut stack.languages, "Python");
        let mut content = String::new();
        for file in PYTHON_FILES.iter().filter(|f| has(f)) {
            if let Ok(text) = tokio::fs::read_to_string(dir.join(file)).await {
                content.push_str(&text.to_lowercase());
                content.push('\n');
            }
        }
        for (needle, framework) in PYTHON_FRAMEWORKS {
            if content.contains(needle) {
                push(&mut stack.frameworks, framework);
            }
        }
    }

    if has("Cargo.toml") {
        push(&mut stack.languages, "Rust");
    }
    if has("go.mod") {
        push(&mut stack.languages, "Go");
    }
    if has("pom.xml") || has("build.gradle") {
        push(&mut stack.languages, "Java");
    }
    if has("Gemfile") {
        push(&mut stack.languages, "Ruby");
        if tokio::fs::try_exists(dir.join("config").join("application.rb"))
            .await
            .unwrap_or(false)
        {
            push(&mut stack.frameworks, "Rails");
        }
    }
    if files.iter().any(|f| f.ends_with(".csproj")) {
        push(&mut stack.languages, "C#");
        push(&mut stack.frameworks, ".NET");
    }

    if has("Dockerfile") {
        push(&mut stack.tools, "Docker");
    }
    if has("docker-compose.yml") || has("docker-compose.yaml") {
        push(&mut stack.tools, "Docker Compose");
    }

    Ok(stack)
}

/// Frameworks and TypeScript from `dependencies` and `devDependencies`
fn npm_hints(content: &str, stack: &mut TechStack) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else {
        return;
    };
    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| value.get(section).and_then(|deps| deps.get(name)).is_some())
    };

    for (dep, framework) in NPM_FRAMEWORKS {
        if has_dep(dep) {
            push(&mut stack.frameworks, framework);
        }
    }
    if has_dep("typescript") {
        push(&mut stack.languages, "TypeScript");
    }
}
