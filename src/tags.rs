// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Tag persistence keyed by project id
//!
//! Tags are the only state that survives a rescan. The store is injected
//! into the scanner so the core never assumes a storage medium.

use crate::error::TagStoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// File name of the JSON store inside the data directory
pub const TAGS_FILE: &str = "project-tags.json";

/// Project id to ordered tag list
pub type TagMap = BTreeMap<String, Vec<String>>;

/// Edit applied atomically to one project's tag list
pub type TagEdit = Box<dyn FnOnce(&mut Vec<String>) + Send>;

/// Key-value tag storage
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Every stored entry. A store that was never written is empty, not an error.
    async fn all(&self) -> Result<TagMap, TagStoreError>;

    /// Atomically read, edit and write back the tags of one project.
    ///
    /// The edited list is trimmed and de-duplicated in order; an empty
    /// result removes the entry. Returns the stored list.
    async fn update(&self, id: &str, edit: TagEdit) -> Result<Vec<String>, TagStoreError>;

    /// Tags for one project, empty when none are stored
    async fn get(&self, id: &str) -> Result<Vec<String>, TagStoreError> {
        Ok(self.all().await?.remove(id).unwrap_or_default())
    }

    /// Replace a project's tags. An empty list removes the entry.
    async fn set(&self, id: &str, tags: Vec<String>) -> Result<Vec<String>, TagStoreError> {
        self.update(id, Box::new(move |current| *current = tags))
            .await
    }

    /// Append a tag unless already present
    async fn add(&self, id: &str, tag: &str) -> Result<Vec<String>, TagStoreError> {
        let tag = tag.trim().to_string();
        self.update(
            id,
            Box::new(move |current| {
                if !current.contains(&tag) {
                    current.push(tag);
                }
            }),
        )
        .await
    }

    /// Remove a tag; the entry disappears with its last tag
    async fn remove(&self, id: &str, tag: &str) -> Result<Vec<String>, TagStoreError> {
        let tag = tag.trim().to_string();
        self.update(id, Box::new(move |current| current.retain(|t| *t != tag)))
            .await
    }

    /// Every distinct tag across projects, sorted
    async fn unique_tags(&self) -> Result<Vec<String>, TagStoreError> {
        let mut tags: Vec<String> = self.all().await?.into_values().flatten().collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }
}

/// Trim, drop blanks and duplicates, keeping first occurrence order
fn normalize(tags: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.drain(..) {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    *tags = seen;
}

/// Apply an edit to `map[id]`, returning the stored list
fn apply_edit(map: &mut TagMap, id: &str, edit: TagEdit) -> Vec<String> {
    let mut current = map.remove(id).unwrap_or_default();
    edit(&mut current);
    normalize(&mut current);
    if !current.is_empty() {
        map.insert(id.to_string(), current.clone());
    }
    current
}

// =============================================================================
// JSON file store
// =============================================================================

/// Tags stored as one pretty-printed JSON object on disk.
///
/// Writes go to a sibling temp file and are renamed into place, so readers
/// never observe a half-written file. Updates within one process are
/// serialized; separate processes remain last-write-wins.
pub struct JsonTagStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonTagStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at [`TAGS_FILE`] inside `data_dir`
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(TAGS_FILE))
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<TagMap, TagStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(TagMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|source| TagStoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TagMap::new()),
            Err(source) => Err(TagStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn write_map(&self, map: &TagMap) -> Result<(), TagStoreError> {
        let io_err = |source: std::io::Error| TagStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(map).map_err(TagStoreError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl TagStore for JsonTagStore {
    async fn all(&self) -> Result<TagMap, TagStoreError> {
        self.read_map().await
    }

    async fn update(&self, id: &str, edit: TagEdit) -> Result<Vec<String>, TagStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let stored = apply_edit(&mut map, id, edit);
        self.write_map(&map).await?;
        debug!(project = id, tags = stored.len(), path = %self.path.display(), "saved tags");
        Ok(stored)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store, for tests and for runs without a data directory
#[derive(Default)]
pub struct MemoryTagStore {
    map: Mutex<TagMap>,
}

impl MemoryTagStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing entries
    #[must_use]
    pub fn with_tags(map: TagMap) -> Self {
        Self {
            map: Mutex::new(map),
        }
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn all(&self) -> Result<TagMap, TagStoreError> {
        Ok(self.map.lock().await.clone())
    }

    async fn update(&self, id: &str, edit: TagEdit) -> Result<Vec<String>, TagStoreError> {
        let mut map = self.map.lock().await;
        Ok(apply_edit(&mut map, id, edit))
    }
}
