//! File system watcher with debouncing and diff computation.
//!
//! A pane holds at most one `DirectoryWatch` for the directory it shows. The watch
//! only signals that something changed; the pane re-lists and `compute_diff` tells
//! what actually moved.

use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::file_system::listing::{DirectoryEntry, EntryId};
use crate::file_system::provider::{FsError, WatchCallback, WatchSubscription};

/// Live watch on one directory. Dropping it stops the watch.
pub struct DirectoryWatch {
    path: PathBuf,
    #[allow(dead_code, reason = "Debouncer must be held to keep watching")]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl WatchSubscription for DirectoryWatch {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DirectoryWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatch").field("path", &self.path).finish()
    }
}

/// Starts a non-recursive watch on `path`.
///
/// `on_change` runs on the debouncer's thread once per debounced burst of events.
pub fn start_watching(path: &Path, debounce: Duration, on_change: WatchCallback) -> Result<DirectoryWatch, FsError> {
    let watched = path.display().to_string();
    let mut debouncer = new_debouncer(
        debounce,
        None, // No tick rate limit
        move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    if !events.is_empty() {
                        on_change();
                    }
                }
                Err(errors) => {
                    // Watcher errors often mean the watched directory was deleted.
                    // Let the pane re-read; the listing will report what's wrong.
                    log::debug!("Watcher: {} error(s) for {}", errors.len(), watched);
                    on_change();
                }
            }
        },
    )
    .map_err(|e| FsError::Io(format!("Failed to create watcher: {}", e)))?;

    debouncer
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| FsError::Io(format!("Failed to watch {}: {}", path.display(), e)))?;

    log::debug!("Watcher: started for {}", path.display());
    Ok(DirectoryWatch {
        path: path.to_path_buf(),
        debouncer,
    })
}

/// Kind of change between two listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    Add,
    Remove,
    Modify,
}

/// A single directory diff change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub entry: DirectoryEntry,
}

/// Computes the diff between old and new directory listings, matching entries by identity.
pub fn compute_diff(old: &[DirectoryEntry], new: &[DirectoryEntry]) -> Vec<DiffChange> {
    let mut changes = Vec::new();

    let old_map: HashMap<&EntryId, &DirectoryEntry> = old.iter().map(|e| (&e.id, e)).collect();
    let new_map: HashMap<&EntryId, &DirectoryEntry> = new.iter().map(|e| (&e.id, e)).collect();

    for new_entry in new {
        match old_map.get(&new_entry.id) {
            None => changes.push(DiffChange {
                change_type: ChangeType::Add,
                entry: new_entry.clone(),
            }),
            Some(old_entry) if is_entry_modified(old_entry, new_entry) => changes.push(DiffChange {
                change_type: ChangeType::Modify,
                entry: new_entry.clone(),
            }),
            Some(_) => {}
        }
    }

    for old_entry in old {
        if !new_map.contains_key(&old_entry.id) {
            changes.push(DiffChange {
                change_type: ChangeType::Remove,
                entry: old_entry.clone(),
            });
        }
    }

    changes
}

fn is_entry_modified(old: &DirectoryEntry, new: &DirectoryEntry) -> bool {
    old.size != new.size
        || old.modified_at != new.modified_at
        || old.is_directory != new.is_directory
        || old.is_symlink != new.is_symlink
}
