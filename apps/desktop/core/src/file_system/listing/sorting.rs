//! Sort/filter policy shared by every pane.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::file_system::listing::metadata::DirectoryEntry;

// ============================================================================
// Sorting configuration
// ============================================================================

/// Column to sort entries by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Kind,
    Modified,
    Created,
    Added,
    Accessed,
}

/// Sort direction (ascending or descending).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The single active sort of a pane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

// ============================================================================
// Name collation
// ============================================================================

/// Primary collation key: alphanumeric runs, lowercased, diacritics stripped, with
/// every run of punctuation or whitespace collapsed to one space and trimmed.
fn collation_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push(' ');
            }
            pending_separator = false;
            key.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    key
}

/// Compares two names the way a locale-aware file browser does: case-insensitive,
/// punctuation-insensitive at the first level, numbers in natural order
/// ("img_2" before "img_10").
///
/// Names that only differ in case collate as equal, leaving the order to the stable sort.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let primary = alphanumeric_sort::compare_str(collation_key(a), collation_key(b));
    if primary != Ordering::Equal {
        return primary;
    }
    alphanumeric_sort::compare_str(a.to_lowercase(), b.to_lowercase())
}

// ============================================================================
// Policy
// ============================================================================

/// Compares two entries by one key, ascending. Missing values sort first.
///
/// Equal values stay `Equal`; there is no secondary key.
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::Size => a.size.cmp(&b.size),
        SortKey::Kind => compare_names(&a.kind, &b.kind),
        SortKey::Modified => a.modified_at.cmp(&b.modified_at),
        SortKey::Created => a.created_at.cmp(&b.created_at),
        SortKey::Added => a.added_at.cmp(&b.added_at),
        SortKey::Accessed => a.accessed_at.cmp(&b.accessed_at),
    }
}

/// Sorts in place. Stable in both directions: descending reverses the comparator, so ties
/// keep their prior relative order.
pub fn sort_entries(entries: &mut [DirectoryEntry], sort: SortSpec) {
    entries.sort_by(|a, b| {
        let ordering = compare_entries(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Derives the displayed sequence from raw listing entries.
///
/// Filters hidden entries first (when `hide_hidden` is set), then sorts what's left.
/// Directories are not grouped ahead of files.
pub fn apply_policy(raw: &[DirectoryEntry], hide_hidden: bool, sort: SortSpec) -> Vec<DirectoryEntry> {
    let mut visible: Vec<DirectoryEntry> = raw
        .iter()
        .filter(|entry| !(hide_hidden && entry.is_hidden))
        .cloned()
        .collect();
    sort_entries(&mut visible, sort);
    visible
}
