//! Directory entry type and helpers for deriving its display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BUNDLE_EXTENSIONS;
use crate::file_system::validation::normalize_path;

/// MIME descriptor used for directories.
pub const DIRECTORY_KIND: &str = "inode/directory";
/// MIME descriptor used for application bundles.
pub const BUNDLE_KIND: &str = "application/x-bundle";
/// Fallback descriptor when the extension is unknown.
const UNKNOWN_KIND: &str = "application/octet-stream";

/// Stable identity of an entry: its normalized absolute path.
///
/// A rename or move changes the identity, so selections keyed by it drop the item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn from_path(path: &Path) -> Self {
        Self(normalize_path(path).to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One filesystem object as shown in a pane.
///
/// Built fresh on every listing and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: EntryId,
    pub name: String,
    pub path: String,
    /// False for application bundles even though they are directories on disk.
    pub is_directory: bool,
    pub is_application_bundle: bool,
    pub is_symlink: bool,
    /// None for directories and entries whose metadata couldn't be read
    pub size: Option<u64>,
    /// MIME type descriptor, like "text/plain" or "inode/directory"
    pub kind: String,
    pub modified_at: Option<u64>,
    pub created_at: Option<u64>,
    /// When the entry was added to its parent. Approximated by the inode change time on Unix.
    pub added_at: Option<u64>,
    pub accessed_at: Option<u64>,
    pub is_hidden: bool,
}

impl DirectoryEntry {
    /// Builds an entry from a path and the few attributes that can't be derived from it.
    ///
    /// Name, identity, kind, bundle and hidden flags all come from the path.
    pub fn from_parts(path: &Path, on_disk_directory: bool, size: Option<u64>, modified_at: Option<u64>) -> Self {
        let name = display_name(path);
        let is_application_bundle = on_disk_directory && is_bundle_name(&name);
        let is_directory = on_disk_directory && !is_application_bundle;
        Self {
            id: EntryId::from_path(path),
            kind: kind_for(&name, is_directory, is_application_bundle),
            is_hidden: is_hidden_name(&name),
            name,
            path: path.to_string_lossy().into_owned(),
            is_directory,
            is_application_bundle,
            is_symlink: false,
            size: if on_disk_directory { None } else { size },
            modified_at,
            created_at: modified_at,
            added_at: modified_at,
            accessed_at: modified_at,
        }
    }

    /// Returns a copy that lives at `new_path`, with identity and name updated.
    pub fn relocated(&self, new_path: &Path) -> Self {
        let name = display_name(new_path);
        Self {
            id: EntryId::from_path(new_path),
            path: new_path.to_string_lossy().into_owned(),
            is_hidden: is_hidden_name(&name),
            name,
            ..self.clone()
        }
    }

    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// True when navigating into this entry should load it as a directory.
    pub fn is_traversable(&self) -> bool {
        self.is_directory && !self.is_application_bundle
    }
}

/// Final path component, or the whole path for roots like "/".
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}

pub(crate) fn is_bundle_name(name: &str) -> bool {
    match Path::new(name).extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            BUNDLE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Generates the MIME descriptor shown in the Kind column.
pub(crate) fn kind_for(name: &str, is_directory: bool, is_bundle: bool) -> String {
    if is_bundle {
        return BUNDLE_KIND.to_string();
    }
    if is_directory {
        return DIRECTORY_KIND.to_string();
    }
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(UNKNOWN_KIND)
        .to_string()
}
