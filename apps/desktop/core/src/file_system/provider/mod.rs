//! Filesystem access facade.
//!
//! `FileSystemProvider` abstracts everything a pane asks of the host filesystem:
//! listing, batch item operations, watching, and well-known folders. Sessions only
//! talk to this trait, so they can run against the real disk or an in-memory tree.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::file_system::listing::DirectoryEntry;

mod in_memory;
mod local;

pub use in_memory::InMemoryFileSystem;
pub use local::LocalFileSystem;


/// Error type for provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Path not found
    NotFound(String),
    /// Permission denied
    PermissionDenied(String),
    /// Destination already exists (and overwrite wasn't confirmed)
    AlreadyExists(String),
    /// Source is already in the destination folder
    SameLocation(String),
    /// Destination is inside the source (would recurse into itself)
    DestinationInsideSource(String),
    /// Operation not supported by this provider or platform
    NotSupported,
    /// Generic I/O error
    Io(String),
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Not found: {}", path),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            Self::AlreadyExists(path) => write!(f, "Already exists: {}", path),
            Self::SameLocation(path) => write!(f, "Already in this folder: {}", path),
            Self::DestinationInsideSource(path) => write!(f, "Can't put a folder inside itself: {}", path),
            Self::NotSupported => write!(f, "Operation not supported"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl FsError {
    /// Short message for inline display in a pane.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(path) => format!("Cannot find \"{}\". It may have been moved or deleted.", path),
            Self::PermissionDenied(path) => format!("Cannot access \"{}\": permission denied.", path),
            Self::AlreadyExists(path) => {
                let filename = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                format!("\"{}\" already exists at the destination.", filename)
            }
            Self::SameLocation(path) => format!("\"{}\" is already in this folder.", path),
            Self::DestinationInsideSource(path) => {
                format!("Can't move or copy \"{}\" into itself.", path)
            }
            Self::NotSupported => "This operation isn't supported here.".to_string(),
            Self::Io(msg) => format!("Something went wrong: {}", msg),
        }
    }
}

impl std::error::Error for FsError {}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Well-known starting folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DefaultDirectory {
    #[default]
    Home,
    Downloads,
    Desktop,
    Documents,
}

/// Called (from a watcher thread) after debounced changes in a watched directory.
pub type WatchCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// A live directory watch. Dropping it stops the watch.
pub trait WatchSubscription: Send {
    fn path(&self) -> &Path;
}

/// Filesystem access used by directory sessions.
///
/// Item operations take one source at a time so callers can collect per-item results.
/// Implementations must be callable from several panes' background jobs at once.
pub trait FileSystemProvider: Send + Sync {
    /// Lists the entries of a directory, in no particular order.
    fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>, FsError>;

    /// Checks if something exists at the path (broken symlinks count).
    fn exists(&self, path: &Path) -> bool;

    /// Moves `source` into `destination_dir`, keeping its name. Returns the new path.
    ///
    /// With `overwrite` false, an existing item of the same name fails with `AlreadyExists`.
    fn move_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError>;

    /// Copies `source` (recursively) into `destination_dir`. Returns the new path.
    fn copy_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError>;

    /// Moves an item to the trash.
    fn delete_item(&self, path: &Path) -> Result<(), FsError>;

    /// Resolves a well-known folder.
    fn resolve_default_directory(&self, which: DefaultDirectory) -> PathBuf;

    // ========================================
    // Optional: Default to NotSupported
    // ========================================

    /// Creates an alias (link) to `source` inside `destination_dir`. Returns the alias path.
    fn create_alias(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, FsError> {
        let _ = (source, destination_dir);
        Err(FsError::NotSupported)
    }

    /// Compresses all sources into one archive inside `destination_dir`. Returns the archive path.
    fn compress(&self, sources: &[PathBuf], destination_dir: &Path) -> Result<PathBuf, FsError> {
        let _ = (sources, destination_dir);
        Err(FsError::NotSupported)
    }

    /// Opens a file (or bundle) with its default application.
    fn open_item(&self, path: &Path) -> Result<(), FsError> {
        let _ = path;
        Err(FsError::NotSupported)
    }

    /// Starts watching a directory (non-recursive). `on_change` runs after each debounced burst.
    fn watch(
        &self,
        path: &Path,
        debounce: Duration,
        on_change: WatchCallback,
    ) -> Result<Box<dyn WatchSubscription>, FsError> {
        let _ = (path, debounce, on_change);
        Err(FsError::NotSupported)
    }
}

/// Picks `<stem><suffix>.<ext>`, `<stem><suffix> 2.<ext>`, ... until nothing exists at the path.
pub(crate) fn unique_child_path(
    directory: &Path,
    stem: &str,
    extension: Option<&str>,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    let file_name = |counter: u32| {
        let numbered = if counter == 1 {
            stem.to_string()
        } else {
            format!("{} {}", stem, counter)
        };
        match extension {
            Some(ext) => format!("{}.{}", numbered, ext),
            None => numbered,
        }
    };
    let mut counter = 1;
    loop {
        let candidate = directory.join(file_name(counter));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Archive base name: the item's own name for a single source, "Archive" otherwise.
pub(crate) fn archive_stem(sources: &[PathBuf]) -> String {
    match sources {
        [single] => single
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| crate::config::ARCHIVE_BASE_NAME.to_string()),
        _ => crate::config::ARCHIVE_BASE_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn io_error_conversion() {
        let err: FsError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, FsError::NotFound(_)));
        let err: FsError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no").into();
        assert!(matches!(err, FsError::PermissionDenied(_)));
        let err: FsError = std::io::Error::other("boom").into();
        assert!(matches!(err, FsError::Io(_)));
    }

    #[test]
    fn unique_child_path_appends_counter() {
        let taken: HashSet<PathBuf> = [PathBuf::from("/d/Archive.zip"), PathBuf::from("/d/Archive 2.zip")]
            .into_iter()
            .collect();
        let path = unique_child_path(Path::new("/d"), "Archive", Some("zip"), |p| taken.contains(p));
        assert_eq!(path, PathBuf::from("/d/Archive 3.zip"));
    }

    #[test]
    fn archive_stem_uses_single_item_name() {
        assert_eq!(archive_stem(&[PathBuf::from("/d/report.pdf")]), "report");
        assert_eq!(
            archive_stem(&[PathBuf::from("/d/a"), PathBuf::from("/d/b")]),
            "Archive"
        );
    }
}
