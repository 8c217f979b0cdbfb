//! File system module - listing, sorting, providers, watchers, and batch operations.

pub mod listing;
pub mod operations;
pub mod provider;
pub mod validation;
pub mod watcher;

pub use listing::{
    DirectoryEntry, EntryId, SortDirection, SortKey, SortSpec, apply_policy, compare_names, get_single_entry,
    list_directory,
};
pub use operations::{FileOperationKind, ItemFailure, OperationOutcome, OperationReport, find_collisions, run_batch};
pub use provider::{
    DefaultDirectory, FileSystemProvider, FsError, InMemoryFileSystem, LocalFileSystem, WatchCallback,
    WatchSubscription,
};
pub use validation::{ValidationError, normalize_path, resolve_directory_input};
pub use watcher::{ChangeType, DiffChange, DirectoryWatch, compute_diff, start_watching};
