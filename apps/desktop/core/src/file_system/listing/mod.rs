//! Directory listing module - entry metadata, reading, and the sort/filter policy.

pub(crate) mod metadata;
pub(crate) mod reading;
pub(crate) mod sorting;

pub use metadata::{DirectoryEntry, EntryId};
pub use reading::{get_single_entry, list_directory};
pub use sorting::{SortDirection, SortKey, SortSpec, apply_policy, compare_entries, compare_names, sort_entries};
