//! Low-level directory reading and DirectoryEntry construction.
//!
//! Pure I/O functions that read from disk and build entries. Ordering is left to the
//! sort/filter policy; these functions return entries in `read_dir` order.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::file_system::listing::metadata::{
    DirectoryEntry, EntryId, display_name, is_bundle_name, is_hidden_name, kind_for,
};

/// Lists the contents of a directory.
///
/// Entries whose metadata can't be read (permission denied, broken symlink) are still
/// returned, with minimal metadata, so they stay visible in the pane.
pub fn list_directory(path: &Path) -> Result<Vec<DirectoryEntry>, io::Error> {
    let start = Instant::now();
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(path)? {
        let dir_entry = dir_entry?;
        match process_dir_entry(&dir_entry) {
            Some(entry) => entries.push(entry),
            None => entries.push(minimal_entry(&dir_entry)),
        }
    }

    log::debug!(
        "list_directory: path={}, entries={}, total={}ms",
        path.display(),
        entries.len(),
        start.elapsed().as_millis()
    );

    Ok(entries)
}

/// Gets metadata for a single file or directory path.
pub fn get_single_entry(path: &Path) -> Result<DirectoryEntry, io::Error> {
    let symlink_meta = fs::symlink_metadata(path)?;
    let is_symlink = symlink_meta.file_type().is_symlink();
    let target_is_dir = is_symlink && fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
    Ok(build_entry(path, display_name(path), &symlink_meta, is_symlink, target_is_dir))
}

/// Process a single directory entry. Returns None if its metadata can't be read.
fn process_dir_entry(entry: &fs::DirEntry) -> Option<DirectoryEntry> {
    let file_type = entry.file_type().ok()?;
    let is_symlink = file_type.is_symlink();
    let path = entry.path();

    let target_is_dir = is_symlink && fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
    let metadata = if is_symlink {
        fs::symlink_metadata(&path).ok()?
    } else {
        entry.metadata().ok()?
    };

    let name = entry.file_name().to_string_lossy().into_owned();
    Some(build_entry(&path, name, &metadata, is_symlink, target_is_dir))
}

fn build_entry(
    path: &Path,
    name: String,
    metadata: &fs::Metadata,
    is_symlink: bool,
    target_is_dir: bool,
) -> DirectoryEntry {
    let on_disk_directory = metadata.is_dir() || target_is_dir;
    let is_application_bundle = on_disk_directory && is_bundle_name(&name);
    let is_directory = on_disk_directory && !is_application_bundle;

    DirectoryEntry {
        id: EntryId::from_path(path),
        path: path.to_string_lossy().into_owned(),
        is_directory,
        is_application_bundle,
        is_symlink,
        size: if metadata.is_file() { Some(metadata.len()) } else { None },
        kind: kind_for(&name, is_directory, is_application_bundle),
        modified_at: unix_seconds(metadata.modified()),
        created_at: unix_seconds(metadata.created()),
        added_at: added_at(metadata),
        accessed_at: unix_seconds(metadata.accessed()),
        is_hidden: is_hidden_name(&name) || has_hidden_attribute(metadata),
        name,
    }
}

/// Entry for something we can see in `read_dir` but can't stat.
fn minimal_entry(entry: &fs::DirEntry) -> DirectoryEntry {
    let file_type = entry.file_type().ok();
    let on_disk_directory = file_type.map(|ft| ft.is_dir()).unwrap_or(false);
    let mut minimal = DirectoryEntry::from_parts(&entry.path(), on_disk_directory, None, None);
    minimal.is_symlink = file_type.map(|ft| ft.is_symlink()).unwrap_or(false);
    minimal
}

fn unix_seconds(time: io::Result<SystemTime>) -> Option<u64> {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

#[cfg(unix)]
fn added_at(metadata: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    u64::try_from(metadata.ctime()).ok()
}

#[cfg(not(unix))]
fn added_at(metadata: &fs::Metadata) -> Option<u64> {
    unix_seconds(metadata.created())
}

#[cfg(windows)]
fn has_hidden_attribute(metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn has_hidden_attribute(_metadata: &fs::Metadata) -> bool {
    false
}
