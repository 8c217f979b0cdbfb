//! Real filesystem provider.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use filetime::FileTime;
use uuid::Uuid;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use super::{
    DefaultDirectory, FileSystemProvider, FsError, WatchCallback, WatchSubscription, archive_stem, unique_child_path,
};
use crate::file_system::listing::DirectoryEntry;
use crate::file_system::listing::reading;
use crate::file_system::watcher::start_watching;

/// Provider backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystemProvider for LocalFileSystem {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>, FsError> {
        Ok(reading::list_directory(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn move_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError> {
        let target = prepare_target(source, destination_dir)?;
        with_backup(&target, overwrite, || move_path(source, &target))?;
        log::debug!("move_item: {} -> {}", source.display(), target.display());
        Ok(target)
    }

    fn copy_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError> {
        let target = prepare_target(source, destination_dir)?;
        with_backup(&target, overwrite, || copy_recursive(source, &target))?;
        log::debug!("copy_item: {} -> {}", source.display(), target.display());
        Ok(target)
    }

    fn delete_item(&self, path: &Path) -> Result<(), FsError> {
        if !self.exists(path) {
            return Err(FsError::NotFound(path.display().to_string()));
        }
        trash::delete(path).map_err(|e| FsError::Io(e.to_string()))?;
        log::debug!("delete_item: moved {} to trash", path.display());
        Ok(())
    }

    fn resolve_default_directory(&self, which: DefaultDirectory) -> PathBuf {
        let resolved = match which {
            DefaultDirectory::Home => dirs::home_dir(),
            DefaultDirectory::Downloads => dirs::download_dir(),
            DefaultDirectory::Desktop => dirs::desktop_dir(),
            DefaultDirectory::Documents => dirs::document_dir(),
        };
        resolved
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    #[cfg(unix)]
    fn create_alias(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, FsError> {
        if !self.exists(source) {
            return Err(FsError::NotFound(source.display().to_string()));
        }
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| FsError::Io(format!("Invalid source path: {}", source.display())))?;
        let alias = unique_child_path(destination_dir, &format!("{} alias", name), None, |p| self.exists(p));
        std::os::unix::fs::symlink(source, &alias)?;
        Ok(alias)
    }

    fn compress(&self, sources: &[PathBuf], destination_dir: &Path) -> Result<PathBuf, FsError> {
        if sources.is_empty() {
            return Err(FsError::Io("Nothing to compress".to_string()));
        }
        for source in sources {
            if !self.exists(source) {
                return Err(FsError::NotFound(source.display().to_string()));
            }
        }
        let archive = unique_child_path(destination_dir, &archive_stem(sources), Some("zip"), |p| self.exists(p));
        if let Err(e) = write_archive(&archive, sources) {
            // Don't leave a half-written archive behind
            let _ = fs::remove_file(&archive);
            return Err(e);
        }
        log::debug!("compress: {} item(s) into {}", sources.len(), archive.display());
        Ok(archive)
    }

    fn open_item(&self, path: &Path) -> Result<(), FsError> {
        open::that(path)?;
        Ok(())
    }

    fn watch(
        &self,
        path: &Path,
        debounce: Duration,
        on_change: WatchCallback,
    ) -> Result<Box<dyn WatchSubscription>, FsError> {
        let watch = start_watching(path, debounce, on_change)?;
        Ok(Box::new(watch))
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Checks the source and destination, and returns where the item will land.
fn prepare_target(source: &Path, destination_dir: &Path) -> Result<PathBuf, FsError> {
    let source_meta =
        fs::symlink_metadata(source).map_err(|_| FsError::NotFound(source.display().to_string()))?;
    if !destination_dir.is_dir() {
        return Err(FsError::NotFound(destination_dir.display().to_string()));
    }
    if let Some(parent) = source.parent()
        && parent == destination_dir
    {
        return Err(FsError::SameLocation(source.display().to_string()));
    }
    if source_meta.is_dir() && destination_dir.starts_with(source) {
        return Err(FsError::DestinationInsideSource(source.display().to_string()));
    }
    let name = source
        .file_name()
        .ok_or_else(|| FsError::Io(format!("Invalid source path: {}", source.display())))?;
    Ok(destination_dir.join(name))
}

// ============================================================================
// Overwrite with backup
// ============================================================================

/// Runs `operation` with `target` cleared out of the way.
///
/// An existing target is renamed to a backup first. The backup is restored if the
/// operation fails and deleted once it succeeds.
fn with_backup(
    target: &Path,
    overwrite: bool,
    operation: impl FnOnce() -> Result<(), FsError>,
) -> Result<(), FsError> {
    if fs::symlink_metadata(target).is_err() {
        return operation();
    }
    if !overwrite {
        return Err(FsError::AlreadyExists(target.display().to_string()));
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let parent = target.parent().unwrap_or(Path::new("."));
    let backup = parent.join(format!("{}.quadrant-backup-{}", file_name, Uuid::new_v4()));

    fs::rename(target, &backup)
        .map_err(|e| FsError::Io(format!("Failed to back up {}: {}", target.display(), e)))?;

    match operation() {
        Ok(()) => {
            if let Err(e) = remove_path(&backup) {
                log::warn!("Couldn't remove backup {}: {}", backup.display(), e);
            }
            Ok(())
        }
        Err(e) => {
            let _ = remove_path(target);
            if let Err(restore_err) = fs::rename(&backup, target) {
                log::error!(
                    "Couldn't restore {} from {}: {}",
                    target.display(),
                    backup.display(),
                    restore_err
                );
            }
            Err(e)
        }
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

// ============================================================================
// Move and copy
// ============================================================================

/// Renames, falling back to copy + delete when source and target are on different devices.
fn move_path(source: &Path, target: &Path) -> Result<(), FsError> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("move_path: cross-device move, copying {}", source.display());
            copy_recursive(source, target)?;
            remove_path(source)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Copies a file, symlink, or directory tree, keeping modification times.
fn copy_recursive(source: &Path, target: &Path) -> Result<(), FsError> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| FsError::Io(e.to_string()))?;
        let destination = if relative.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
            continue;
        } else {
            fs::copy(entry.path(), &destination)?;
        }

        if let Ok(meta) = entry.metadata() {
            let mtime = FileTime::from_last_modification_time(&meta);
            let _ = filetime::set_file_mtime(&destination, mtime);
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    let link_target = fs::read_link(source)?;
    std::os::unix::fs::symlink(link_target, destination)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination).map(|_| ())
}

// ============================================================================
// Compression
// ============================================================================

fn write_archive(archive: &Path, sources: &[PathBuf]) -> Result<(), FsError> {
    let file = fs::File::create(archive)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let zip_err = |e: zip::result::ZipError| FsError::Io(e.to_string());

    for source in sources {
        let base = source.parent().unwrap_or(Path::new(""));
        for entry in WalkDir::new(source).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(base)
                .map_err(|e| FsError::Io(e.to_string()))?;
            // Zip entry names always use forward slashes
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                writer.add_directory(name, options).map_err(zip_err)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options).map_err(zip_err)?;
                let mut input = fs::File::open(entry.path())?;
                io::copy(&mut input, &mut writer)?;
            }
        }
    }

    writer.finish().map_err(zip_err)?;
    Ok(())
}
