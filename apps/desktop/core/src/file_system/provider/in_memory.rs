//! In-memory filesystem provider.
//!
//! Holds a tree of entries keyed by path. Used by tests and by hosts that want to drive
//! panes without touching the disk. Supports failure injection and change notification.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use super::{
    DefaultDirectory, FileSystemProvider, FsError, WatchCallback, WatchSubscription, archive_stem, unique_child_path,
};
use crate::file_system::listing::DirectoryEntry;
use crate::file_system::validation::normalize_path;
use crate::ignore_poison::IgnorePoisonRw;

#[derive(Default)]
struct State {
    /// Every item except the root, keyed by normalized path.
    nodes: BTreeMap<PathBuf, DirectoryEntry>,
    failing_listings: HashMap<PathBuf, FsError>,
    failing_items: HashSet<PathBuf>,
    watchers: Vec<(u64, PathBuf, Arc<WatchCallback>)>,
    next_watch_id: u64,
    watches_unavailable: bool,
    opened: Vec<PathBuf>,
    home: PathBuf,
}

impl State {
    fn is_directory(&self, path: &Path) -> bool {
        path.parent().is_none()
            || self
                .nodes
                .get(path)
                .map(|e| e.is_directory || e.is_application_bundle)
                .unwrap_or(false)
    }

    fn exists(&self, path: &Path) -> bool {
        path.parent().is_none() || self.nodes.contains_key(path)
    }

    fn subtree(&self, root: &Path) -> Vec<PathBuf> {
        self.nodes.keys().filter(|p| p.starts_with(root)).cloned().collect()
    }

    fn check_item(&self, path: &Path) -> Result<(), FsError> {
        if self.failing_items.contains(path) {
            return Err(FsError::PermissionDenied(path.display().to_string()));
        }
        if !self.nodes.contains_key(path) {
            return Err(FsError::NotFound(path.display().to_string()));
        }
        Ok(())
    }

    fn insert(&mut self, entry: DirectoryEntry) {
        self.nodes.insert(entry.path_buf(), entry);
    }

    fn callbacks_for(&self, directories: &[PathBuf]) -> Vec<Arc<WatchCallback>> {
        self.watchers
            .iter()
            .filter(|(_, path, _)| directories.iter().any(|d| d == path))
            .map(|(_, _, cb)| Arc::clone(cb))
            .collect()
    }
}

/// Provider backed by an in-memory tree.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    state: Arc<RwLock<State>>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.state.write_ignore_poison().home = PathBuf::from("/");
        fs
    }

    /// Adds a directory (and any missing ancestors).
    pub fn add_directory(&self, path: impl AsRef<Path>) -> &Self {
        let path = normalize_path(path.as_ref());
        let mut state = self.state.write_ignore_poison();
        for ancestor in path.ancestors() {
            if ancestor.parent().is_none() || state.nodes.contains_key(ancestor) {
                continue;
            }
            state.insert(DirectoryEntry::from_parts(ancestor, true, None, Some(0)));
        }
        self
    }

    /// Adds a file (and any missing parent directories).
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64, modified_at: u64) -> &Self {
        let path = normalize_path(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_directory(parent);
        }
        self.state
            .write_ignore_poison()
            .insert(DirectoryEntry::from_parts(&path, false, Some(size), Some(modified_at)));
        self
    }

    /// Makes every listing of `path` fail with `error` until cleared.
    pub fn fail_listing(&self, path: impl AsRef<Path>, error: FsError) {
        self.state
            .write_ignore_poison()
            .failing_listings
            .insert(normalize_path(path.as_ref()), error);
    }

    pub fn clear_listing_failure(&self, path: impl AsRef<Path>) {
        self.state
            .write_ignore_poison()
            .failing_listings
            .remove(&normalize_path(path.as_ref()));
    }

    /// Makes item operations on `path` fail with `PermissionDenied`.
    pub fn fail_item(&self, path: impl AsRef<Path>) {
        self.state
            .write_ignore_poison()
            .failing_items
            .insert(normalize_path(path.as_ref()));
    }

    /// Makes new watch subscriptions fail, like a volume without change notifications.
    pub fn set_watches_unavailable(&self, unavailable: bool) {
        self.state.write_ignore_poison().watches_unavailable = unavailable;
    }

    pub fn set_home(&self, path: impl AsRef<Path>) {
        self.state.write_ignore_poison().home = normalize_path(path.as_ref());
    }

    /// Number of `list_directory` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Paths passed to `open_item`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.read_ignore_poison().opened.clone()
    }

    /// Number of live watch subscriptions.
    pub fn active_watches(&self) -> usize {
        self.state.read_ignore_poison().watchers.len()
    }

    /// Fires the watchers of `directory` as if something changed in it externally.
    pub fn notify_change(&self, directory: impl AsRef<Path>) {
        self.fire(&[normalize_path(directory.as_ref())]);
    }

    /// Removes an item without going through an operation. Watchers of its parent fire.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = normalize_path(path.as_ref());
        {
            let mut state = self.state.write_ignore_poison();
            for key in state.subtree(&path) {
                state.nodes.remove(&key);
            }
        }
        self.fire(&parents_of(&[path]));
    }

    fn fire(&self, directories: &[PathBuf]) {
        let callbacks = self.state.read_ignore_poison().callbacks_for(directories);
        for callback in callbacks {
            (callback.as_ref())();
        }
    }

    /// Shared checks for move and copy. Returns the target path.
    fn prepare_target(state: &State, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError> {
        state.check_item(source)?;
        if !state.is_directory(destination_dir) {
            return Err(FsError::NotFound(destination_dir.display().to_string()));
        }
        if source.parent() == Some(destination_dir) {
            return Err(FsError::SameLocation(source.display().to_string()));
        }
        if state.is_directory(source) && destination_dir.starts_with(source) {
            return Err(FsError::DestinationInsideSource(source.display().to_string()));
        }
        let name = source
            .file_name()
            .ok_or_else(|| FsError::Io(format!("Invalid source path: {}", source.display())))?;
        let target = destination_dir.join(name);
        if state.exists(&target) && !overwrite {
            return Err(FsError::AlreadyExists(target.display().to_string()));
        }
        Ok(target)
    }

    fn transfer(&self, source: &Path, destination_dir: &Path, overwrite: bool, keep_source: bool) -> Result<PathBuf, FsError> {
        let source = normalize_path(source);
        let destination_dir = normalize_path(destination_dir);
        let target = {
            let mut state = self.state.write_ignore_poison();
            let target = Self::prepare_target(&state, &source, &destination_dir, overwrite)?;
            for key in state.subtree(&target) {
                state.nodes.remove(&key);
            }
            for key in state.subtree(&source) {
                let entry = if keep_source {
                    state.nodes.get(&key).cloned()
                } else {
                    state.nodes.remove(&key)
                };
                let Some(entry) = entry else { continue };
                let relative = key.strip_prefix(&source).unwrap_or(Path::new(""));
                let new_path = if relative.as_os_str().is_empty() {
                    target.clone()
                } else {
                    target.join(relative)
                };
                state.insert(entry.relocated(&new_path));
            }
            target
        };
        self.fire(&parents_of(&[source, target.clone()]));
        Ok(target)
    }
}

fn parents_of(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter_map(|p| p.parent().map(Path::to_path_buf)).collect()
}

impl FileSystemProvider for InMemoryFileSystem {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>, FsError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let path = normalize_path(path);
        let state = self.state.read_ignore_poison();
        if let Some(error) = state.failing_listings.get(&path) {
            return Err(error.clone());
        }
        if !state.exists(&path) {
            return Err(FsError::NotFound(path.display().to_string()));
        }
        if !state.is_directory(&path) {
            return Err(FsError::Io(format!("Not a directory: {}", path.display())));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path.as_path()))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.state.read_ignore_poison().exists(&normalize_path(path))
    }

    fn move_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError> {
        self.transfer(source, destination_dir, overwrite, false)
    }

    fn copy_item(&self, source: &Path, destination_dir: &Path, overwrite: bool) -> Result<PathBuf, FsError> {
        self.transfer(source, destination_dir, overwrite, true)
    }

    fn delete_item(&self, path: &Path) -> Result<(), FsError> {
        let path = normalize_path(path);
        {
            let mut state = self.state.write_ignore_poison();
            state.check_item(&path)?;
            for key in state.subtree(&path) {
                state.nodes.remove(&key);
            }
        }
        self.fire(&parents_of(&[path]));
        Ok(())
    }

    fn resolve_default_directory(&self, which: DefaultDirectory) -> PathBuf {
        let home = self.state.read_ignore_poison().home.clone();
        match which {
            DefaultDirectory::Home => home,
            DefaultDirectory::Downloads => home.join("Downloads"),
            DefaultDirectory::Desktop => home.join("Desktop"),
            DefaultDirectory::Documents => home.join("Documents"),
        }
    }

    fn create_alias(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, FsError> {
        let source = normalize_path(source);
        let destination_dir = normalize_path(destination_dir);
        let alias = {
            let mut state = self.state.write_ignore_poison();
            state.check_item(&source)?;
            if !state.is_directory(&destination_dir) {
                return Err(FsError::NotFound(destination_dir.display().to_string()));
            }
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let alias = unique_child_path(&destination_dir, &format!("{} alias", name), None, |p| state.exists(p));
            let mut entry = DirectoryEntry::from_parts(&alias, false, Some(0), Some(0));
            entry.is_symlink = true;
            state.insert(entry);
            alias
        };
        self.fire(&[destination_dir]);
        Ok(alias)
    }

    fn compress(&self, sources: &[PathBuf], destination_dir: &Path) -> Result<PathBuf, FsError> {
        let destination_dir = normalize_path(destination_dir);
        let archive = {
            let mut state = self.state.write_ignore_poison();
            let mut total = 0;
            for source in sources {
                let source = normalize_path(source);
                state.check_item(&source)?;
                total += state
                    .subtree(&source)
                    .iter()
                    .filter_map(|p| state.nodes.get(p).and_then(|e| e.size))
                    .sum::<u64>();
            }
            let archive = unique_child_path(&destination_dir, &archive_stem(sources), Some("zip"), |p| {
                state.exists(p)
            });
            state.insert(DirectoryEntry::from_parts(&archive, false, Some(total), Some(0)));
            archive
        };
        self.fire(&[destination_dir]);
        Ok(archive)
    }

    fn open_item(&self, path: &Path) -> Result<(), FsError> {
        let path = normalize_path(path);
        let mut state = self.state.write_ignore_poison();
        state.check_item(&path)?;
        state.opened.push(path);
        Ok(())
    }

    fn watch(
        &self,
        path: &Path,
        _debounce: Duration,
        on_change: WatchCallback,
    ) -> Result<Box<dyn WatchSubscription>, FsError> {
        let path = normalize_path(path);
        let mut state = self.state.write_ignore_poison();
        if state.watches_unavailable {
            return Err(FsError::NotSupported);
        }
        if !state.is_directory(&path) {
            return Err(FsError::NotFound(path.display().to_string()));
        }
        let id = state.next_watch_id;
        state.next_watch_id += 1;
        state.watchers.push((id, path.clone(), Arc::new(on_change)));
        Ok(Box::new(InMemoryWatch {
            id,
            path,
            state: Arc::downgrade(&self.state),
        }))
    }
}

/// Watch on an in-memory directory. Unregisters itself on drop.
struct InMemoryWatch {
    id: u64,
    path: PathBuf,
    state: Weak<RwLock<State>>,
}

impl WatchSubscription for InMemoryWatch {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InMemoryWatch {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.write_ignore_poison().watchers.retain(|(id, _, _)| *id != self.id);
        }
    }
}
