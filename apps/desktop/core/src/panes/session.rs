//! Directory session: one pane's position in the tree, its listing, and its commands.
//!
//! All methods run on the presentation thread. Listings and file operations are handed
//! to the background executor; their results come back through `handle_message`.
//! Each listing request carries a generation number and only the latest one is applied,
//! so a slow listing can never overwrite a newer one.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::file_system::listing::metadata::display_name;
use crate::file_system::{
    DirectoryEntry, FileOperationKind, FsError, OperationOutcome, OperationReport, SortDirection, SortKey, SortSpec,
    ValidationError, WatchCallback, WatchSubscription, apply_policy, compute_diff, find_collisions, normalize_path,
    resolve_directory_input, run_batch,
};
use crate::panes::history::NavigationHistory;
use crate::panes::{PaneId, Services};
use crate::runtime::{ConfirmationRequest, PaneEvent, WorkerMessage};

/// Listing status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last listing failed; the previous entries are still displayed
    Error,
}

/// How a listing request relates to history and visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    /// Fresh navigation: pushed onto history.
    Navigate,
    /// Back/forward step or a history reset: history already updated.
    Replay,
    /// Explicit reload of the current directory.
    Refresh,
    /// Watcher-driven reload; no loading indicator, skipped if nothing changed.
    Quiet,
}

/// Operation waiting for the user to confirm replacing existing items.
#[derive(Debug, Clone)]
struct PendingOperation {
    request: ConfirmationRequest,
    kind: FileOperationKind,
    sources: Vec<PathBuf>,
    destination: PathBuf,
}

/// Position to return to if a navigation fails before anything new is displayed.
#[derive(Debug, Clone)]
struct Checkpoint {
    directory: PathBuf,
    history: NavigationHistory,
}

/// Everything the presentation layer renders for one pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneSnapshot {
    pub pane_id: PaneId,
    pub current_directory: Option<String>,
    pub path_text: String,
    pub displayed_entries: Vec<DirectoryEntry>,
    pub is_loading: bool,
    pub status: SessionStatus,
    pub last_error: Option<String>,
    pub last_message: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub sort: SortSpec,
    pub hide_hidden: bool,
    pub pending_confirmation: Option<ConfirmationRequest>,
}

/// Navigation state of one pane.
pub struct DirectorySession {
    id: PaneId,
    services: Services,
    /// Directory most recently requested (shown in the path bar once loading starts).
    current_directory: Option<PathBuf>,
    /// Directory whose listing is on screen.
    displayed_directory: Option<PathBuf>,
    rollback: Option<Checkpoint>,
    /// Path bar text; may hold an in-progress edit.
    path_text: String,
    history: NavigationHistory,
    raw_entries: Vec<DirectoryEntry>,
    displayed_entries: Vec<DirectoryEntry>,
    sort: SortSpec,
    hide_hidden: bool,
    status: SessionStatus,
    last_error: Option<String>,
    last_message: Option<String>,
    generation: u64,
    pending_load: Option<(u64, LoadKind)>,
    watch: Option<Box<dyn WatchSubscription>>,
    watch_generation: u64,
    pending_operation: Option<PendingOperation>,
    operations_in_flight: usize,
}

impl DirectorySession {
    pub fn new(id: PaneId, services: Services, sort: SortSpec, hide_hidden: bool) -> Self {
        Self {
            id,
            services,
            current_directory: None,
            displayed_directory: None,
            rollback: None,
            path_text: String::new(),
            history: NavigationHistory::default(),
            raw_entries: Vec::new(),
            displayed_entries: Vec::new(),
            sort,
            hide_hidden,
            status: SessionStatus::Idle,
            last_error: None,
            last_message: None,
            generation: 0,
            pending_load: None,
            watch: None,
            watch_generation: 0,
            pending_operation: None,
            operations_in_flight: 0,
        }
    }

    // ========================================
    // Navigation
    // ========================================

    /// Loads a directory as a fresh navigation (recorded in history, forward history cleared).
    pub fn load_directory(&mut self, path: &Path) {
        self.remember_position();
        self.start_load(normalize_path(path), LoadKind::Navigate);
    }

    /// Enters a directory, or opens anything else with its default application.
    pub fn navigate_into(&mut self, entry: &DirectoryEntry) {
        if entry.is_traversable() {
            self.remember_position();
            self.start_load(normalize_path(&entry.path_buf()), LoadKind::Navigate);
            return;
        }
        if let Err(e) = self.services.provider.open_item(&entry.path_buf()) {
            log::warn!("{}: couldn't open {}: {}", self.id, entry.path, e);
            self.last_error = Some(e.user_message());
            self.notify_changed();
        }
    }

    pub fn go_back(&mut self) {
        if !self.history.can_go_back() {
            return;
        }
        self.remember_position();
        if let Some(path) = self.history.step_back() {
            self.start_load(path, LoadKind::Replay);
        }
    }

    pub fn go_forward(&mut self) {
        if !self.history.can_go_forward() {
            return;
        }
        self.remember_position();
        if let Some(path) = self.history.step_forward() {
            self.start_load(path, LoadKind::Replay);
        }
    }

    /// Navigates to the parent directory. No-op at the root.
    pub fn go_up(&mut self) {
        let parent = self
            .current_directory
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        if let Some(parent) = parent {
            self.remember_position();
            self.start_load(parent, LoadKind::Navigate);
        }
    }

    /// Navigates to a typed-in path.
    ///
    /// The path is validated locally first. On success history restarts from this
    /// directory. On failure the path bar reverts to the current directory.
    pub fn navigate_to_path(&mut self, raw: &str) -> Result<(), ValidationError> {
        match resolve_directory_input(raw) {
            Ok(path) => {
                self.remember_position();
                self.history.reset(&path);
                self.start_load(path, LoadKind::Replay);
                Ok(())
            }
            Err(e) => {
                log::debug!("{}: rejected path input {:?}: {}", self.id, raw, e);
                self.last_error = Some(e.to_string());
                self.path_text = self.current_path_text();
                self.notify_changed();
                Err(e)
            }
        }
    }

    /// Updates the path bar text while the user types.
    pub fn set_path_text(&mut self, text: impl Into<String>) {
        self.path_text = text.into();
        self.notify_changed();
    }

    /// Navigates to whatever is in the path bar.
    pub fn submit_path_text(&mut self) -> Result<(), ValidationError> {
        let text = self.path_text.clone();
        self.navigate_to_path(&text)
    }

    /// Reloads the current directory without touching history.
    pub fn refresh(&mut self) {
        if let Some(path) = self.current_directory.clone() {
            self.start_load(path, LoadKind::Refresh);
        }
    }

    /// Records the displayed position before history moves, unless a failed navigation
    /// would already return to it.
    fn remember_position(&mut self) {
        if self.rollback.is_some() {
            return;
        }
        if let Some(directory) = self.displayed_directory.clone() {
            self.rollback = Some(Checkpoint {
                directory,
                history: self.history.clone(),
            });
        }
    }

    fn start_load(&mut self, path: PathBuf, kind: LoadKind) {
        if matches!(kind, LoadKind::Navigate | LoadKind::Replay) {
            self.last_error = None;
            self.path_text = path.display().to_string();
        } else if kind == LoadKind::Refresh && self.status == SessionStatus::Error {
            self.last_error = None;
        }
        if self.current_directory.as_deref() != Some(path.as_path()) {
            self.stop_watching();
        }
        if kind == LoadKind::Navigate {
            self.history.push(&path);
        }
        self.current_directory = Some(path.clone());

        self.generation += 1;
        let generation = self.generation;
        self.pending_load = Some((generation, kind));
        if kind != LoadKind::Quiet {
            self.status = SessionStatus::Loading;
        }
        log::debug!("{}: loading {} ({:?}, generation {})", self.id, path.display(), kind, generation);

        let provider = Arc::clone(&self.services.provider);
        let tx = self.services.worker_tx.clone();
        let pane_id = self.id;
        self.services.executor.execute(Box::new(move || {
            let result = provider.list_directory(&path);
            if tx
                .send(WorkerMessage::ListingLoaded {
                    pane_id,
                    generation,
                    path,
                    result,
                })
                .is_err()
            {
                log::debug!("{}: listing finished after shutdown", pane_id);
            }
        }));

        if kind != LoadKind::Quiet {
            self.notify_changed();
        }
    }

    // ========================================
    // Background results
    // ========================================

    /// Applies a background result addressed to this pane.
    pub fn handle_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::ListingLoaded {
                generation,
                path,
                result,
                ..
            } => self.apply_listing(generation, path, result),
            WorkerMessage::DirectoryChanged { watch_generation, .. } => self.on_directory_changed(watch_generation),
            WorkerMessage::CollisionsFound {
                kind,
                sources,
                destination,
                conflicting_names,
                ..
            } => self.on_collisions_found(kind, sources, destination, conflicting_names),
            WorkerMessage::OperationFinished { report, .. } => self.finish_operation(report),
        }
    }

    fn apply_listing(&mut self, generation: u64, path: PathBuf, result: Result<Vec<DirectoryEntry>, FsError>) {
        let kind = match self.pending_load {
            Some((pending, kind)) if pending == generation => kind,
            _ => {
                log::debug!(
                    "{}: discarding stale listing of {} (generation {}, latest {})",
                    self.id,
                    path.display(),
                    generation,
                    self.generation
                );
                return;
            }
        };
        self.pending_load = None;

        match result {
            Ok(entries) => {
                if kind == LoadKind::Quiet
                    && self.status == SessionStatus::Ready
                    && compute_diff(&self.raw_entries, &entries).is_empty()
                {
                    log::trace!("{}: no changes in {}", self.id, path.display());
                    return;
                }
                if self.status == SessionStatus::Error {
                    self.last_error = None;
                }
                self.raw_entries = entries;
                self.displayed_directory = Some(path.clone());
                self.rollback = None;
                self.status = SessionStatus::Ready;
                self.recompute();
                self.ensure_watch(&path);
            }
            Err(e) => {
                log::warn!("{}: couldn't list {}: {}", self.id, path.display(), e);
                // Keep the previous entries on screen, and point back at their directory
                self.last_error = Some(e.user_message());
                self.status = SessionStatus::Error;
                if let Some(checkpoint) = self.rollback.take() {
                    self.restore(checkpoint);
                }
            }
        }
        self.notify_changed();
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        log::debug!("{}: back at {}", self.id, checkpoint.directory.display());
        self.path_text = checkpoint.directory.display().to_string();
        self.history = checkpoint.history;
        self.current_directory = Some(checkpoint.directory.clone());
        self.ensure_watch(&checkpoint.directory);
    }

    fn on_directory_changed(&mut self, watch_generation: u64) {
        if self.watch.is_none() || watch_generation != self.watch_generation {
            log::debug!("{}: ignoring change from an old watch", self.id);
            return;
        }
        let Some(path) = self.current_directory.clone() else {
            return;
        };
        let kind = if self.pending_load.is_some() {
            LoadKind::Refresh
        } else {
            LoadKind::Quiet
        };
        self.start_load(path, kind);
    }

    // ========================================
    // Watching
    // ========================================

    /// Makes sure the one watch of this session points at `path`.
    fn ensure_watch(&mut self, path: &Path) {
        if self.watch.as_ref().is_some_and(|w| w.path() == path) {
            return;
        }
        self.stop_watching();
        self.watch_generation += 1;
        let watch_generation = self.watch_generation;
        let pane_id = self.id;
        let tx = self.services.worker_tx.clone();
        let on_change: WatchCallback = Box::new(move || {
            let _ = tx.send(WorkerMessage::DirectoryChanged {
                pane_id,
                watch_generation,
            });
        });
        match self
            .services
            .provider
            .watch(path, self.services.watch_debounce, on_change)
        {
            Ok(watch) => self.watch = Some(watch),
            // Non-fatal: the pane just won't auto-refresh until the next successful load
            Err(e) => log::debug!("{}: couldn't watch {}: {}", self.id, path.display(), e),
        }
    }

    fn stop_watching(&mut self) {
        if let Some(watch) = self.watch.take() {
            log::debug!("{}: stopped watching {}", self.id, watch.path().display());
            self.watch_generation += 1;
        }
    }

    // ========================================
    // Sort and filter
    // ========================================

    /// Changes the sort and re-derives the displayed entries right away.
    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = SortSpec::new(key, direction);
        self.recompute();
        self.notify_changed();
    }

    /// Column-header click: same key flips direction, a new key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        let direction = if self.sort.key == key {
            self.sort.direction.toggled()
        } else {
            SortDirection::Ascending
        };
        self.set_sort(key, direction);
    }

    /// Shows or hides hidden entries. Filters the entries already fetched.
    pub fn set_hide_hidden(&mut self, hide_hidden: bool) {
        if self.hide_hidden == hide_hidden {
            return;
        }
        self.hide_hidden = hide_hidden;
        self.recompute();
        self.notify_changed();
    }

    fn recompute(&mut self) {
        self.displayed_entries = apply_policy(&self.raw_entries, self.hide_hidden, self.sort);
    }

    // ========================================
    // File operations
    // ========================================

    /// Moves items into `destination`, asking once if any names already exist there.
    pub fn move_entries(&mut self, sources: Vec<PathBuf>, destination: &Path) {
        self.start_operation(FileOperationKind::Move, sources, Some(destination.to_path_buf()));
    }

    pub fn copy_entries(&mut self, sources: Vec<PathBuf>, destination: &Path) {
        self.start_operation(FileOperationKind::Copy, sources, Some(destination.to_path_buf()));
    }

    /// Moves items to the trash.
    pub fn delete_entries(&mut self, sources: Vec<PathBuf>) {
        self.start_operation(FileOperationKind::Delete, sources, None);
    }

    /// Creates aliases of the items in the current directory.
    pub fn alias_entries(&mut self, sources: Vec<PathBuf>) {
        let destination = self.current_directory.clone();
        self.start_operation(FileOperationKind::Alias, sources, destination);
    }

    /// Compresses the items into one archive in the current directory.
    pub fn compress_entries(&mut self, sources: Vec<PathBuf>) {
        let destination = self.current_directory.clone();
        self.start_operation(FileOperationKind::Compress, sources, destination);
    }

    fn start_operation(&mut self, kind: FileOperationKind, sources: Vec<PathBuf>, destination: Option<PathBuf>) {
        if sources.is_empty() {
            return;
        }
        if self.pending_operation.is_some() {
            self.last_error = Some("Confirm or cancel the pending operation first.".to_string());
            self.notify_changed();
            return;
        }
        if kind.needs_destination() && destination.is_none() {
            self.last_error = Some("Open a folder first.".to_string());
            self.notify_changed();
            return;
        }

        self.dispatch_operation(kind, sources, destination, false);
    }

    fn on_collisions_found(
        &mut self,
        kind: FileOperationKind,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        conflicting_names: Vec<String>,
    ) {
        self.operations_in_flight = self.operations_in_flight.saturating_sub(1);
        if self.pending_operation.is_some() {
            log::warn!("{}: dropping {:?}, another operation awaits confirmation", self.id, kind);
            self.last_error = Some("Confirm or cancel the pending operation first.".to_string());
            self.notify_changed();
            return;
        }
        self.request_confirmation(kind, sources, destination, conflicting_names);
    }

    /// Raises one confirmation for the whole batch.
    fn request_confirmation(
        &mut self,
        kind: FileOperationKind,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        conflicting_names: Vec<String>,
    ) {
        let folder = display_name(&destination);
        let message = match conflicting_names.as_slice() {
            [only] => format!("\"{}\" already exists in \"{}\". Replace it?", only, folder),
            names => format!("{} items already exist in \"{}\". Replace them?", names.len(), folder),
        };
        let request = ConfirmationRequest {
            operation_id: Uuid::new_v4().to_string(),
            message,
            conflicting_names,
        };
        log::info!(
            "{}: {:?} of {} item(s) needs confirmation ({})",
            self.id,
            kind,
            sources.len(),
            request.operation_id
        );
        self.services.sink.emit(PaneEvent::ConfirmationRequested {
            pane_id: self.id,
            request: request.clone(),
        });
        self.pending_operation = Some(PendingOperation {
            request,
            kind,
            sources,
            destination,
        });
        self.notify_changed();
    }

    /// Resolves the pending confirmation. Returns false if nothing was pending.
    ///
    /// Accepting replaces existing items for the whole batch; cancelling drops the whole batch.
    pub fn confirm_pending(&mut self, accept: bool) -> bool {
        let Some(pending) = self.pending_operation.take() else {
            return false;
        };
        if accept {
            self.dispatch_operation(pending.kind, pending.sources, Some(pending.destination), true);
        } else {
            log::info!("{}: operation {} cancelled", self.id, pending.request.operation_id);
            self.last_message = Some("Operation cancelled.".to_string());
        }
        self.notify_changed();
        true
    }

    fn dispatch_operation(
        &mut self,
        kind: FileOperationKind,
        sources: Vec<PathBuf>,
        destination: Option<PathBuf>,
        overwrite: bool,
    ) {
        self.operations_in_flight += 1;
        let provider = Arc::clone(&self.services.provider);
        let tx = self.services.worker_tx.clone();
        let pane_id = self.id;
        self.services.executor.execute(Box::new(move || {
            // Move and copy look for existing names first; nothing runs until the user confirms
            if !overwrite
                && kind.checks_collisions()
                && let Some(destination) = destination.as_deref()
            {
                let conflicting_names = find_collisions(provider.as_ref(), &sources, destination);
                if !conflicting_names.is_empty() {
                    let message = WorkerMessage::CollisionsFound {
                        pane_id,
                        kind,
                        destination: destination.to_path_buf(),
                        sources,
                        conflicting_names,
                    };
                    if tx.send(message).is_err() {
                        log::debug!("{}: collision scan finished after shutdown", pane_id);
                    }
                    return;
                }
            }
            let report = run_batch(provider.as_ref(), kind, &sources, destination.as_deref(), overwrite);
            if tx.send(WorkerMessage::OperationFinished { pane_id, report }).is_err() {
                log::debug!("{}: operation finished after shutdown", pane_id);
            }
        }));
    }

    fn finish_operation(&mut self, report: OperationReport) {
        self.operations_in_flight = self.operations_in_flight.saturating_sub(1);
        self.refresh();
        let summary = report.summary();
        match report.outcome() {
            OperationOutcome::Nothing | OperationOutcome::AllSucceeded => {
                self.last_error = None;
                self.last_message = Some(summary);
            }
            OperationOutcome::Partial | OperationOutcome::AllFailed => {
                self.last_message = None;
                self.last_error = Some(summary);
            }
        }
        self.services.sink.emit(PaneEvent::OperationCompleted {
            pane_id: self.id,
            report,
        });
        self.notify_changed();
    }

    /// Clears the error and informational messages.
    pub fn dismiss_message(&mut self) {
        self.last_error = None;
        self.last_message = None;
        self.notify_changed();
    }

    // ========================================
    // Observable state
    // ========================================

    pub fn snapshot(&self) -> PaneSnapshot {
        PaneSnapshot {
            pane_id: self.id,
            current_directory: self.current_directory.as_ref().map(|p| p.display().to_string()),
            path_text: self.path_text.clone(),
            displayed_entries: self.displayed_entries.clone(),
            is_loading: self.is_loading(),
            status: self.status,
            last_error: self.last_error.clone(),
            last_message: self.last_message.clone(),
            can_go_back: self.can_go_back(),
            can_go_forward: self.can_go_forward(),
            sort: self.sort,
            hide_hidden: self.hide_hidden,
            pending_confirmation: self.pending_operation.as_ref().map(|p| p.request.clone()),
        }
    }

    fn notify_changed(&self) {
        self.services.sink.emit(PaneEvent::Changed {
            pane_id: self.id,
            snapshot: self.snapshot(),
        });
    }

    fn current_path_text(&self) -> String {
        self.current_directory
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.current_directory.as_deref()
    }

    pub fn path_text(&self) -> &str {
        &self.path_text
    }

    pub fn displayed_entries(&self) -> &[DirectoryEntry] {
        &self.displayed_entries
    }

    pub fn raw_entries(&self) -> &[DirectoryEntry] {
        &self.raw_entries
    }

    /// True while a user-visible listing is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some_and(|(_, kind)| kind != LoadKind::Quiet)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn hide_hidden(&self) -> bool {
        self.hide_hidden
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmationRequest> {
        self.pending_operation.as_ref().map(|p| &p.request)
    }

    /// Number of file operations started but not finished.
    pub fn operations_in_flight(&self) -> usize {
        self.operations_in_flight
    }

    /// Path of the live watch, if any.
    pub fn watched_directory(&self) -> Option<&Path> {
        self.watch.as_ref().map(|w| w.path())
    }
}
