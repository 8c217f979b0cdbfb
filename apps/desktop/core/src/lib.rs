// Warn on unused code so dead paths surface early
#![warn(unused)]
// Warn on unused dependencies to catch platform-specific cfg mismatches
#![warn(unused_crate_dependencies)]
// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Navigation core for a multi-pane file browser.
//!
//! Each pane is a [`DirectorySession`] that loads listings in the background, keeps
//! back/forward history, watches its directory, and derives the displayed entries
//! through the shared sort/filter policy. A [`PaneCoordinator`] owns one to four
//! sessions and the active-pane pointer.
//!
//! The presentation layer owns the event loop: it drains [`WorkerMessage`]s from the
//! receiver returned by [`init`] and feeds them to [`PaneCoordinator::handle_message`]
//! on its own thread, then re-renders on [`PaneEvent`]s.

#[cfg(test)]
use tempfile as _;

pub mod config;
pub mod file_system;
mod ignore_poison;
pub mod logging;
pub mod panes;
pub mod runtime;
pub mod settings;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

pub use file_system::{
    DefaultDirectory, DirectoryEntry, EntryId, FileOperationKind, FileSystemProvider, FsError, InMemoryFileSystem,
    LocalFileSystem, OperationOutcome, OperationReport, SortDirection, SortKey, SortSpec, apply_policy,
};
pub use panes::{
    CoordinatorError, DirectorySession, PaneCoordinator, PaneId, PaneLayout, PaneSnapshot, Services, SessionStatus,
};
pub use runtime::{BackgroundExecutor, ChannelSink, EventSink, InlineExecutor, PaneEvent, TokioExecutor, WorkerMessage};
pub use settings::{Settings, StartDirectory, load_settings};

/// Composes the services and builds the initial panes from persisted settings.
///
/// Returns the coordinator together with the receiver that carries background results.
/// Both must stay on the presentation thread.
pub fn init(
    settings: &Settings,
    provider: Arc<dyn FileSystemProvider>,
    executor: Arc<dyn BackgroundExecutor>,
    sink: Arc<dyn EventSink>,
) -> (PaneCoordinator, mpsc::UnboundedReceiver<WorkerMessage>) {
    let (worker_tx, worker_rx) = mpsc::unbounded_channel();
    let services = Services {
        provider,
        executor,
        sink,
        worker_tx,
        watch_debounce: Duration::from_millis(settings.watcher_debounce_ms),
    };
    let coordinator = PaneCoordinator::from_settings(services, settings);
    log::info!(
        "Initialized {} pane(s), layout {:?}",
        coordinator.len(),
        coordinator.layout()
    );
    (coordinator, worker_rx)
}
