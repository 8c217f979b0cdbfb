//! Background dispatch and presentation events.
//!
//! Blocking filesystem calls run on a `BackgroundExecutor`. Their results come back as
//! `WorkerMessage`s over an unbounded channel that the presentation thread drains, so
//! session state is only ever touched from that one thread. Sessions announce state
//! changes through an `EventSink`.

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::file_system::{DirectoryEntry, FileOperationKind, FsError, OperationReport};
use crate::panes::{PaneId, PaneLayout, PaneSnapshot};

/// Blocking work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking jobs off the presentation thread.
pub trait BackgroundExecutor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs jobs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running in. Must be called from inside a runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl BackgroundExecutor for TokioExecutor {
    fn execute(&self, job: Job) {
        // The join handle isn't needed; results come back over the worker channel
        drop(self.handle.spawn_blocking(job));
    }
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl BackgroundExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Result of background work, addressed to one pane.
#[derive(Debug)]
pub enum WorkerMessage {
    ListingLoaded {
        pane_id: PaneId,
        generation: u64,
        path: PathBuf,
        result: Result<Vec<DirectoryEntry>, FsError>,
    },
    /// The pane's watched directory changed on disk.
    DirectoryChanged { pane_id: PaneId, watch_generation: u64 },
    /// The pre-scan found names that already exist at the destination. Nothing was changed.
    CollisionsFound {
        pane_id: PaneId,
        kind: FileOperationKind,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        conflicting_names: Vec<String>,
    },
    OperationFinished { pane_id: PaneId, report: OperationReport },
}

impl WorkerMessage {
    pub fn pane_id(&self) -> PaneId {
        match self {
            Self::ListingLoaded { pane_id, .. }
            | Self::DirectoryChanged { pane_id, .. }
            | Self::CollisionsFound { pane_id, .. }
            | Self::OperationFinished { pane_id, .. } => *pane_id,
        }
    }
}

/// Confirmation the pane needs before it can go on (aggregated over the whole batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub operation_id: String,
    pub message: String,
    pub conflicting_names: Vec<String>,
}

/// Event sent to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaneEvent {
    /// The pane's observable state changed; re-render from the snapshot.
    #[serde(rename_all = "camelCase")]
    Changed { pane_id: PaneId, snapshot: PaneSnapshot },
    #[serde(rename_all = "camelCase")]
    ConfirmationRequested { pane_id: PaneId, request: ConfirmationRequest },
    #[serde(rename_all = "camelCase")]
    OperationCompleted { pane_id: PaneId, report: OperationReport },
    /// Panes were added, removed, reordered, activated, or the layout changed.
    #[serde(rename_all = "camelCase")]
    PanesChanged {
        pane_ids: Vec<PaneId>,
        active_index: usize,
        layout: PaneLayout,
    },
}

/// Receives presentation events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PaneEvent);
}

/// Forwards events into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PaneEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PaneEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PaneEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("ChannelSink: receiver dropped, event discarded");
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PaneEvent) {}
}

#[cfg(test)]
pub(crate) use recording::RecordingSink;
