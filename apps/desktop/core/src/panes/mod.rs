//! Panes: per-pane directory sessions and the coordinator that owns them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::file_system::FileSystemProvider;
use crate::runtime::{BackgroundExecutor, EventSink, WorkerMessage};

mod coordinator;
mod history;
mod session;

pub use coordinator::{CoordinatorError, PaneCoordinator};
pub use history::NavigationHistory;
pub use session::{DirectorySession, PaneSnapshot, SessionStatus};

#[cfg(test)]
mod session_test;
#[cfg(test)]
pub(crate) mod test_support;

/// Identifies a pane for its whole lifetime, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(u64);

impl PaneId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

/// Requested layout arity. Not validated against the actual pane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaneLayout {
    #[default]
    Single,
    Double,
    Triple,
    Quad,
}

impl PaneLayout {
    /// Layout that shows `count` panes, clamped to 1..=4.
    pub fn for_count(count: usize) -> Self {
        match count {
            0 | 1 => Self::Single,
            2 => Self::Double,
            3 => Self::Triple,
            _ => Self::Quad,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quad => 4,
        }
    }
}

/// Process-wide services shared by every session.
///
/// Built once by [`crate::init`] and cloned into each pane.
#[derive(Clone)]
pub struct Services {
    pub provider: Arc<dyn FileSystemProvider>,
    pub executor: Arc<dyn BackgroundExecutor>,
    pub sink: Arc<dyn EventSink>,
    /// Where background jobs send their results.
    pub worker_tx: mpsc::UnboundedSender<WorkerMessage>,
    pub watch_debounce: Duration,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("watch_debounce", &self.watch_debounce)
            .finish_non_exhaustive()
    }
}
