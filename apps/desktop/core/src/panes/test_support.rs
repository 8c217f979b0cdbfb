//! Shared helpers for pane tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::file_system::{DirectoryEntry, InMemoryFileSystem, SortSpec};
use crate::ignore_poison::IgnorePoison;
use crate::panes::{DirectorySession, PaneCoordinator, PaneId, Services};
use crate::runtime::{BackgroundExecutor, InlineExecutor, Job, RecordingSink, WorkerMessage};

/// Holds jobs until the test runs them, in any order.
#[derive(Default)]
pub(crate) struct QueuedExecutor {
    jobs: Mutex<VecDeque<Job>>,
}

impl QueuedExecutor {
    pub(crate) fn pending(&self) -> usize {
        self.jobs.lock_ignore_poison().len()
    }

    /// Runs the oldest queued job.
    pub(crate) fn run_oldest(&self) -> bool {
        let job = self.jobs.lock_ignore_poison().pop_front();
        job.map(|job| job()).is_some()
    }

    /// Runs the most recently queued job.
    pub(crate) fn run_newest(&self) -> bool {
        let job = self.jobs.lock_ignore_poison().pop_back();
        job.map(|job| job()).is_some()
    }
}

impl BackgroundExecutor for QueuedExecutor {
    fn execute(&self, job: Job) {
        self.jobs.lock_ignore_poison().push_back(job);
    }
}

pub(crate) struct Harness {
    pub fs: InMemoryFileSystem,
    pub sink: Arc<RecordingSink>,
    pub rx: mpsc::UnboundedReceiver<WorkerMessage>,
    pub services: Services,
}

impl Harness {
    pub(crate) fn inline(fs: InMemoryFileSystem) -> Self {
        Self::with_executor(fs, Arc::new(InlineExecutor))
    }

    pub(crate) fn with_executor(fs: InMemoryFileSystem, executor: Arc<dyn BackgroundExecutor>) -> Self {
        let (worker_tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(RecordingSink::default());
        let services = Services {
            provider: Arc::new(fs.clone()),
            executor,
            sink: sink.clone(),
            worker_tx,
            watch_debounce: Duration::from_millis(10),
        };
        Self { fs, sink, rx, services }
    }

    pub(crate) fn session(&self, id: u64) -> DirectorySession {
        DirectorySession::new(PaneId::new(id), self.services.clone(), SortSpec::default(), false)
    }

    pub(crate) fn coordinator(&self) -> PaneCoordinator {
        PaneCoordinator::new(self.services.clone(), SortSpec::default(), false)
    }

    /// Delivers every queued worker message to the session, including ones produced on the way.
    pub(crate) fn pump(&mut self, session: &mut DirectorySession) -> usize {
        let mut delivered = 0;
        while let Ok(message) = self.rx.try_recv() {
            session.handle_message(message);
            delivered += 1;
        }
        delivered
    }
}

/// Names of entries, in order.
pub(crate) fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}
