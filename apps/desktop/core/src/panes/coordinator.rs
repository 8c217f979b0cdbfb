//! Pane coordinator: owns one to four sessions and the active-pane pointer.

use std::path::Path;
use tokio::sync::mpsc;

use crate::config::{MAX_PANES, MIN_PANES};
use crate::file_system::SortSpec;
use crate::panes::{DirectorySession, PaneId, PaneLayout, Services};
use crate::runtime::{PaneEvent, WorkerMessage};
use crate::settings::Settings;

/// Error type for pane collection changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Already showing the maximum number of panes
    PaneLimitReached,
    /// The last pane can't be removed
    LastPane,
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaneLimitReached => write!(f, "Can't show more than {} panes", MAX_PANES),
            Self::LastPane => write!(f, "Can't close the last pane"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Pane index {} is out of range (have {})", index, len)
            }
        }
    }
}

impl std::error::Error for CoordinatorError {}

/// Ordered collection of directory sessions.
///
/// Never empty once a pane has been added. `active_index` always points at a pane.
pub struct PaneCoordinator {
    services: Services,
    sessions: Vec<DirectorySession>,
    active_index: usize,
    layout: PaneLayout,
    next_id: u64,
    default_sort: SortSpec,
    default_hide_hidden: bool,
}

impl PaneCoordinator {
    /// Creates an empty coordinator. New panes start with the given sort and hidden toggle.
    pub fn new(services: Services, default_sort: SortSpec, default_hide_hidden: bool) -> Self {
        Self {
            services,
            sessions: Vec::new(),
            active_index: 0,
            layout: PaneLayout::Single,
            next_id: 1,
            default_sort,
            default_hide_hidden,
        }
    }

    /// Builds the initial panes from persisted settings, all at the start directory.
    pub fn from_settings(services: Services, settings: &Settings) -> Self {
        let start = settings.start_directory.resolve(services.provider.as_ref());
        let mut coordinator = Self::new(services, settings.default_sort(), !settings.show_hidden_files);
        let count = settings.pane_count();
        for _ in 0..count {
            if let Err(e) = coordinator.add_pane(&start) {
                log::warn!("Couldn't create initial pane: {}", e);
                break;
            }
        }
        coordinator.layout = PaneLayout::for_count(count);
        coordinator.active_index = 0;
        coordinator
    }

    // ========================================
    // Pane collection
    // ========================================

    /// Appends a pane that starts loading `initial_path`. The first pane becomes active.
    pub fn add_pane(&mut self, initial_path: &Path) -> Result<PaneId, CoordinatorError> {
        if self.sessions.len() >= MAX_PANES {
            return Err(CoordinatorError::PaneLimitReached);
        }
        let id = PaneId::new(self.next_id);
        self.next_id += 1;

        let mut session = DirectorySession::new(id, self.services.clone(), self.default_sort, self.default_hide_hidden);
        session.load_directory(initial_path);
        self.sessions.push(session);
        if self.sessions.len() == 1 {
            self.active_index = 0;
        }
        log::info!("Added {} at {} ({} pane(s))", id, initial_path.display(), self.sessions.len());
        self.notify_panes_changed();
        Ok(id)
    }

    /// Removes a pane. Its watch stops with it.
    ///
    /// The active index stays put if still valid, otherwise moves to the new last pane.
    pub fn remove_pane(&mut self, index: usize) -> Result<(), CoordinatorError> {
        self.check_index(index)?;
        if self.sessions.len() <= MIN_PANES {
            return Err(CoordinatorError::LastPane);
        }
        let removed = self.sessions.remove(index);
        if self.active_index >= self.sessions.len() {
            self.active_index = self.sessions.len() - 1;
        }
        log::info!("Removed {} ({} pane(s) left)", removed.id(), self.sessions.len());
        self.notify_panes_changed();
        Ok(())
    }

    /// Makes a pane active. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) {
        if index >= self.sessions.len() || index == self.active_index {
            return;
        }
        self.active_index = index;
        self.notify_panes_changed();
    }

    /// Swaps two panes. The active session stays active wherever it lands.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), CoordinatorError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        self.sessions.swap(from, to);
        if self.active_index == from {
            self.active_index = to;
        } else if self.active_index == to {
            self.active_index = from;
        }
        self.notify_panes_changed();
        Ok(())
    }

    /// Records the requested layout. Not checked against the pane count.
    pub fn set_layout(&mut self, layout: PaneLayout) {
        if self.layout != layout {
            self.layout = layout;
            self.notify_panes_changed();
        }
    }

    fn check_index(&self, index: usize) -> Result<(), CoordinatorError> {
        if index < self.sessions.len() {
            Ok(())
        } else {
            Err(CoordinatorError::IndexOutOfRange {
                index,
                len: self.sessions.len(),
            })
        }
    }

    fn notify_panes_changed(&self) {
        self.services.sink.emit(PaneEvent::PanesChanged {
            pane_ids: self.pane_ids(),
            active_index: self.active_index,
            layout: self.layout,
        });
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.sessions.iter().map(DirectorySession::id).collect()
    }

    pub fn active(&self) -> Option<&DirectorySession> {
        self.sessions.get(self.active_index)
    }

    pub fn active_mut(&mut self) -> Option<&mut DirectorySession> {
        self.sessions.get_mut(self.active_index)
    }

    pub fn session(&self, index: usize) -> Option<&DirectorySession> {
        self.sessions.get(index)
    }

    pub fn session_mut(&mut self, index: usize) -> Option<&mut DirectorySession> {
        self.sessions.get_mut(index)
    }

    pub fn session_by_id_mut(&mut self, id: PaneId) -> Option<&mut DirectorySession> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    pub fn sessions(&self) -> &[DirectorySession] {
        &self.sessions
    }

    // ========================================
    // Background results
    // ========================================

    /// Routes a background result to its pane. Results for removed panes are dropped.
    pub fn handle_message(&mut self, message: WorkerMessage) {
        let pane_id = message.pane_id();
        match self.session_by_id_mut(pane_id) {
            Some(session) => session.handle_message(message),
            None => log::debug!("Dropping message for removed {}", pane_id),
        }
    }

    /// Handles every message already waiting. Returns how many were handled.
    pub fn drain(&mut self, receiver: &mut mpsc::UnboundedReceiver<WorkerMessage>) -> usize {
        let mut handled = 0;
        while let Ok(message) = receiver.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Waits for the next message and handles it. Returns false if the channel is closed.
    pub async fn next_message(&mut self, receiver: &mut mpsc::UnboundedReceiver<WorkerMessage>) -> bool {
        match receiver.recv().await {
            Some(message) => {
                self.handle_message(message);
                true
            }
            None => false,
        }
    }
}
