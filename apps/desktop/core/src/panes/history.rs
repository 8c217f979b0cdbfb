//! Back/forward navigation history for one pane.

use std::path::{Path, PathBuf};

/// Back stack (ending with the current directory) plus a forward stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    back: Vec<PathBuf>,
    forward: Vec<PathBuf>,
}

impl NavigationHistory {
    /// Records a fresh navigation. Clears the forward stack.
    ///
    /// Re-pushing the current directory is a no-op.
    pub fn push(&mut self, path: &Path) {
        self.forward.clear();
        if self.back.last().map(PathBuf::as_path) != Some(path) {
            self.back.push(path.to_path_buf());
        }
    }

    /// Replaces the whole history with a single directory.
    pub fn reset(&mut self, path: &Path) {
        self.back.clear();
        self.forward.clear();
        self.back.push(path.to_path_buf());
    }

    /// Moves the current directory to the forward stack and returns the new current one.
    pub fn step_back(&mut self) -> Option<PathBuf> {
        if !self.can_go_back() {
            return None;
        }
        let current = self.back.pop()?;
        self.forward.push(current);
        self.back.last().cloned()
    }

    /// Moves the most recent forward entry back onto the back stack and returns it.
    pub fn step_forward(&mut self) -> Option<PathBuf> {
        let next = self.forward.pop()?;
        self.back.push(next.clone());
        Some(next)
    }

    pub fn current(&self) -> Option<&Path> {
        self.back.last().map(PathBuf::as_path)
    }

    pub fn can_go_back(&self) -> bool {
        self.back.len() > 1
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.back.len()
    }
}
