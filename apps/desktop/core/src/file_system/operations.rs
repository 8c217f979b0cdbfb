//! Batch file operations.
//!
//! Runs one operation over many items through a `FileSystemProvider`, collecting
//! per-item failures instead of stopping at the first one, and summarizes the
//! result in one line for the pane.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use crate::file_system::listing::metadata::display_name;
use crate::file_system::provider::{FileSystemProvider, FsError};

// ============================================================================
// Operation types
// ============================================================================

/// Type of batch operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileOperationKind {
    Move,
    Copy,
    Delete,
    Alias,
    Compress,
}

impl FileOperationKind {
    /// Move and copy ask before replacing same-name items at the destination.
    pub fn checks_collisions(self) -> bool {
        matches!(self, Self::Move | Self::Copy)
    }

    pub fn needs_destination(self) -> bool {
        !matches!(self, Self::Delete)
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::Alias => "create an alias for",
            Self::Compress => "compress",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Move => "Moved",
            Self::Copy => "Copied",
            Self::Delete => "Deleted",
            Self::Alias => "Created aliases for",
            Self::Compress => "Compressed",
        }
    }
}

/// One item that couldn't be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub name: String,
    pub path: String,
    pub message: String,
}

/// How a batch ended overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationOutcome {
    /// The batch was empty.
    Nothing,
    AllSucceeded,
    Partial,
    AllFailed,
}

/// Result of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub operation_id: String,
    pub kind: FileOperationKind,
    pub total: usize,
    /// Paths created by the operation (new locations, aliases, the archive).
    pub created: Vec<String>,
    pub succeeded: usize,
    pub failed: Vec<ItemFailure>,
}

impl OperationReport {
    fn new(kind: FileOperationKind, total: usize) -> Self {
        Self {
            operation_id: Uuid::new_v4().to_string(),
            kind,
            total,
            created: Vec::new(),
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    fn record_failure(&mut self, source: &Path, error: &FsError) {
        self.failed.push(ItemFailure {
            name: display_name(source),
            path: source.display().to_string(),
            message: error.user_message(),
        });
    }

    pub fn outcome(&self) -> OperationOutcome {
        if self.total == 0 {
            OperationOutcome::Nothing
        } else if self.failed.is_empty() {
            OperationOutcome::AllSucceeded
        } else if self.succeeded == 0 {
            OperationOutcome::AllFailed
        } else {
            OperationOutcome::Partial
        }
    }

    /// One human-readable line describing the result.
    pub fn summary(&self) -> String {
        match self.outcome() {
            OperationOutcome::Nothing => format!("Nothing to {}.", self.kind.verb()),
            OperationOutcome::AllSucceeded => {
                format!("{} {}.", self.kind.past_tense(), item_count(self.total))
            }
            OperationOutcome::Partial => {
                let names: Vec<&str> = self.failed.iter().map(|f| f.name.as_str()).collect();
                format!(
                    "{} {} of {}. Failed: {}",
                    self.kind.past_tense(),
                    self.succeeded,
                    item_count(self.total),
                    names.join(", ")
                )
            }
            OperationOutcome::AllFailed => match self.failed.as_slice() {
                [only] if self.total == 1 => {
                    format!("Couldn't {} \"{}\": {}", self.kind.verb(), only.name, only.message)
                }
                _ => format!("Couldn't {} any of the {}.", self.kind.verb(), item_count(self.total)),
            },
        }
    }
}

fn item_count(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", count)
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Names of sources that already exist at the destination.
///
/// Sources already inside `destination` are skipped; they fail as same-location instead.
pub fn find_collisions(provider: &dyn FileSystemProvider, sources: &[PathBuf], destination: &Path) -> Vec<String> {
    sources
        .iter()
        .filter(|source| source.parent() != Some(destination))
        .filter_map(|source| {
            let name = source.file_name()?;
            provider
                .exists(&destination.join(name))
                .then(|| name.to_string_lossy().into_owned())
        })
        .collect()
}

/// Runs `kind` over every source, never aborting the batch on a single failure.
///
/// Compress is all-or-nothing since it produces one archive.
pub fn run_batch(
    provider: &dyn FileSystemProvider,
    kind: FileOperationKind,
    sources: &[PathBuf],
    destination: Option<&Path>,
    overwrite: bool,
) -> OperationReport {
    let start = Instant::now();
    let mut report = OperationReport::new(kind, sources.len());
    if sources.is_empty() {
        return report;
    }

    let destination = match (kind.needs_destination(), destination) {
        (true, None) => {
            let error = FsError::Io("No destination folder".to_string());
            for source in sources {
                report.record_failure(source, &error);
            }
            return report;
        }
        (_, destination) => destination,
    };

    if kind == FileOperationKind::Compress {
        match destination.map(|dest| provider.compress(sources, dest)) {
            Some(Ok(archive)) => {
                report.created.push(archive.display().to_string());
                report.succeeded = sources.len();
            }
            Some(Err(error)) => {
                for source in sources {
                    report.record_failure(source, &error);
                }
            }
            None => {}
        }
    } else {
        for source in sources {
            let result = match (kind, destination) {
                (FileOperationKind::Move, Some(dest)) => provider.move_item(source, dest, overwrite).map(Some),
                (FileOperationKind::Copy, Some(dest)) => provider.copy_item(source, dest, overwrite).map(Some),
                (FileOperationKind::Alias, Some(dest)) => provider.create_alias(source, dest).map(Some),
                _ => provider.delete_item(source).map(|()| None),
            };
            match result {
                Ok(created) => {
                    report.succeeded += 1;
                    if let Some(path) = created {
                        report.created.push(path.display().to_string());
                    }
                }
                Err(error) => {
                    log::debug!("run_batch: {:?} failed for {}: {}", kind, source.display(), error);
                    report.record_failure(source, &error);
                }
            }
        }
    }

    log::info!(
        "Operation {} ({:?}): {} of {} succeeded in {}ms",
        report.operation_id,
        kind,
        report.succeeded,
        report.total,
        start.elapsed().as_millis()
    );
    report
}
