//! Path input validation.
//!
//! Checks typed-in paths locally before a pane navigates to them. The provider is never
//! consulted, so an invalid path can't start a listing.

use std::path::{Component, Path, PathBuf};

use crate::file_system::listing::get_single_entry;

/// Validation error types for a typed-in directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is empty or whitespace-only.
    Empty,
    /// Input isn't an absolute path (after `~` expansion).
    NotAbsolute { input: String },
    /// Nothing exists at the path.
    NotFound { path: String },
    /// Something exists at the path, but it isn't a folder that can be entered.
    NotADirectory { path: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Enter a folder path"),
            Self::NotAbsolute { input } => write!(f, "\"{}\" isn't a full path", input),
            Self::NotFound { path } => write!(f, "There's no folder at \"{}\"", path),
            Self::NotADirectory { path } => write!(f, "\"{}\" isn't a folder", path),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Lexically normalizes a path: drops `.` components and resolves `..` against
/// the preceding component. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.file_name().is_some() {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Expands a leading tilde (~) to the user's home directory.
pub fn expand_tilde(input: &str) -> String {
    if (input == "~" || input.starts_with("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return input.replacen('~', &home.to_string_lossy(), 1);
    }
    input.to_string()
}

/// Resolves typed-in text to an existing, enterable directory.
///
/// Trims the input, expands `~`, requires an absolute path, normalizes it, and checks
/// that it names a directory that isn't an application bundle.
pub fn resolve_directory_input(raw: &str) -> Result<PathBuf, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let expanded = PathBuf::from(expand_tilde(trimmed));
    if !expanded.is_absolute() {
        return Err(ValidationError::NotAbsolute {
            input: trimmed.to_string(),
        });
    }

    let path = normalize_path(&expanded);
    let display = path.display().to_string();
    let entry = get_single_entry(&path).map_err(|_| ValidationError::NotFound { path: display.clone() })?;
    if !entry.is_traversable() {
        return Err(ValidationError::NotADirectory { path: display });
    }

    Ok(path)
}
