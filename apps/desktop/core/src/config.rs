//! Configuration constants for Quadrant.
//!
//! User-adjustable values live in `settings`; these are the fixed limits and names.

/// Most panes a window can show.
pub const MAX_PANES: usize = 4;

/// A window always keeps at least one pane.
pub const MIN_PANES: usize = 1;

/// Default debounce for directory watchers, in milliseconds.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 200;

/// Directory extensions that are presented as opaque files (opened, not entered).
pub const BUNDLE_EXTENSIONS: &[&str] = &["app", "bundle", "plugin", "kext"];

/// Folder under the platform config dir that holds the settings files.
pub const SETTINGS_DIR_NAME: &str = "quadrant";

/// Current settings file (flat JSON with dot-notation keys).
pub const SETTINGS_FILE: &str = "settings-v2.json";

/// Older nested settings file, read only when the current one is missing or broken.
pub const LEGACY_SETTINGS_FILE: &str = "settings.json";

/// Base name for archives created from more than one item.
pub const ARCHIVE_BASE_NAME: &str = "Archive";
