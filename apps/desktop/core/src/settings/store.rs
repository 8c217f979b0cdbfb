//! Settings loading from the persisted JSON files.
//!
//! Read once at startup to set up the initial panes. Never re-read while panes are open.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{
    DEFAULT_WATCH_DEBOUNCE_MS, LEGACY_SETTINGS_FILE, MAX_PANES, MIN_PANES, SETTINGS_DIR_NAME, SETTINGS_FILE,
};
use crate::file_system::{DefaultDirectory, FileSystemProvider, SortDirection, SortKey, SortSpec};

/// Where new panes start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StartDirectory {
    /// A well-known folder ("home", "downloads", "desktop", "documents")
    Default(DefaultDirectory),
    /// An absolute path
    Path(PathBuf),
}

impl Default for StartDirectory {
    fn default() -> Self {
        Self::Default(DefaultDirectory::Home)
    }
}

impl From<String> for StartDirectory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "home" | "" => Self::Default(DefaultDirectory::Home),
            "downloads" => Self::Default(DefaultDirectory::Downloads),
            "desktop" => Self::Default(DefaultDirectory::Desktop),
            "documents" => Self::Default(DefaultDirectory::Documents),
            _ => {
                let path = PathBuf::from(value.trim());
                if path.is_absolute() {
                    Self::Path(path)
                } else {
                    log::warn!("Ignoring relative start directory {:?}, using home", value);
                    Self::Default(DefaultDirectory::Home)
                }
            }
        }
    }
}

impl StartDirectory {
    pub fn resolve(&self, provider: &dyn FileSystemProvider) -> PathBuf {
        match self {
            Self::Default(which) => provider.resolve_default_directory(*which),
            Self::Path(path) => path.clone(),
        }
    }
}

/// User settings that shape the initial panes.
/// Note: Uses serde aliases to support both camelCase (settings-v2.json) and snake_case
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(alias = "startDirectory", default)]
    pub start_directory: StartDirectory,
    #[serde(alias = "paneCount", default = "default_pane_count")]
    pub pane_count: usize,
    #[serde(alias = "sortBy", default)]
    pub sort_by: SortKey,
    #[serde(alias = "sortOrder", default)]
    pub sort_order: SortDirection,
    #[serde(alias = "showHiddenFiles", default = "default_show_hidden")]
    pub show_hidden_files: bool,
    #[serde(alias = "watcher.debounceMs", default = "default_debounce_ms")]
    pub watcher_debounce_ms: u64,
}

fn default_pane_count() -> usize {
    2
}

fn default_show_hidden() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_WATCH_DEBOUNCE_MS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_directory: StartDirectory::default(),
            pane_count: default_pane_count(),
            sort_by: SortKey::Name,
            sort_order: SortDirection::Ascending,
            show_hidden_files: true,
            watcher_debounce_ms: DEFAULT_WATCH_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    /// Pane count clamped to what a window can show.
    pub fn pane_count(&self) -> usize {
        self.pane_count.clamp(MIN_PANES, MAX_PANES)
    }

    pub fn default_sort(&self) -> SortSpec {
        SortSpec::new(self.sort_by, self.sort_order)
    }
}

/// Loads settings from the platform config folder.
/// Returns defaults if no file exists or none can be parsed.
pub fn load_settings() -> Settings {
    match dirs::config_dir() {
        Some(config_dir) => load_settings_from(&config_dir.join(SETTINGS_DIR_NAME)),
        None => {
            log::warn!("No config directory on this platform, using default settings");
            Settings::default()
        }
    }
}

/// Loads settings from `dir`: settings-v2.json first, then the legacy settings.json.
pub fn load_settings_from(dir: &Path) -> Settings {
    let settings_v2_path = dir.join(SETTINGS_FILE);
    if let Ok(contents) = fs::read_to_string(&settings_v2_path) {
        match parse_settings_v2(&contents) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", settings_v2_path.display());
                return settings;
            }
            Err(e) => log::warn!("Couldn't parse {}: {}", settings_v2_path.display(), e),
        }
    }

    let legacy_path = dir.join(LEGACY_SETTINGS_FILE);
    if let Ok(contents) = fs::read_to_string(&legacy_path)
        && let Ok(settings) = serde_json::from_str(&contents)
    {
        log::debug!("Loaded legacy settings from {}", legacy_path.display());
        return settings;
    }

    Settings::default()
}

/// Parse settings-v2.json which uses flat JSON with dot notation keys (like "watcher.debounceMs")
fn parse_settings_v2(contents: &str) -> Result<Settings, serde_json::Error> {
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let defaults = Settings::default();

    let start_directory = json
        .get("startDirectory")
        .and_then(|v| v.as_str())
        .map(|s| StartDirectory::from(s.to_string()))
        .unwrap_or(defaults.start_directory);

    let pane_count = json
        .get("paneCount")
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(defaults.pane_count);

    let sort_by = json
        .get("sortBy")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(defaults.sort_by);

    let sort_order = json
        .get("sortOrder")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(defaults.sort_order);

    let show_hidden_files = json
        .get("showHiddenFiles")
        .and_then(|v| v.as_bool())
        .unwrap_or(defaults.show_hidden_files);

    let watcher_debounce_ms = json
        .get("watcher.debounceMs")
        .and_then(|v| v.as_u64())
        .unwrap_or(defaults.watcher_debounce_ms);

    Ok(Settings {
        start_directory,
        pane_count,
        sort_by,
        sort_order,
        show_hidden_files,
        watcher_debounce_ms,
    })
}
