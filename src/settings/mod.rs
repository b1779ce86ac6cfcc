use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filesystem::{self, FilesystemError};

const SETTINGS_DIR_NAME: &str = "openmw-mod-utils";
const SETTINGS_FILE_NAME: &str = "settings.yaml";

const DEFAULT_RESOURCE_DIR_NAMES: &[&str] = &[
    "bookart", "fonts", "icons", "meshes", "music", "sound", "splash", "textures", "video", "font",
];

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] FilesystemError),
    #[error("Failed to parse YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Folder timestamp window is empty: {min} is after {max}")]
    InvalidDateWindow { min: NaiveDate, max: NaiveDate },
}

/// Top-level application settings, mirroring the layout of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Where mods live on disk.
    #[serde(default)]
    pub core: CoreSettings,
    /// Knobs for classifying resources and parsing folder names.
    #[serde(default)]
    pub parsing: ParsingSettings,
}

/// The `core` section: locations of mods collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreSettings {
    /// Mods roots, each a directory holding one folder per mod. May start with `~`.
    #[serde(default)]
    pub mods_path: Vec<String>,
}

/// The `parsing` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingSettings {
    /// Folder names (case-insensitive) that mark a resource directory.
    pub resource_dir_names: Vec<String>,
    /// Earliest date accepted for a trailing folder-name timestamp.
    pub min_date_folder_timestamp: NaiveDate,
    /// Latest date accepted for a trailing folder-name timestamp.
    pub max_date_folder_timestamp: NaiveDate,
}

impl Default for ParsingSettings {
    fn default() -> Self {
        Self {
            resource_dir_names: DEFAULT_RESOURCE_DIR_NAMES.iter().map(|s| s.to_string()).collect(),
            min_date_folder_timestamp: NaiveDate::from_ymd_opt(2002, 1, 1).unwrap_or_default(),
            max_date_folder_timestamp: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or_default(),
        }
    }
}

impl ParsingSettings {
    /// Returns the resource folder names, lowercased.
    pub fn resource_dir_name_set(&self) -> HashSet<String> {
        self.resource_dir_names.iter().map(|n| n.to_lowercase()).collect()
    }
}

impl CoreSettings {
    /// Returns the configured mods roots with `~` expanded.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError` if a path is empty or cannot be expanded.
    pub fn mods_paths(&self) -> Result<Vec<PathBuf>, FilesystemError> {
        self.mods_path.iter().map(|p| filesystem::expand_home(p)).collect()
    }
}

impl AppSettings {
    /// Parses settings from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: AppSettings = serde_yaml::from_str(content)?;
        settings.validate()
    }

    /// Parses settings from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        let settings: AppSettings = serde_json::from_str(content)?;
        settings.validate()
    }

    /// Reads settings from a file, choosing the format from its extension.
    ///
    /// # Arguments
    ///
    /// * `path` - A `.yaml`, `.yml` or `.json` settings file.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be read, has an unknown
    /// extension, fails to deserialize, or holds an empty date window.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&filesystem::read_file(path)?),
            Some("json") => Self::from_json_str(&filesystem::read_file(path)?),
            _ => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Loads settings from [`default_settings_path`] when that file exists,
    /// falling back to defaults otherwise.
    pub fn load_or_default() -> Result<Self, SettingsError> {
        match default_settings_path() {
            Some(path) if filesystem::file_exists(&path) => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(self) -> Result<Self, SettingsError> {
        let min = self.parsing.min_date_folder_timestamp;
        let max = self.parsing.max_date_folder_timestamp;
        if min > max {
            return Err(SettingsError::InvalidDateWindow { min, max });
        }
        Ok(self)
    }
}

/// Location of the per-user settings file, if a config directory is known.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}
