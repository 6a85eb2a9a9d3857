use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ingest::{IngestOptions, DEFAULT_DISPLAY_MAX_EDGE};
use crate::input::ZoomModifier;
use crate::removal::{default_removal_command, RemovalSettings, DEFAULT_REMOVAL_MAX_EDGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "cutout";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub zoom_modifier: ZoomModifier,
    #[serde(default)]
    pub mirror_views: Option<bool>,
    #[serde(default)]
    pub removal_command: Option<Vec<String>>,
    #[serde(default)]
    pub removal_max_edge: Option<u32>,
    #[serde(default)]
    pub display_max_edge: Option<u32>,
    #[serde(default)]
    pub force_removal: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn mirror_views(&self) -> bool {
        self.mirror_views.unwrap_or(true)
    }

    pub fn removal_command(&self) -> Vec<String> {
        self.removal_command
            .clone()
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(default_removal_command)
    }

    pub fn removal_settings(&self) -> RemovalSettings {
        RemovalSettings {
            max_edge: self
                .removal_max_edge
                .filter(|edge| *edge > 0)
                .unwrap_or(DEFAULT_REMOVAL_MAX_EDGE),
            force: self.force_removal,
        }
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            display_max_edge: self
                .display_max_edge
                .filter(|edge| *edge > 0)
                .unwrap_or(DEFAULT_DISPLAY_MAX_EDGE),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(%err, "config path unavailable; using defaults");
            return AppConfig::default();
        }
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
