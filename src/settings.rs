use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::overtime::DeskOptions;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeskSettings {
    /// SQLite file; defaults to `overtime.sqlite3` next to the settings.
    pub database_path: Option<PathBuf>,
    pub preserve_pending_writes: bool,
    pub default_filter: String,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            preserve_pending_writes: false,
            default_filter: String::new(),
        }
    }
}

impl DeskSettings {
    pub fn desk_options(&self) -> DeskOptions {
        DeskOptions {
            preserve_pending_writes: self.preserve_pending_writes,
        }
    }
}

/// Directory for settings and the local database: `OVERTIME_DESK_HOME`, or
/// `.overtime-desk` under the working directory.
pub fn desk_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("OVERTIME_DESK_HOME") {
        return Ok(PathBuf::from(home));
    }
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(cwd.join(".overtime-desk"))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DeskSettings>,
}

impl SettingsStore {
    /// Loads `path`. A missing or unreadable-as-JSON file falls back to
    /// defaults; a file that exists but cannot be read is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                DeskSettings::default()
            })
        } else {
            DeskSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> DeskSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: DeskSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &DeskSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
