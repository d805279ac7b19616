//! User configuration at ~/.config/calsync/config.toml

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PLACEHOLDER_TITLE, DEFAULT_PROVIDER, DEFAULT_SYNC_DAYS, ENV_PREFIX};
use crate::error::{CalSyncError, CalSyncResult};

fn default_sync_days() -> u32 {
    DEFAULT_SYNC_DAYS
}

fn default_placeholder_title() -> String {
    DEFAULT_PLACEHOLDER_TITLE.to_string()
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

/// A participating calendar. The name is only kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Participating calendars, in the order plans are laid out.
    #[serde(default)]
    pub calendars: Vec<CalendarRef>,

    #[serde(default = "default_sync_days")]
    pub sync_days: u32,

    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,

    /// Selects the `calsync-provider-<name>` binary.
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            calendars: Vec::new(),
            sync_days: default_sync_days(),
            placeholder_title: default_placeholder_title(),
            provider: default_provider(),
        }
    }
}

impl SyncConfig {
    pub fn config_path() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> CalSyncResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, then apply `CALSYNC_*` environment overrides.
    pub fn load_from(path: &Path) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }

    pub fn save(&self) -> CalSyncResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> CalSyncResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalSyncError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.calendars.is_empty()
    }

    pub fn validate(&self) -> CalSyncResult<()> {
        let mut ids = self.calendar_ids();
        let total = ids.len();
        ids.sort();
        ids.dedup();

        if ids.len() != total {
            return Err(CalSyncError::Config(
                "A calendar is listed more than once".into(),
            ));
        }
        if ids.len() < 2 {
            return Err(CalSyncError::NotEnoughCalendars(ids.len()));
        }
        if self.sync_days == 0 {
            return Err(CalSyncError::Config("sync_days must be at least 1".into()));
        }

        Ok(())
    }

    pub fn calendar_ids(&self) -> Vec<String> {
        self.calendars.iter().map(|c| c.id.clone()).collect()
    }

    /// Display name for a calendar id, falling back to the id itself.
    pub fn calendar_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.calendars
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or(id)
    }
}
