//! Per-user application data layout and the settings store.
//!
//! Everything the updater persists lives under one directory:
//!
//! ```text
//! <app-data>/
//! ├── settings.json          # shared settings (see [`settings`])
//! ├── updater.toml           # optional updater tunables
//! └── updates/
//!     ├── <asset> | next-<asset>   # staged download
//!     ├── handoff-<pid>[.exe]      # helper copy of the old executable
//!     ├── update-handoff.json      # handoff plan
//!     ├── update-ready.flag        # readiness flag
//!     └── launch-info.txt          # fallback launch marker
//! ```
//!
//! `<app-data>` is `BINITY_HOME` when set, otherwise `Binity` under the
//! platform's local data directory (`%LOCALAPPDATA%` on Windows,
//! `~/Library/Application Support` on macOS, `$XDG_DATA_HOME` on Linux).

pub mod settings;

pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore, UpdateSettings};

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, HANDOFF_HELPER_PREFIX, HANDOFF_PLAN_NAME, HOME_ENV,
    LAUNCH_INFO_NAME, READINESS_FLAG_NAME, SETTINGS_FILE_NAME, UPDATES_DIR_NAME,
};
use crate::core::{Result, UpdateError};
use crate::utils::platform::EXE_SUFFIX;
use std::path::{Path, PathBuf};

/// Resolved locations of every file the updater reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Root of the per-user application data.
    pub app_data_dir: PathBuf,
    /// Working directory for staged downloads and handoff markers.
    pub updates_dir: PathBuf,
    /// Shared settings file.
    pub settings_file: PathBuf,
    /// Optional updater configuration.
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Lay out the paths under an explicit root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let app_data_dir = root.into();
        Self {
            updates_dir: app_data_dir.join(UPDATES_DIR_NAME),
            settings_file: app_data_dir.join(SETTINGS_FILE_NAME),
            config_file: app_data_dir.join(CONFIG_FILE_NAME),
            app_data_dir,
        }
    }

    /// Resolve the root from `BINITY_HOME` or the platform data directory.
    pub fn discover() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(PathBuf::from(home)));
        }

        let base = dirs::data_local_dir().ok_or_else(|| UpdateError::Settings {
            message: format!(
                "Could not determine the local data directory; set {HOME_ENV} to choose one"
            ),
        })?;
        Ok(Self::new(base.join(APP_DIR_NAME)))
    }

    /// Create the `updates/` directory if missing.
    pub fn ensure_updates_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.updates_dir)
            .map_err(|e| UpdateError::io("create updates directory", &self.updates_dir, e))
    }

    /// Readiness flag written by the helper after relaunching.
    pub fn readiness_flag(&self) -> PathBuf {
        self.updates_dir.join(READINESS_FLAG_NAME)
    }

    /// Marker recording a fallback launch.
    pub fn launch_info(&self) -> PathBuf {
        self.updates_dir.join(LAUNCH_INFO_NAME)
    }

    /// Serialized handoff plan.
    pub fn handoff_plan(&self) -> PathBuf {
        self.updates_dir.join(HANDOFF_PLAN_NAME)
    }

    /// Helper copy of the executable for the process with `pid`.
    pub fn helper_exe(&self, pid: u32) -> PathBuf {
        self.updates_dir.join(format!("{HANDOFF_HELPER_PREFIX}{pid}{EXE_SUFFIX}"))
    }

    /// Whether `path` sits directly inside the `updates/` directory.
    pub fn is_in_updates_dir(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| crate::utils::same_file(parent, &self.updates_dir))
    }
}
