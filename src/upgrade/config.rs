//! Tunables for the update subsystem.
//!
//! Every field has a default, so an empty or partial `updater.toml` is valid:
//!
//! ```toml
//! release_url = "https://api.github.com/repos/Volfheim/Binity/releases/latest"
//! product_name = "Binity"
//! check_interval_hours = 12
//! download_timeout_secs = 60
//! ```

use crate::config::AppPaths;
use crate::constants::{
    CHECK_INTERVAL_HOURS, CHECK_TIMEOUT, CONFIG_PATH_ENV, DOWNLOAD_CHUNK_SIZE, DOWNLOAD_TIMEOUT,
    MIN_ASSET_SIZE,
};
use crate::utils::platform::EXE_SUFFIX;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration for release checks, downloads and the handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Endpoint returning the latest release object.
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Product name used for asset scoring and the default staged file name.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Suffix an asset must end with to be considered (`.exe` on Windows).
    #[serde(default = "default_asset_suffix")]
    pub asset_suffix: String,

    /// Cooldown between non-forced checks.
    ///
    /// # Default: `12`
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u64,

    /// Hard timeout for the release metadata request.
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,

    /// Connect and per-read timeout for the asset download.
    ///
    /// This bounds stalls, not the total transfer time, so large assets on
    /// slow links still complete.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Smallest file accepted as a real build. Rejects truncated downloads
    /// and placeholder assets.
    #[serde(default = "default_min_asset_size")]
    pub min_asset_size: u64,

    /// Write buffer size for the download stream.
    #[serde(default = "default_download_chunk_size")]
    pub download_chunk_size: usize,

    /// How many times the helper polls for the old process to exit.
    #[serde(default = "default_exit_wait_attempts")]
    pub exit_wait_attempts: u32,

    /// Delay between those polls.
    #[serde(default = "default_exit_wait_interval_ms")]
    pub exit_wait_interval_ms: u64,

    /// Attempts to copy the staged binary over the installed one.
    #[serde(default = "default_copy_attempts")]
    pub copy_attempts: usize,

    /// Delay between copy attempts.
    #[serde(default = "default_copy_retry_delay_ms")]
    pub copy_retry_delay_ms: u64,

    /// How long a relaunched process waits for the readiness flag to appear.
    #[serde(default = "default_ready_flag_wait_ms")]
    pub ready_flag_wait_ms: u64,

    /// Verify SHA-256 when the release publishes a checksum asset.
    ///
    /// Releases without one are accepted on size and signature checks alone.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum_when_published: bool,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            release_url: default_release_url(),
            product_name: default_product_name(),
            asset_suffix: default_asset_suffix(),
            check_interval_hours: default_check_interval_hours(),
            check_timeout_secs: default_check_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            min_asset_size: default_min_asset_size(),
            download_chunk_size: default_download_chunk_size(),
            exit_wait_attempts: default_exit_wait_attempts(),
            exit_wait_interval_ms: default_exit_wait_interval_ms(),
            copy_attempts: default_copy_attempts(),
            copy_retry_delay_ms: default_copy_retry_delay_ms(),
            ready_flag_wait_ms: default_ready_flag_wait_ms(),
            verify_checksum_when_published: default_verify_checksum(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpdaterConfig {
    /// Location of the config file: `BINITY_UPDATER_CONFIG` when set,
    /// otherwise `updater.toml` in the application data directory.
    pub fn path(paths: &AppPaths) -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| paths.config_file.clone())
    }

    /// Load the config for this installation, falling back to defaults when
    /// the file does not exist.
    pub async fn load(paths: &AppPaths) -> Result<Self> {
        let path = Self::path(paths);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            debug!("No updater config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the config from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read updater config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse updater config from {}", path.display()))
    }

    /// Cooldown between non-forced checks.
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours * 3600)
    }

    /// Timeout for the release metadata request.
    pub const fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Connect/read timeout for the asset download.
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Delay between exit polls in the helper.
    pub const fn exit_wait_interval(&self) -> Duration {
        Duration::from_millis(self.exit_wait_interval_ms)
    }

    /// Delay between copy attempts in the helper.
    pub const fn copy_retry_delay(&self) -> Duration {
        Duration::from_millis(self.copy_retry_delay_ms)
    }

    /// Bound on the readiness-flag wait at startup.
    pub const fn ready_flag_wait(&self) -> Duration {
        Duration::from_millis(self.ready_flag_wait_ms)
    }

    /// Staged file name used when the selected asset has no name.
    pub fn default_asset_name(&self) -> String {
        format!("{}{}", self.product_name, self.asset_suffix)
    }
}

fn default_release_url() -> String {
    "https://api.github.com/repos/Volfheim/Binity/releases/latest".to_string()
}

fn default_product_name() -> String {
    "Binity".to_string()
}

fn default_asset_suffix() -> String {
    EXE_SUFFIX.to_string()
}

const fn default_check_interval_hours() -> u64 {
    CHECK_INTERVAL_HOURS
}

const fn default_check_timeout_secs() -> u64 {
    CHECK_TIMEOUT.as_secs()
}

const fn default_download_timeout_secs() -> u64 {
    DOWNLOAD_TIMEOUT.as_secs()
}

const fn default_min_asset_size() -> u64 {
    MIN_ASSET_SIZE
}

const fn default_download_chunk_size() -> usize {
    DOWNLOAD_CHUNK_SIZE
}

const fn default_exit_wait_attempts() -> u32 {
    25
}

const fn default_exit_wait_interval_ms() -> u64 {
    1000
}

const fn default_copy_attempts() -> usize {
    5
}

const fn default_copy_retry_delay_ms() -> u64 {
    1000
}

const fn default_ready_flag_wait_ms() -> u64 {
    3000
}

const fn default_verify_checksum() -> bool {
    true
}

fn default_user_agent() -> String {
    "Binity-Updater".to_string()
}
