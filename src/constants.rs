//! Global constants used throughout the updater.
//!
//! File names inside the `updates/` working directory, startup switches and
//! the numeric limits shared between the current process and the handoff
//! helper live here so both sides of the process boundary agree on them.

use std::time::Duration;

/// Directory name under the per-user local data directory.
pub const APP_DIR_NAME: &str = "Binity";

/// Name of the per-user working directory that holds staged downloads and
/// handoff markers.
pub const UPDATES_DIR_NAME: &str = "updates";

/// Readiness flag written by the handoff helper once the new process was spawned.
pub const READINESS_FLAG_NAME: &str = "update-ready.flag";

/// Launch-info marker written by the handoff helper on a fallback launch.
pub const LAUNCH_INFO_NAME: &str = "launch-info.txt";

/// Serialized handoff plan consumed by the helper process.
pub const HANDOFF_PLAN_NAME: &str = "update-handoff.json";

/// File name prefix of the helper copy of the running executable.
pub const HANDOFF_HELPER_PREFIX: &str = "handoff-";

/// Prefix applied to a staged download that would otherwise collide with the
/// running executable.
pub const STAGED_PREFIX: &str = "next-";

/// Settings file stored in the application data directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Optional updater configuration stored in the application data directory.
pub const CONFIG_FILE_NAME: &str = "updater.toml";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "BINITY_HOME";

/// Environment variable overriding the updater configuration path.
pub const CONFIG_PATH_ENV: &str = "BINITY_UPDATER_CONFIG";

/// Environment variable forcing packaged-build detection (`0` or `1`).
pub const PACKAGED_ENV: &str = "BINITY_PACKAGED";

/// Startup switch asking the new process to show a "successfully updated" notice.
pub const SHOW_AFTER_UPDATE_SWITCH: &str = "--show-after-update";

/// Startup switch carrying the readiness flag path to the new process.
pub const READY_FLAG_SWITCH: &str = "--update-ready-flag";

/// Hidden subcommand executed by the helper copy.
pub const HANDOFF_COMMAND: &str = "__handoff";

/// Downloads smaller than this are treated as truncated or placeholder files.
pub const MIN_ASSET_SIZE: u64 = 1_000_000;

/// Assets larger than this receive a small score bonus during selection.
pub const LARGE_ASSET_THRESHOLD: u64 = 1_000_000;

/// Buffer size used when streaming a download to disk (256 KiB).
pub const DOWNLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Minimum time between two unforced update checks.
pub const CHECK_INTERVAL_HOURS: u64 = 12;

/// Timeout for fetching release metadata.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// Connect and read timeout for the asset download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;
