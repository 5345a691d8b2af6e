//! Startup-time bookkeeping for the update lifecycle.
//!
//! Every process start runs [`run_startup`] once, before any check:
//!
//! - a readiness flag left by the handoff helper is consumed and marks the
//!   run as "just updated";
//! - a launch-info marker is consumed and tells whether the new build runs
//!   from a temporary location;
//! - leftovers of earlier, possibly crashed, updates are swept from
//!   `updates/`.
//!
//! The post-update switches are stripped from the argument list first with
//! [`strip_startup_switches`] so normal argument parsing never sees them.

use crate::config::AppPaths;
use crate::constants::{HANDOFF_HELPER_PREFIX, READY_FLAG_SWITCH, SHOW_AFTER_UPDATE_SWITCH, STAGED_PREFIX};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::handoff::LaunchRecord;
use crate::utils::backoff::exponential_backoff_with_delay;
use crate::utils::fs::remove_file_best_effort;
use crate::utils::same_file;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Leftover patterns removed from `updates/` at startup.
const SWEEP_PATTERNS: [&str; 4] = ["next-*", "*.tmp", "*.old", "handoff-*"];

/// Post-update switches found on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupSwitches {
    /// `--show-after-update` was passed.
    pub show_after_update: bool,
    /// Path given with `--update-ready-flag`.
    pub ready_flag: Option<PathBuf>,
}

/// Remove the post-update switches from `args`.
///
/// The first element (the program name) is always kept. Both
/// `--update-ready-flag <path>` and `--update-ready-flag=<path>` are accepted;
/// a trailing `--update-ready-flag` without a value is dropped.
pub fn strip_startup_switches<I>(args: I) -> (StartupSwitches, Vec<OsString>)
where
    I: IntoIterator<Item = OsString>,
{
    let mut switches = StartupSwitches::default();
    let mut remaining = Vec::new();
    let mut iter = args.into_iter();

    if let Some(program) = iter.next() {
        remaining.push(program);
    }

    let flag_prefix = format!("{READY_FLAG_SWITCH}=");
    while let Some(arg) = iter.next() {
        let text = arg.to_string_lossy().into_owned();
        if text == SHOW_AFTER_UPDATE_SWITCH {
            switches.show_after_update = true;
        } else if text == READY_FLAG_SWITCH {
            switches.ready_flag = iter.next().map(PathBuf::from);
        } else if let Some(path) = text.strip_prefix(&flag_prefix) {
            if !path.is_empty() {
                switches.ready_flag = Some(PathBuf::from(path));
            }
        } else {
            remaining.push(arg);
        }
    }

    (switches, remaining)
}

/// What startup found on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// A readiness flag was consumed: this run follows an update.
    pub just_updated: bool,
    /// The UI should show a "successfully updated" notice.
    pub show_update_notice: bool,
    /// The new build runs from its staged location, not its install path.
    pub launched_from_fallback: bool,
    /// Contents of the launch-info marker, when one was present.
    pub launch_record: Option<LaunchRecord>,
    /// Leftover files that were deleted.
    pub swept: Vec<PathBuf>,
}

/// Consume the handoff markers and sweep leftovers.
///
/// Never fails; every file problem is logged and skipped.
pub async fn run_startup(
    paths: &AppPaths,
    current_exe: &Path,
    switches: &StartupSwitches,
    config: &UpdaterConfig,
) -> StartupReport {
    let mut report = StartupReport::default();

    let requested = requested_flag(paths, switches);
    let flag = requested.clone().unwrap_or_else(|| paths.readiness_flag());
    if requested.is_some() {
        wait_for_flag(&flag, config).await;
    }
    if consume(&flag) {
        info!("Readiness flag found, this run follows an update");
        report.just_updated = true;
    }
    // The requested flag may carry another name; the default one is consumed
    // too so it cannot fire on a later start.
    if requested.is_some() && consume(&paths.readiness_flag()) {
        report.just_updated = true;
    }
    report.show_update_notice = report.just_updated || switches.show_after_update;

    if let Some(record) = consume_launch_info(&paths.launch_info()) {
        if record.is_fallback() {
            warn!(
                "Running from {} instead of {}",
                record.run_target.display(),
                record.final_target.display()
            );
            report.launched_from_fallback = true;
        }
        report.launch_record = Some(record);
    }

    report.swept = sweep_leftovers(&paths.updates_dir, current_exe);
    report
}

/// The flag named by `--update-ready-flag`, when it lives directly in
/// `updates/`. Any other path is ignored and never deleted.
fn requested_flag(paths: &AppPaths, switches: &StartupSwitches) -> Option<PathBuf> {
    let requested = switches.ready_flag.as_ref()?;
    let in_updates_dir = requested.parent().is_some_and(|parent| {
        !parent.as_os_str().is_empty() && same_file(parent, &paths.updates_dir)
    });
    if in_updates_dir {
        Some(requested.clone())
    } else {
        warn!(
            "Ignoring readiness flag outside {}: {}",
            paths.updates_dir.display(),
            requested.display()
        );
        None
    }
}

/// Poll for the flag with a capped backoff. The helper writes it right after
/// spawning this process, so it may not exist yet.
async fn wait_for_flag(flag: &Path, config: &UpdaterConfig) {
    let deadline = Instant::now() + config.ready_flag_wait();
    let mut attempt = 0;
    while !flag.exists() {
        if Instant::now() >= deadline {
            debug!("Readiness flag {} did not appear", flag.display());
            return;
        }
        attempt = exponential_backoff_with_delay(attempt).await;
    }
}

/// Delete `path` if it exists. Returns whether it existed.
fn consume(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    remove_file_best_effort(path);
    true
}

fn consume_launch_info(path: &Path) -> Option<LaunchRecord> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            consume(path);
            return None;
        }
    };
    consume(path);

    let record = LaunchRecord::parse(&text);
    if record.is_none() {
        debug!("Ignoring malformed launch info: {text:?}");
    }
    record
}

/// Delete leftover staging, temp and helper files from `updates_dir`.
///
/// The running executable is never deleted, even when it matches a pattern
/// (a fallback launch runs from a `next-` file).
pub fn sweep_leftovers(updates_dir: &Path, current_exe: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    if !updates_dir.is_dir() {
        return removed;
    }

    let base = glob::Pattern::escape(&updates_dir.to_string_lossy());
    for pattern in SWEEP_PATTERNS {
        let full = format!("{base}/{pattern}");
        let entries = match glob::glob(&full) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Bad sweep pattern {full}: {e}");
                continue;
            }
        };

        for path in entries.flatten() {
            if !path.is_file() || removed.contains(&path) || same_file(&path, current_exe) {
                continue;
            }
            if remove_file_best_effort(&path) {
                debug!("Swept {}", path.display());
                removed.push(path);
            }
        }
    }

    if !removed.is_empty() {
        info!(
            "Removed {} leftover update file(s) ({STAGED_PREFIX}*, {HANDOFF_HELPER_PREFIX}*, temp)",
            removed.len()
        );
    }
    removed
}
