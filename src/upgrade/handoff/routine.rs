//! The handoff routine executed by the helper process.
//!
//! Runs after the old process handed control back to its caller:
//!
//! 1. Wait (bounded) for the old process to exit, then terminate it if it
//!    is still there. Replacement never blocks on a stuck process.
//! 2. Abort if the staged file vanished.
//! 3. Copy the staged file over the final path through a temporary sibling
//!    and a rename, retrying a few times since the file may stay locked for a
//!    moment after exit. On success the staged file is deleted.
//! 4. If the copy failed for good, launch from the staged file instead and
//!    write the launch-info marker.
//! 5. Start the new process with the post-update switches, then write the
//!    readiness flag (it means "launch attempted").
//! 6. Delete the plan and, best effort, the helper's own executable.

use crate::constants::{READY_FLAG_SWITCH, SHOW_AFTER_UPDATE_SWITCH};
use crate::core::{Result, UpdateError};
use crate::upgrade::handoff::plan::HandoffPlan;
use crate::upgrade::handoff::record::LaunchRecord;
use crate::utils::fs::{atomic_write, remove_file_best_effort};
use crate::utils::platform::{inherited_vars_to_strip, set_executable};
use crate::utils::process::ProcessControl;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, error, info, warn};

/// How a handoff ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The final path holds the new build and it was started.
    Replaced { pid: u32 },
    /// The copy failed; the new build runs from its staged location.
    FallbackLaunched { pid: u32 },
    /// Nothing could be started.
    LaunchFailed { run_target: PathBuf, reason: String },
    /// The handoff stopped before touching anything.
    Aborted { reason: String },
}

/// Execute `plan`. Never returns an error; every failure is an outcome.
pub async fn run_handoff(plan: &HandoffPlan, process: &dyn ProcessControl) -> HandoffOutcome {
    info!("Handoff started for pid {}", plan.pid);

    wait_for_exit(plan, process).await;

    let outcome = replace_and_launch(plan, process).await;
    match &outcome {
        HandoffOutcome::Replaced { pid } => info!("Update installed, started pid {pid}"),
        HandoffOutcome::FallbackLaunched { pid } => {
            warn!("Update could not be installed in place, started pid {pid} from staging")
        }
        HandoffOutcome::LaunchFailed { run_target, reason } => {
            error!("Could not start {}: {}", run_target.display(), reason)
        }
        HandoffOutcome::Aborted { reason } => warn!("Handoff aborted: {reason}"),
    }

    remove_file_best_effort(&plan.plan_file);
    remove_file_best_effort(&plan.helper_exe);
    outcome
}

async fn wait_for_exit(plan: &HandoffPlan, process: &dyn ProcessControl) {
    for attempt in 0..plan.exit_wait_attempts {
        if !process.is_running(plan.pid) {
            debug!("pid {} exited after {} polls", plan.pid, attempt);
            return;
        }
        tokio::time::sleep(plan.exit_wait_interval()).await;
    }

    if process.is_running(plan.pid) {
        warn!("pid {} did not exit in time, terminating it", plan.pid);
        process.terminate(plan.pid);
        tokio::time::sleep(plan.exit_wait_interval()).await;
    }
}

async fn replace_and_launch(plan: &HandoffPlan, process: &dyn ProcessControl) -> HandoffOutcome {
    if !plan.staged.is_file() {
        return HandoffOutcome::Aborted {
            reason: format!("staged file {} is missing", plan.staged.display()),
        };
    }

    let installed = if plan.needs_copy() {
        match replace_with_retries(plan).await {
            Ok(()) => {
                remove_file_best_effort(&plan.staged);
                true
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    } else {
        true
    };

    let run_target = if installed {
        plan.final_target.clone()
    } else {
        let record = LaunchRecord::new(&plan.staged, &plan.final_target);
        if let Err(e) = atomic_write(&plan.launch_info, record.to_text().as_bytes()) {
            warn!("Could not write launch info: {e:#}");
        }
        plan.staged.clone()
    };

    let args: Vec<OsString> = vec![
        SHOW_AFTER_UPDATE_SWITCH.into(),
        READY_FLAG_SWITCH.into(),
        plan.readiness_flag.clone().into_os_string(),
    ];

    match process.spawn_detached(&run_target, &args, &inherited_vars_to_strip()) {
        Ok(pid) => {
            if let Err(e) = atomic_write(&plan.readiness_flag, b"1") {
                warn!("Could not write readiness flag: {e:#}");
            }
            if installed {
                HandoffOutcome::Replaced { pid }
            } else {
                HandoffOutcome::FallbackLaunched { pid }
            }
        }
        Err(e) => HandoffOutcome::LaunchFailed {
            run_target,
            reason: e.to_string(),
        },
    }
}

async fn replace_with_retries(plan: &HandoffPlan) -> Result<()> {
    let attempts = plan.copy_attempts.max(1);
    let strategy = FixedInterval::new(plan.copy_retry_delay()).take(attempts - 1);
    let tried = AtomicUsize::new(0);

    let result = Retry::spawn(strategy, || {
        let attempt = tried.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let result = replace_file(&plan.staged, &plan.final_target);
            if let Err(e) = &result {
                debug!("Replace attempt {attempt}/{attempts} failed: {e}");
            }
            result
        }
    })
    .await;

    result.map_err(|e| UpdateError::ReplaceFailed {
        target: plan.final_target.clone(),
        attempts: tried.load(Ordering::SeqCst),
        reason: e.to_string(),
    })
}

/// Copy `source` to a temporary sibling of `target`, then rename it over
/// `target`.
fn replace_file(source: &Path, target: &Path) -> std::io::Result<()> {
    let file_name = target.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    let mut temp_name = file_name;
    temp_name.push(".tmp");
    let temp = target.with_file_name(temp_name);

    let result = std::fs::copy(source, &temp).and_then(|_| std::fs::rename(&temp, target));
    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    } else {
        set_executable(target);
    }
    result
}
