//! Prepares and starts the handoff from the running process.

use crate::constants::{HANDOFF_COMMAND, STAGED_PREFIX};
use crate::core::{Result, UpdateError};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::handoff::plan::HandoffPlan;
use crate::upgrade::runtime::RuntimeContext;
use crate::utils::fs::remove_file_best_effort;
use crate::utils::platform::inherited_vars_to_strip;
use crate::utils::process::ProcessControl;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the handoff; the UI only calls [`ReplacementOrchestrator::apply`]
/// and then exits.
pub struct ReplacementOrchestrator {
    config: Arc<UpdaterConfig>,
    process: Arc<dyn ProcessControl>,
}

impl ReplacementOrchestrator {
    pub fn new(config: Arc<UpdaterConfig>, process: Arc<dyn ProcessControl>) -> Self {
        Self { config, process }
    }

    /// Where `staged` should end up.
    ///
    /// A `next-` file in the updates directory replaces the running
    /// executable; anything else keeps its own name beside it.
    pub fn final_target(runtime: &RuntimeContext, staged: &Path) -> PathBuf {
        let staged_name = staged.file_name().map(|name| name.to_string_lossy().into_owned());
        let prefixed = staged_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().starts_with(STAGED_PREFIX));

        if prefixed && runtime.paths.is_in_updates_dir(staged) {
            return runtime.current_exe.clone();
        }

        match staged.file_name() {
            Some(name) => runtime.exe_dir().join(name),
            None => runtime.current_exe.clone(),
        }
    }

    /// Build the plan for replacing the running executable with `staged`.
    pub fn plan(&self, runtime: &RuntimeContext, staged: &Path) -> HandoffPlan {
        let paths = &runtime.paths;
        HandoffPlan {
            pid: runtime.pid,
            current_exe: runtime.current_exe.clone(),
            staged: staged.to_path_buf(),
            final_target: Self::final_target(runtime, staged),
            helper_exe: paths.helper_exe(runtime.pid),
            readiness_flag: paths.readiness_flag(),
            launch_info: paths.launch_info(),
            plan_file: paths.handoff_plan(),
            exit_wait_attempts: self.config.exit_wait_attempts,
            exit_wait_interval_ms: self.config.exit_wait_interval_ms,
            copy_attempts: self.config.copy_attempts,
            copy_retry_delay_ms: self.config.copy_retry_delay_ms,
        }
    }

    /// Start the handoff helper for `staged`.
    ///
    /// On success the helper is running and waiting for this process to
    /// exit. The caller must exit soon after; this method does not.
    pub async fn apply(&self, runtime: &RuntimeContext, staged: &Path) -> Result<HandoffPlan> {
        if !runtime.packaged {
            return Err(UpdateError::NotPackaged);
        }
        if !staged.is_file() {
            return Err(UpdateError::StagedFileMissing {
                path: staged.to_path_buf(),
            });
        }

        runtime.paths.ensure_updates_dir()?;
        let plan = self.plan(runtime, staged);
        debug!("Handoff plan: {:?}", plan);

        // A stale flag would make the next start claim a successful update.
        remove_file_best_effort(&plan.readiness_flag);
        remove_file_best_effort(&plan.launch_info);

        tokio::fs::copy(&runtime.current_exe, &plan.helper_exe)
            .await
            .map_err(|e| UpdateError::io("copy handoff helper", &plan.helper_exe, e))?;
        crate::utils::platform::set_executable(&plan.helper_exe);

        if let Err(e) = plan.write() {
            remove_file_best_effort(&plan.helper_exe);
            return Err(e);
        }

        let args: Vec<OsString> = vec![
            HANDOFF_COMMAND.into(),
            "--plan".into(),
            plan.plan_file.clone().into_os_string(),
        ];
        match self.process.spawn_detached(&plan.helper_exe, &args, &inherited_vars_to_strip()) {
            Ok(pid) => {
                info!(
                    "Handoff helper started (pid {pid}): {} -> {}",
                    plan.staged.display(),
                    plan.final_target.display()
                );
                Ok(plan)
            }
            Err(e) => {
                remove_file_best_effort(&plan.plan_file);
                remove_file_best_effort(&plan.helper_exe);
                Err(UpdateError::Spawn {
                    what: "handoff helper".to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
