//! The handoff plan: everything the helper process needs, on disk.
//!
//! The plan is the message sent across the process boundary. It is written
//! atomically before the helper starts and deleted by the helper when it
//! finishes.

use crate::core::{Result, UpdateError};
use crate::utils::fs::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parameters of one replacement.
///
/// `staged` and `final_target` are equal only when the download was placed
/// under a name that is not the running executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffPlan {
    /// Process that must exit before the replacement.
    pub pid: u32,
    /// Executable of that process.
    pub current_exe: PathBuf,
    /// Verified download.
    pub staged: PathBuf,
    /// Where the new executable should end up.
    pub final_target: PathBuf,
    /// Helper copy running this plan; removed at the end.
    pub helper_exe: PathBuf,
    /// Written once the new process was started.
    pub readiness_flag: PathBuf,
    /// Written on a fallback launch.
    pub launch_info: PathBuf,
    /// Location of this plan file.
    pub plan_file: PathBuf,
    pub exit_wait_attempts: u32,
    pub exit_wait_interval_ms: u64,
    pub copy_attempts: usize,
    pub copy_retry_delay_ms: u64,
}

impl HandoffPlan {
    /// Whether the staged file has to be copied over the final path.
    pub fn needs_copy(&self) -> bool {
        !crate::utils::same_file(&self.staged, &self.final_target)
    }

    pub const fn exit_wait_interval(&self) -> Duration {
        Duration::from_millis(self.exit_wait_interval_ms)
    }

    pub const fn copy_retry_delay(&self) -> Duration {
        Duration::from_millis(self.copy_retry_delay_ms)
    }

    /// Persist the plan to [`HandoffPlan::plan_file`].
    pub fn write(&self) -> Result<()> {
        let content = serde_json::to_vec_pretty(self).map_err(|e| UpdateError::Settings {
            message: format!("Failed to serialize handoff plan: {e}"),
        })?;
        atomic_write(&self.plan_file, &content).map_err(|e| {
            UpdateError::io("write handoff plan", &self.plan_file, std::io::Error::other(format!("{e:#}")))
        })
    }

    /// Load a plan written by [`HandoffPlan::write`].
    pub fn read(path: &Path) -> Result<Self> {
        let content =
            std::fs::read(path).map_err(|e| UpdateError::io("read handoff plan", path, e))?;
        serde_json::from_slice(&content).map_err(|e| UpdateError::Settings {
            message: format!("Invalid handoff plan {}: {e}", path.display()),
        })
    }
}
