//! Temporary installs for tests
//!
//! Lays out a fake installation under a temporary root:
//!
//! ```text
//! <root>/
//! ├── install/Binity[.exe]    # "running" executable
//! └── data/                   # application data (AppPaths root)
//!     └── updates/
//! ```

use crate::config::AppPaths;
use crate::upgrade::handoff::HandoffPlan;
use crate::upgrade::runtime::RuntimeContext;
use crate::utils::platform::EXE_SUFFIX;
use std::path::Path;

/// Pid used for the fake running process. Never reported as running by
/// [`RecordingProcessControl`](super::RecordingProcessControl) unless asked.
pub const TEST_PID: u32 = 4242;

/// Runtime context for a fake install at `root`, running version `1.0.0`.
pub fn test_runtime(root: &Path, packaged: bool) -> RuntimeContext {
    test_runtime_with_version(root, packaged, "1.0.0")
}

pub fn test_runtime_with_version(root: &Path, packaged: bool, version: &str) -> RuntimeContext {
    let install = root.join("install");
    std::fs::create_dir_all(&install).unwrap();
    let current_exe = install.join(format!("Binity{EXE_SUFFIX}"));
    if !current_exe.exists() {
        std::fs::write(&current_exe, b"old build").unwrap();
    }

    RuntimeContext {
        current_exe,
        pid: TEST_PID,
        packaged,
        current_version: version.to_string(),
        paths: AppPaths::new(root.join("data")),
    }
}

/// A written handoff plan for a fake install at `root`.
///
/// The final executable holds `old build`, the staged `next-` file holds
/// `new build`, and all waits are a millisecond.
pub fn handoff_plan_in(root: &Path) -> HandoffPlan {
    let runtime = test_runtime(root, true);
    let paths = &runtime.paths;
    paths.ensure_updates_dir().unwrap();

    let staged = paths.updates_dir.join(format!("next-Binity{EXE_SUFFIX}"));
    std::fs::write(&staged, b"new build").unwrap();
    let helper_exe = paths.helper_exe(runtime.pid);
    std::fs::write(&helper_exe, b"helper").unwrap();

    let plan = HandoffPlan {
        pid: runtime.pid,
        current_exe: runtime.current_exe.clone(),
        staged,
        final_target: runtime.current_exe.clone(),
        helper_exe,
        readiness_flag: paths.readiness_flag(),
        launch_info: paths.launch_info(),
        plan_file: paths.handoff_plan(),
        exit_wait_attempts: 2,
        exit_wait_interval_ms: 1,
        copy_attempts: 3,
        copy_retry_delay_ms: 1,
    };
    plan.write().unwrap();
    plan
}
