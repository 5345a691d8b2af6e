//! Apply, the helper routine and the next startup, with recorded processes.

use crate::common::{Harness, HarnessBuilder, ReleaseFeed};
use binity_updater::constants::{HANDOFF_COMMAND, READY_FLAG_SWITCH, SHOW_AFTER_UPDATE_SWITCH};
use binity_updater::core::{ErrorKind, UpdateError};
use binity_updater::test_utils::{RecordingProcessControl, TEST_PID, handoff_plan_in};
use binity_updater::upgrade::handoff::{HandoffOutcome, HandoffPlan, run_handoff};
use binity_updater::upgrade::startup::{run_startup, strip_startup_switches};
use binity_updater::upgrade::{Activity, StartupReport, UpdaterConfig};
use binity_updater::utils::EXE_SUFFIX;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

async fn packaged_harness(root: &Path) -> Harness {
    // No network is used here; the feed only satisfies the config.
    let feed = ReleaseFeed::start().await;
    HarnessBuilder::new(&feed).build(root)
}

/// Stage "new build" the way the downloader does when the asset collides
/// with the running executable.
fn stage_next(harness: &Harness) -> PathBuf {
    let paths = &harness.runtime.paths;
    paths.ensure_updates_dir().unwrap();
    let staged = paths.updates_dir.join(format!("next-Binity{EXE_SUFFIX}"));
    std::fs::write(&staged, b"new build").unwrap();
    staged
}

/// What the relaunched process sees on its command line.
fn relaunch_args(program: &Path, args: &[OsString]) -> Vec<OsString> {
    std::iter::once(program.as_os_str().to_os_string()).chain(args.iter().cloned()).collect()
}

#[tokio::test]
async fn test_apply_spawns_helper_with_plan() {
    let temp = TempDir::new().unwrap();
    let harness = packaged_harness(temp.path()).await;
    let staged = stage_next(&harness);

    assert!(harness.session.apply_update(&staged).await);
    assert_eq!(harness.session.activity(), Activity::Idle);

    let spawned = harness.process.spawned();
    assert_eq!(spawned.len(), 1);
    let helper = &spawned[0];
    assert_eq!(helper.program, harness.runtime.paths.helper_exe(TEST_PID));
    assert_eq!(helper.args[0], OsString::from(HANDOFF_COMMAND));
    assert_eq!(helper.args[1], OsString::from("--plan"));
    // The helper is a copy of the running executable.
    assert_eq!(std::fs::read(&helper.program).unwrap(), b"old build");

    let plan = HandoffPlan::read(Path::new(&helper.args[2])).unwrap();
    assert_eq!(plan.pid, TEST_PID);
    assert_eq!(plan.staged, staged);
    assert_eq!(plan.final_target, harness.runtime.current_exe);
    assert_eq!(plan.plan_file, harness.runtime.paths.handoff_plan());
}

#[tokio::test]
async fn test_apply_clears_stale_markers() {
    let temp = TempDir::new().unwrap();
    let harness = packaged_harness(temp.path()).await;
    let staged = stage_next(&harness);
    let paths = &harness.runtime.paths;
    std::fs::write(paths.readiness_flag(), b"1").unwrap();
    std::fs::write(paths.launch_info(), b"RUN_TARGET=x\nFINAL_TARGET=y\n").unwrap();

    assert!(harness.session.apply_update(&staged).await);

    assert!(!paths.readiness_flag().exists());
    assert!(!paths.launch_info().exists());
}

#[tokio::test]
async fn test_apply_refused_for_dev_build() {
    let temp = TempDir::new().unwrap();
    let feed = ReleaseFeed::start().await;
    let harness = HarnessBuilder::new(&feed).packaged(false).build(temp.path());
    let staged = stage_next(&harness);

    assert!(!harness.session.apply_update(&staged).await);

    assert!(matches!(harness.session.take_last_error(), Some(UpdateError::NotPackaged)));
    assert!(harness.process.spawned().is_empty());
    assert!(staged.exists());
}

#[tokio::test]
async fn test_apply_spawn_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let harness = packaged_harness(temp.path()).await;
    let staged = stage_next(&harness);
    harness.process.fail_spawns();

    assert!(!harness.session.apply_update(&staged).await);

    let error = harness.session.take_last_error().unwrap();
    assert!(matches!(error, UpdateError::Spawn { .. }));
    assert_eq!(error.kind(), ErrorKind::Environment);
    assert!(!harness.runtime.paths.handoff_plan().exists());
    assert!(!harness.runtime.paths.helper_exe(TEST_PID).exists());
}

#[tokio::test]
async fn test_helper_replaces_and_next_start_sees_update() {
    let temp = TempDir::new().unwrap();
    let harness = packaged_harness(temp.path()).await;
    let staged = stage_next(&harness);
    assert!(harness.session.apply_update(&staged).await);
    let plan = HandoffPlan::read(&harness.runtime.paths.handoff_plan()).unwrap();

    // The helper process: the old pid is gone, replacement succeeds.
    let helper_process = RecordingProcessControl::new();
    let outcome = run_handoff(&plan, &helper_process).await;

    assert!(matches!(outcome, HandoffOutcome::Replaced { .. }));
    assert_eq!(std::fs::read(&harness.runtime.current_exe).unwrap(), b"new build");
    assert!(!staged.exists());
    assert!(!plan.plan_file.exists());
    assert!(!plan.helper_exe.exists());
    assert!(plan.readiness_flag.exists());

    let relaunch = &helper_process.spawned()[0];
    assert_eq!(relaunch.program, harness.runtime.current_exe);
    assert_eq!(relaunch.args[0], OsString::from(SHOW_AFTER_UPDATE_SWITCH));
    assert_eq!(relaunch.args[1], OsString::from(READY_FLAG_SWITCH));

    // The relaunched process strips its switches and consumes the flag.
    let (switches, rest) =
        strip_startup_switches(relaunch_args(&relaunch.program, &relaunch.args));
    assert_eq!(rest.len(), 1);
    assert!(switches.show_after_update);
    let config = UpdaterConfig {
        ready_flag_wait_ms: 100,
        ..UpdaterConfig::default()
    };
    let paths = &harness.runtime.paths;
    let report = run_startup(paths, &harness.runtime.current_exe, &switches, &config).await;
    assert!(report.just_updated);
    assert!(report.show_update_notice);
    assert!(!report.launched_from_fallback);
    assert!(!plan.readiness_flag.exists());

    // Only the first start after an update reports it.
    let again = run_startup(paths, &harness.runtime.current_exe, &Default::default(), &config).await;
    assert_eq!(again, StartupReport::default());
}

#[tokio::test]
async fn test_locked_target_falls_back_to_staged_file() {
    let temp = TempDir::new().unwrap();
    let plan = handoff_plan_in(temp.path());
    // A non-empty directory at the install path defeats every rename.
    std::fs::remove_file(&plan.final_target).unwrap();
    std::fs::create_dir(&plan.final_target).unwrap();
    std::fs::write(plan.final_target.join("lock"), b"x").unwrap();

    let process = RecordingProcessControl::new();
    let outcome = run_handoff(&plan, &process).await;
    assert!(matches!(outcome, HandoffOutcome::FallbackLaunched { .. }));

    let relaunch = &process.spawned()[0];
    assert_eq!(relaunch.program, plan.staged);

    // The new build runs from updates/next-..., which the sweep must keep.
    let (switches, _) = strip_startup_switches(relaunch_args(&relaunch.program, &relaunch.args));
    let paths = binity_updater::config::AppPaths::new(temp.path().join("data"));
    let report = run_startup(&paths, &plan.staged, &switches, &UpdaterConfig::default()).await;

    assert!(report.just_updated);
    assert!(report.launched_from_fallback);
    let record = report.launch_record.unwrap();
    assert_eq!(record.run_target, plan.staged);
    assert_eq!(record.final_target, plan.final_target);
    assert!(plan.staged.exists());
    assert!(!paths.launch_info().exists());
}

#[tokio::test]
async fn test_stuck_process_is_terminated_before_copy() {
    let temp = TempDir::new().unwrap();
    let plan = handoff_plan_in(temp.path());
    let process = RecordingProcessControl::new();
    process.keep_running(plan.pid);

    let outcome = run_handoff(&plan, &process).await;

    assert!(matches!(outcome, HandoffOutcome::Replaced { .. }));
    assert_eq!(process.terminated(), vec![plan.pid]);
    assert_eq!(std::fs::read(&plan.final_target).unwrap(), b"new build");
}

#[tokio::test]
async fn test_failed_relaunch_leaves_no_flag() {
    let temp = TempDir::new().unwrap();
    let plan = handoff_plan_in(temp.path());
    let process = RecordingProcessControl::new();
    process.fail_spawns();

    let outcome = run_handoff(&plan, &process).await;

    assert!(matches!(outcome, HandoffOutcome::LaunchFailed { .. }));
    assert!(!plan.readiness_flag.exists());

    // Without a flag the next start does not claim an update.
    let paths = binity_updater::config::AppPaths::new(temp.path().join("data"));
    let report =
        run_startup(&paths, &plan.final_target, &Default::default(), &UpdaterConfig::default())
            .await;
    assert!(!report.just_updated);
}

#[tokio::test]
async fn test_startup_sweeps_leftovers() {
    let temp = TempDir::new().unwrap();
    let harness = packaged_harness(temp.path()).await;
    let paths = &harness.runtime.paths;
    paths.ensure_updates_dir().unwrap();
    let leftovers = [
        paths.updates_dir.join(format!("next-Binity{EXE_SUFFIX}")),
        paths.updates_dir.join("Binity.tmp"),
        paths.updates_dir.join("Binity.old"),
        paths.helper_exe(999),
    ];
    for file in &leftovers {
        std::fs::write(file, b"x").unwrap();
    }
    let unrelated = paths.updates_dir.join("notes.txt");
    std::fs::write(&unrelated, b"keep").unwrap();

    let report = run_startup(
        paths,
        &harness.runtime.current_exe,
        &Default::default(),
        harness.session.config(),
    )
    .await;

    assert_eq!(report.swept.len(), leftovers.len());
    for file in &leftovers {
        assert!(!file.exists(), "{} survived the sweep", file.display());
    }
    assert!(unrelated.exists());
}
