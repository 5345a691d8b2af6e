//! Full update cycles: check, download, apply, helper, next start.

use crate::common::{HarnessBuilder, ReleaseFeed, asset_name};
use binity_updater::core::ErrorKind;
use binity_updater::test_utils::{RecordingProcessControl, ReleaseFixture, native_executable_bytes};
use binity_updater::upgrade::handoff::{HandoffOutcome, HandoffPlan, run_handoff};
use binity_updater::upgrade::startup::{run_startup, strip_startup_switches};
use std::ffi::OsString;
use tempfile::TempDir;

#[tokio::test]
async fn test_remote_same_as_installed() {
    let feed = ReleaseFeed::start().await;
    let name = asset_name("Binity");
    let asset = feed.serve_asset(&name, native_executable_bytes(1_100_000)).await;
    feed.serve_release(&ReleaseFixture::new("1.0.0").asset(asset), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    assert!(harness.session.check_for_update(true).await.is_none());
    assert!(harness.session.download_update(|_| {}).await.is_none());
    assert!(harness.session.last_error().is_some());
}

#[tokio::test]
async fn test_tiny_asset_is_offered_but_rejected() {
    let feed = ReleaseFeed::start().await;
    let name = asset_name("Binity");
    let asset = feed.serve_asset(&name, native_executable_bytes(50)).await;
    feed.serve_release(&ReleaseFixture::new("1.0.1").asset(asset), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    let info = harness.session.check_for_update(true).await;
    assert_eq!(info.map(|info| info.version), Some("1.0.1".to_string()));

    assert!(harness.session.download_update(|_| {}).await.is_none());
    assert_eq!(harness.session.last_error_kind(), Some(ErrorKind::Integrity));

    let updates_dir = &harness.runtime.paths.updates_dir;
    let leftovers: Vec<_> = std::fs::read_dir(updates_dir)
        .map(|entries| entries.flatten().map(|entry| entry.path()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    assert_eq!(std::fs::read(&harness.runtime.current_exe).unwrap(), b"old build");
}

#[tokio::test]
async fn test_full_update_cycle() {
    let feed = ReleaseFeed::start().await;
    let name = asset_name("Binity");
    let body = native_executable_bytes(1_100_000);
    let asset = feed.serve_asset(&name, body.clone()).await;
    feed.serve_release(&ReleaseFixture::new("v1.0.1").asset(asset), Some(1)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    // Old process: check, download, apply.
    let info = harness.session.check_for_update(false).await.expect("update offered");
    assert_eq!(info.version, "v1.0.1");

    let staged = harness.session.download_update(|_| {}).await.expect("download succeeds");
    assert_eq!(staged.file_name().unwrap(), OsString::from(format!("next-{name}")).as_os_str());

    assert!(harness.session.apply_update(&staged).await);
    let helper = harness.process.spawned().remove(0);

    // Helper process: read the plan it was given and run it.
    let plan = HandoffPlan::read(std::path::Path::new(&helper.args[2])).unwrap();
    let helper_process = RecordingProcessControl::new();
    let outcome = run_handoff(&plan, &helper_process).await;
    assert!(matches!(outcome, HandoffOutcome::Replaced { .. }));

    // New process: started with the switches the helper passed.
    let relaunch = helper_process.spawned().remove(0);
    let argv = std::iter::once(relaunch.program.clone().into_os_string()).chain(relaunch.args);
    let (switches, rest) = strip_startup_switches(argv);
    assert_eq!(rest, vec![relaunch.program.clone().into_os_string()]);

    let report = run_startup(
        &harness.runtime.paths,
        &relaunch.program,
        &switches,
        harness.session.config(),
    )
    .await;

    assert!(report.just_updated);
    assert!(report.show_update_notice);
    assert_eq!(std::fs::read(&harness.runtime.current_exe).unwrap(), body);
    assert!(!staged.exists());
    assert!(!harness.runtime.paths.readiness_flag().exists());
}
