//! Release checks through `UpdateSession::check_for_update`.

use crate::common::{HarnessBuilder, ReleaseFeed, asset_name};
use binity_updater::config::UpdateSettings;
use binity_updater::core::ErrorKind;
use binity_updater::test_utils::{AssetFixture, ReleaseFixture};
use binity_updater::upgrade::StartupReport;
use chrono::{Duration, Utc};
use tempfile::TempDir;

fn newer_release(feed: &ReleaseFeed, tag: &str) -> ReleaseFixture {
    let name = asset_name("Binity");
    ReleaseFixture::new(tag).asset(AssetFixture::new(&name, 2_000_000, feed.asset_url(&name)))
}

#[tokio::test]
async fn test_forced_check_finds_newer_release() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v3.3.2"), Some(1)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).version("3.3.1").build(temp.path());

    let info = harness.session.check_for_update(true).await.expect("update offered");

    assert_eq!(info.version, "v3.3.2");
    assert_eq!(info.asset_name, asset_name("Binity"));
    assert_eq!(info.release_notes, "Release v3.3.2");
    assert_eq!(harness.session.info(), Some(info));
    assert!(harness.session.last_error().is_none());
}

#[tokio::test]
async fn test_same_version_is_not_offered() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v3.3.1"), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).version("3.3.1").build(temp.path());

    assert!(harness.session.check_for_update(true).await.is_none());
    assert!(harness.session.last_error().is_none());
    // A successful check is recorded even without an offer.
    assert!(UpdateSettings::new(harness.settings.as_ref()).last_check().is_some());
}

#[tokio::test]
async fn test_skipped_version_only_offered_when_forced() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v3.3.2"), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).version("3.3.1").build(temp.path());
    UpdateSettings::new(harness.settings.as_ref()).set_skipped_version("v3.3.2").unwrap();

    assert!(harness.session.check_for_update(false).await.is_none());

    let forced = harness.session.check_for_update(true).await;
    assert_eq!(forced.map(|info| info.version), Some("v3.3.2".to_string()));
}

#[tokio::test]
async fn test_skip_version_suppresses_next_check() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v3.3.2"), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed)
        .version("3.3.1")
        .config(|config| config.check_interval_hours = 0)
        .build(temp.path());

    assert!(harness.session.check_for_update(true).await.is_some());
    assert!(harness.session.skip_version());
    assert!(harness.session.info().is_none());

    assert!(harness.session.check_for_update(false).await.is_none());
}

#[tokio::test]
async fn test_cooldown_avoids_network() {
    let feed = ReleaseFeed::start().await;
    // Only the first check may reach the server.
    feed.serve_release(&newer_release(&feed, "v1.0.1"), Some(1)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    let first = harness.session.check_for_update(false).await;
    assert!(first.is_some());

    // Inside the 12 hour window the cached offer comes back untouched.
    let second = harness.session.check_for_update(false).await;
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_expired_cooldown_checks_again() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v1.0.1"), Some(1)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());
    UpdateSettings::new(harness.settings.as_ref())
        .set_last_check(Utc::now() - Duration::hours(13))
        .unwrap();

    assert!(harness.session.check_for_update(false).await.is_some());
}

#[tokio::test]
async fn test_background_check_suppressed_after_update() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v1.0.1"), Some(0)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed)
        .startup(StartupReport {
            just_updated: true,
            show_update_notice: true,
            ..StartupReport::default()
        })
        .build(temp.path());

    assert!(harness.session.check_for_update(false).await.is_none());
}

#[tokio::test]
async fn test_background_check_suppressed_for_dev_build() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v1.0.1"), Some(1)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).packaged(false).build(temp.path());

    assert!(harness.session.check_for_update(false).await.is_none());
    // A manual check still works so developers can see the offer.
    assert!(harness.session.check_for_update(true).await.is_some());
}

#[tokio::test]
async fn test_auto_check_toggle() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&newer_release(&feed, "v1.0.1"), Some(0)).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());
    UpdateSettings::new(harness.settings.as_ref()).set_auto_check_enabled(false).unwrap();

    assert!(harness.session.check_for_update(false).await.is_none());
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let feed = ReleaseFeed::start().await;
    feed.serve_status(503).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    assert!(harness.session.check_for_update(true).await.is_none());
    assert_eq!(harness.session.last_error_kind(), Some(ErrorKind::Transport));
    assert!(harness.session.last_error().unwrap().contains("503"));
    assert!(UpdateSettings::new(harness.settings.as_ref()).last_check().is_none());
}

#[tokio::test]
async fn test_asset_with_version_hint_wins() {
    let feed = ReleaseFeed::start().await;
    let release = ReleaseFixture::new("v3.2.1")
        .asset(AssetFixture::new("Setup.exe", 3_000_000, feed.asset_url("Setup.exe")))
        .asset(AssetFixture::new("App-3.2.1.exe", 2_000_000, feed.asset_url("App-3.2.1.exe")))
        .asset(AssetFixture::new("App.exe", 2_000_000, feed.asset_url("App.exe")));
    feed.serve_release(&release, None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed)
        .config(|config| {
            config.product_name = "App".to_string();
            config.asset_suffix = ".exe".to_string();
        })
        .build(temp.path());

    let info = harness.session.check_for_update(true).await.unwrap();
    assert_eq!(info.asset_name, "App-3.2.1.exe");
    assert_eq!(info.download_url, feed.asset_url("App-3.2.1.exe"));
}

#[tokio::test]
async fn test_release_without_assets() {
    let feed = ReleaseFeed::start().await;
    feed.serve_release(&ReleaseFixture::new("v9.0.0").body(None), None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    assert!(harness.session.check_for_update(true).await.is_none());
    assert!(harness.session.last_error().is_none());
}

#[tokio::test]
async fn test_checksum_asset_is_linked() {
    let feed = ReleaseFeed::start().await;
    let name = asset_name("Binity");
    let release = ReleaseFixture::new("v1.0.1")
        .asset(AssetFixture::new(&name, 2_000_000, feed.asset_url(&name)))
        .asset(AssetFixture::new("SHA256SUMS", 100, feed.asset_url("SHA256SUMS")));
    feed.serve_release(&release, None).await;
    let temp = TempDir::new().unwrap();
    let harness = HarnessBuilder::new(&feed).build(temp.path());

    let info = harness.session.check_for_update(true).await.unwrap();
    assert_eq!(info.asset_name, name);
    assert_eq!(info.checksum_url, Some(feed.asset_url("SHA256SUMS")));
}
