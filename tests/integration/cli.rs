//! The `binity-updater` binary.
//!
//! Each test points the binary at its own data directory through
//! `BINITY_HOME` and at a config file through `BINITY_UPDATER_CONFIG`. The
//! test binary lives under `target/`, so it always runs as a development
//! build: background checks are skipped and nothing is ever installed.

use crate::common::{RELEASE_PATH, ReleaseFeed, asset_name};
use assert_cmd::Command;
use binity_updater::test_utils::{AssetFixture, ReleaseFixture};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct CliEnv {
    temp: TempDir,
}

impl CliEnv {
    fn new(release_url: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let config = format!(
            "release_url = \"{release_url}\"\ncheck_timeout_secs = 2\nready_flag_wait_ms = 200\n"
        );
        std::fs::write(temp.path().join("updater.toml"), config).unwrap();
        Self { temp }
    }

    fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("binity-updater").unwrap();
        cmd.env("BINITY_HOME", self.home())
            .env("BINITY_UPDATER_CONFIG", self.temp.path().join("updater.toml"))
            .env("BINITY_NO_PROGRESS", "1")
            .env_remove("BINITY_PACKAGED")
            .env_remove("RUST_LOG");
        cmd
    }

    fn settings(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.home().join("settings.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

fn unreachable_env() -> CliEnv {
    CliEnv::new("http://127.0.0.1:9/releases/latest")
}

async fn feed_with_release(tag: &str) -> ReleaseFeed {
    let feed = ReleaseFeed::start().await;
    let name = asset_name("Binity");
    let release =
        ReleaseFixture::new(tag).asset(AssetFixture::new(&name, 2_000_000, feed.asset_url(&name)));
    feed.serve_release(&release, None).await;
    feed
}

fn write_flag(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"1").unwrap();
}

#[test]
fn test_help_hides_handoff_command() {
    let env = unreachable_env();
    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("skip"))
        .stdout(predicate::str::contains("__handoff").not());
}

#[test]
fn test_status_in_dev_build() {
    let env = unreachable_env();
    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Current version:"))
        .stdout(predicate::str::contains("Automatic checks: enabled"))
        .stdout(predicate::str::contains("Development build"))
        .stdout(predicate::str::contains("Binity was updated").not());
}

#[test]
fn test_status_after_update_shows_notice_once() {
    let env = unreachable_env();
    let flag = env.home().join("updates").join("update-ready.flag");
    write_flag(&flag);

    env.command()
        .arg("--show-after-update")
        .arg("--update-ready-flag")
        .arg(&flag)
        .assert()
        .success()
        .stdout(predicate::str::contains("Binity was updated to"));
    assert!(!flag.exists());

    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Binity was updated").not());
}

#[test]
fn test_startup_switch_with_equals_form() {
    let env = unreachable_env();
    let flag = env.home().join("updates").join("ready-1234.flag");
    write_flag(&flag);

    env.command()
        .arg("status")
        .arg(format!("--update-ready-flag={}", flag.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Binity was updated to"));
    assert!(!flag.exists());
}

#[test]
fn test_ready_flag_outside_updates_dir_is_not_deleted() {
    let env = unreachable_env();
    let outside = env.temp.path().join("elsewhere.flag");
    write_flag(&outside);

    env.command()
        .arg("--update-ready-flag")
        .arg(&outside)
        .assert()
        .success()
        .stdout(predicate::str::contains("Binity was updated").not());
    assert!(outside.exists());
}

#[test]
fn test_sweep_on_startup() {
    let env = unreachable_env();
    let updates = env.home().join("updates");
    std::fs::create_dir_all(&updates).unwrap();
    let leftover = updates.join("handoff-12345");
    std::fs::write(&leftover, b"stale helper").unwrap();

    env.command().arg("status").assert().success();

    assert!(!leftover.exists());
}

#[test]
fn test_forced_check_offline_suggests_connection() {
    let env = unreachable_env();
    env.command()
        .args(["check", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("internet connection"));
}

#[test]
fn test_handoff_with_missing_plan_fails() {
    let env = unreachable_env();
    let missing = env.temp.path().join("no-plan.json");
    env.command()
        .args(["__handoff", "--plan"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("handoff plan"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let env = unreachable_env();
    env.command().args(["--verbose", "--quiet", "status"]).assert().failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forced_check_reports_offer() {
    let feed = feed_with_release("v99.0.0").await;
    let env = CliEnv::new(&format!("{}{}", feed.server.uri(), RELEASE_PATH));

    env.command()
        .args(["check", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available"))
        .stdout(predicate::str::contains("v99.0.0"))
        .stdout(predicate::str::contains("Release v99.0.0"));

    assert!(env.settings()["last_update_check"].as_str().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forced_check_when_current() {
    let feed = feed_with_release("v0.0.1").await;
    let env = CliEnv::new(&format!("{}{}", feed.server.uri(), RELEASE_PATH));

    env.command()
        .args(["check", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You are on the latest version"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_skip_records_version() {
    let feed = feed_with_release("v99.0.0").await;
    let env = CliEnv::new(&format!("{}{}", feed.server.uri(), RELEASE_PATH));

    env.command()
        .args(["skip", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version v99.0.0 will not be offered again"));

    assert_eq!(env.settings()["skipped_update_version"], "v99.0.0");

    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped version: v99.0.0"));
}
