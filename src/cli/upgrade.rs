//! The update commands: status, check, download, apply and skip.
//!
//! Every command starts the same way: resolve the data directory, load the
//! updater config, run the startup bookkeeping and open an
//! [`UpdateSession`]. Failures recorded by the session are turned back into
//! errors here so `main` can print them with a suggestion.

use crate::config::{AppPaths, JsonSettingsStore};
use crate::upgrade::startup::run_startup;
use crate::upgrade::version_check::format_version_info;
use crate::upgrade::{RuntimeContext, StartupSwitches, UpdateInfo, UpdateSession, UpdaterConfig};
use crate::utils::{ProgressBar, SystemProcessControl};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Options shared by the update commands.
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Check even when the cooldown has not passed or the release was skipped.
    #[arg(short, long)]
    pub force: bool,
}

async fn open_session(switches: &StartupSwitches) -> Result<UpdateSession> {
    let paths = AppPaths::discover()?;
    let config = Arc::new(UpdaterConfig::load(&paths).await?);
    let runtime = RuntimeContext::detect(paths.clone())?;
    debug!(
        "Running {} (version {}, packaged: {})",
        runtime.current_exe.display(),
        runtime.current_version,
        runtime.packaged
    );

    let startup = run_startup(&paths, &runtime.current_exe, switches, &config).await;
    let settings = Arc::new(JsonSettingsStore::open(paths.settings_file.clone()));

    let session =
        UpdateSession::new(config, settings, runtime, startup, Arc::new(SystemProcessControl))?;
    print_startup_notices(&session);
    Ok(session)
}

fn print_startup_notices(session: &UpdateSession) {
    let report = session.startup();
    if report.show_update_notice {
        println!(
            "{}",
            format!("Binity was updated to {}", session.runtime().current_version).green()
        );
    }
    if let Some(record) = report.launch_record.as_ref().filter(|_| report.launched_from_fallback) {
        println!(
            "{}",
            format!(
                "Running from a temporary location ({}); the update could not be installed to {}",
                record.run_target.display(),
                record.final_target.display()
            )
            .yellow()
        );
    }
}

/// Return the session's last failure as an error, if there is one.
fn check_session_error(session: &UpdateSession) -> Result<()> {
    match session.take_last_error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn find_update(session: &UpdateSession, force: bool) -> Result<Option<UpdateInfo>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Checking for updates...");
    let found = session.check_for_update(force).await;
    spinner.finish_and_clear();

    check_session_error(session)?;
    match &found {
        Some(info) => print_offer(session, info),
        None => println!(
            "{}",
            format!("You are on the latest version ({})", session.runtime().current_version).green()
        ),
    }
    Ok(found)
}

fn print_offer(session: &UpdateSession, info: &UpdateInfo) {
    println!(
        "{}",
        format!("Update available: {} -> {}", session.runtime().current_version, info.version)
            .green()
    );
    if info.asset_size > 0 {
        println!("Asset: {} ({} bytes)", info.asset_name, info.asset_size);
    } else {
        println!("Asset: {}", info.asset_name);
    }
    let notes = info.release_notes.trim();
    if !notes.is_empty() {
        println!();
        println!("{notes}");
        println!();
    }
}

async fn download_offer(session: &UpdateSession, info: &UpdateInfo) -> Result<Option<PathBuf>> {
    let bar = ProgressBar::percent();
    bar.set_prefix("Downloading");
    bar.set_message(info.asset_name.clone());

    let staged = session.download_update(|percent| bar.set_position(u64::from(percent))).await;
    match &staged {
        Some(path) => bar.finish_with_message(format!("{}", path.display())),
        None => bar.finish_and_clear(),
    }

    check_session_error(session)?;
    Ok(staged)
}

/// Startup notices, versions and a background check.
pub async fn status(switches: &StartupSwitches) -> Result<()> {
    let session = open_session(switches).await?;

    // A background check never reports failures to the user.
    let found = session.check_for_update(false).await;
    if let Some(error) = session.take_last_error() {
        debug!("Background check failed: {error}");
    }

    let current = session.runtime().current_version.clone();
    println!("{}", format_version_info(&current, found.as_ref().map(|info| info.version.as_str())));

    let settings = session.settings();
    println!(
        "Automatic checks: {}",
        if settings.auto_check_enabled() { "enabled" } else { "disabled" }
    );
    if let Some(last) = settings.last_check() {
        println!("Last check: {}", last.to_rfc3339());
    }
    if let Some(skipped) = settings.skipped_version() {
        println!("Skipped version: {skipped}");
    }
    if !session.runtime().packaged {
        println!("{}", "Development build: updates cannot be installed".yellow());
    }
    Ok(())
}

pub async fn check(switches: &StartupSwitches, args: UpdateArgs) -> Result<()> {
    let session = open_session(switches).await?;
    find_update(&session, args.force).await?;
    Ok(())
}

pub async fn download(switches: &StartupSwitches, args: UpdateArgs) -> Result<()> {
    let session = open_session(switches).await?;
    let Some(info) = find_update(&session, args.force).await? else {
        return Ok(());
    };

    if let Some(path) = download_offer(&session, &info).await? {
        println!("{}", format!("Downloaded {} to {}", info.version, path.display()).green());
    }
    Ok(())
}

/// Check, download and hand off. Exits the process on success so the helper
/// can replace the executable.
pub async fn apply(switches: &StartupSwitches, args: UpdateArgs) -> Result<()> {
    let session = open_session(switches).await?;
    let Some(info) = find_update(&session, args.force).await? else {
        return Ok(());
    };
    let Some(staged) = download_offer(&session, &info).await? else {
        return Ok(());
    };

    if !session.apply_update(&staged).await {
        check_session_error(&session)?;
        return Ok(());
    }

    println!("{}", format!("Installing {}; Binity will restart", info.version).cyan());
    std::process::exit(0);
}

pub async fn skip(switches: &StartupSwitches, args: UpdateArgs) -> Result<()> {
    let session = open_session(switches).await?;
    let Some(info) = find_update(&session, args.force).await? else {
        return Ok(());
    };

    if session.skip_version() {
        println!("Version {} will not be offered again", info.version);
    }
    check_session_error(&session)
}
