//! The update façade used by the UI.
//!
//! [`UpdateSession`] exposes the four user-facing operations: check,
//! download, apply and skip. None of them return an error; failures are
//! reported as "no result" and kept in [`UpdateSession::last_error`] for
//! display.
//!
//! Only one operation runs at a time. The session tracks a single
//! [`Activity`]; a call made while another operation is active does nothing
//! and returns the cached result.

use crate::config::{SettingsStore, UpdateSettings};
use crate::core::{ErrorKind, Result, UpdateError};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::download::Downloader;
use crate::upgrade::handoff::ReplacementOrchestrator;
use crate::upgrade::release::{ReleaseClient, UpdateInfo};
use crate::upgrade::runtime::RuntimeContext;
use crate::upgrade::startup::StartupReport;
use crate::upgrade::version_check::{CheckContext, CheckDecision, CheckPolicy};
use crate::utils::process::ProcessControl;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What the session is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Checking,
    Downloading,
    Applying,
}

#[derive(Debug, Default)]
struct SessionState {
    activity: Activity,
    info: Option<UpdateInfo>,
    last_error: Option<UpdateError>,
}

/// Resets the activity to idle when the operation ends, however it ends.
struct ActivityGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).activity = Activity::Idle;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Check, download, apply and skip behind one mutual-exclusion point.
pub struct UpdateSession {
    config: Arc<UpdaterConfig>,
    client: ReleaseClient,
    downloader: Downloader,
    orchestrator: ReplacementOrchestrator,
    settings: Arc<dyn SettingsStore>,
    runtime: RuntimeContext,
    startup: StartupReport,
    policy: CheckPolicy,
    state: Mutex<SessionState>,
}

impl UpdateSession {
    /// Create a session for the running process.
    ///
    /// `startup` is the report produced by
    /// [`run_startup`](crate::upgrade::startup::run_startup) for this run.
    pub fn new(
        config: Arc<UpdaterConfig>,
        settings: Arc<dyn SettingsStore>,
        runtime: RuntimeContext,
        startup: StartupReport,
        process: Arc<dyn ProcessControl>,
    ) -> Result<Self> {
        Ok(Self {
            client: ReleaseClient::new(config.clone())?,
            downloader: Downloader::new(config.clone())?,
            orchestrator: ReplacementOrchestrator::new(config.clone(), process),
            policy: CheckPolicy::new(config.check_interval()),
            config,
            settings,
            runtime,
            startup,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Look for a newer release.
    ///
    /// A non-forced check may be suppressed by the check gates, in which case
    /// the cached offer is returned unchanged. A failed request records the
    /// error, keeps the cached offer and returns `None`.
    pub async fn check_for_update(&self, force: bool) -> Option<UpdateInfo> {
        let Some(_guard) = self.begin(Activity::Checking) else {
            return self.info();
        };

        let settings = UpdateSettings::new(self.settings.as_ref());
        let context = CheckContext {
            force,
            just_updated: self.startup.just_updated,
            packaged: self.runtime.packaged,
        };
        if let CheckDecision::Skip(reason) = self.policy.decide(context, &settings, Utc::now()) {
            debug!("Update check skipped: {:?}", reason);
            return self.info();
        }

        let skipped = settings.skipped_version();
        match self.client.check(&self.runtime.current_version, skipped.as_deref(), force).await {
            Ok(found) => {
                if let Err(e) = settings.set_last_check(Utc::now()) {
                    warn!("Could not record check time: {e}");
                }
                match &found {
                    Some(info) => info!("Update available: {}", info.version),
                    None => info!("No update available"),
                }
                lock(&self.state).info = found.clone();
                found
            }
            Err(e) => {
                self.record_error(e);
                None
            }
        }
    }

    /// Download the offer found by the last check.
    ///
    /// `on_progress` receives whole percentages when the size is known.
    pub async fn download_update<F>(&self, on_progress: F) -> Option<PathBuf>
    where
        F: FnMut(u8) + Send,
    {
        let _guard = self.begin(Activity::Downloading)?;

        let Some(info) = self.info() else {
            self.record_error(UpdateError::NoUpdateMetadata);
            return None;
        };

        match self.downloader.download(&info, &self.runtime, on_progress).await {
            Ok(path) => Some(path),
            Err(e) => {
                self.record_error(e);
                None
            }
        }
    }

    /// Hand off to `staged` and return. On `true` the caller must exit the
    /// process promptly so the helper can replace the executable.
    pub async fn apply_update(&self, staged: &Path) -> bool {
        let Some(_guard) = self.begin(Activity::Applying) else {
            return false;
        };

        match self.orchestrator.apply(&self.runtime, staged).await {
            Ok(_) => true,
            Err(e) => {
                self.record_error(e);
                false
            }
        }
    }

    /// Remember the offered version as skipped and forget the offer.
    ///
    /// Returns `false` when there is no offer or the setting could not be saved.
    pub fn skip_version(&self) -> bool {
        let Some(info) = self.info() else {
            return false;
        };

        let settings = UpdateSettings::new(self.settings.as_ref());
        if let Err(e) = settings.set_skipped_version(&info.version) {
            self.record_error(e);
            return false;
        }

        info!("Skipping version {}", info.version);
        lock(&self.state).info = None;
        true
    }

    /// The cached offer from the last successful check.
    pub fn info(&self) -> Option<UpdateInfo> {
        lock(&self.state).info.clone()
    }

    /// Human-readable text of the last failure, if the last operation failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.as_ref().map(ToString::to_string)
    }

    pub fn last_error_kind(&self) -> Option<ErrorKind> {
        lock(&self.state).last_error.as_ref().map(UpdateError::kind)
    }

    /// Take the last failure out of the session, for callers that want the
    /// typed error rather than its text.
    pub fn take_last_error(&self) -> Option<UpdateError> {
        lock(&self.state).last_error.take()
    }

    pub fn activity(&self) -> Activity {
        lock(&self.state).activity
    }

    pub fn startup(&self) -> &StartupReport {
        &self.startup
    }

    pub fn runtime(&self) -> &RuntimeContext {
        &self.runtime
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn settings(&self) -> UpdateSettings<'_> {
        UpdateSettings::new(self.settings.as_ref())
    }

    /// Claim the session for `activity`, or `None` when it is busy.
    fn begin(&self, activity: Activity) -> Option<ActivityGuard<'_>> {
        let mut state = lock(&self.state);
        if state.activity != Activity::Idle {
            debug!("{:?} requested while {:?}, ignoring", activity, state.activity);
            return None;
        }
        state.activity = activity;
        state.last_error = None;
        Some(ActivityGuard { state: &self.state })
    }

    fn record_error(&self, error: UpdateError) {
        warn!("{error}");
        lock(&self.state).last_error = Some(error);
    }
}
