//! Shared helpers: a mock release feed and sessions wired to it.

use binity_updater::config::{MemorySettingsStore, SettingsStore};
use binity_updater::test_utils::{
    AssetFixture, RecordingProcessControl, ReleaseFixture, init_test_logging,
    test_runtime_with_version,
};
use binity_updater::upgrade::{RuntimeContext, StartupReport, UpdateSession, UpdaterConfig};
use binity_updater::utils::EXE_SUFFIX;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RELEASE_PATH: &str = "/repos/Volfheim/Binity/releases/latest";

/// Asset name as published for this platform, e.g. `Binity-1.0.1.exe`.
pub fn asset_name(stem: &str) -> String {
    format!("{stem}{EXE_SUFFIX}")
}

/// A mock release feed serving one release and its assets.
pub struct ReleaseFeed {
    pub server: MockServer,
}

impl ReleaseFeed {
    pub async fn start() -> Self {
        init_test_logging(None);
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn release_url(&self) -> String {
        format!("{}{}", self.server.uri(), RELEASE_PATH)
    }

    pub fn asset_url(&self, name: &str) -> String {
        format!("{}/download/{}", self.server.uri(), name)
    }

    /// Serve `release` as the latest release, expecting `calls` requests when given.
    pub async fn serve_release(&self, release: &ReleaseFixture, calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(RELEASE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(release.to_json()));
        match calls {
            Some(calls) => mock.expect(calls).mount(&self.server).await,
            None => mock.mount(&self.server).await,
        }
    }

    pub async fn serve_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(RELEASE_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` as the asset `name` and return its fixture entry.
    pub async fn serve_asset(&self, name: &str, body: Vec<u8>) -> AssetFixture {
        let size = body.len() as u64;
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
        AssetFixture::new(name, size, self.asset_url(name))
    }

    /// Serve a text file (checksum listing) under `name`.
    pub async fn serve_text(&self, name: &str, text: &str) -> AssetFixture {
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(text))
            .mount(&self.server)
            .await;
        AssetFixture::new(name, text.len() as u64, self.asset_url(name))
    }

    /// Config pointing at this feed.
    pub fn config(&self) -> UpdaterConfig {
        UpdaterConfig {
            release_url: self.release_url(),
            check_timeout_secs: 5,
            download_timeout_secs: 5,
            exit_wait_attempts: 2,
            exit_wait_interval_ms: 1,
            copy_attempts: 2,
            copy_retry_delay_ms: 1,
            ready_flag_wait_ms: 100,
            ..UpdaterConfig::default()
        }
    }
}

/// Everything a session test needs to inspect afterwards.
pub struct Harness {
    pub session: UpdateSession,
    pub settings: Arc<MemorySettingsStore>,
    pub process: Arc<RecordingProcessControl>,
    pub runtime: RuntimeContext,
}

pub struct HarnessBuilder {
    config: UpdaterConfig,
    version: String,
    packaged: bool,
    startup: StartupReport,
    settings: Arc<MemorySettingsStore>,
}

impl HarnessBuilder {
    pub fn new(feed: &ReleaseFeed) -> Self {
        Self {
            config: feed.config(),
            version: "1.0.0".to_string(),
            packaged: true,
            startup: StartupReport::default(),
            settings: Arc::new(MemorySettingsStore::new()),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn packaged(mut self, packaged: bool) -> Self {
        self.packaged = packaged;
        self
    }

    pub fn startup(mut self, startup: StartupReport) -> Self {
        self.startup = startup;
        self
    }

    pub fn config(mut self, edit: impl FnOnce(&mut UpdaterConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn settings(mut self, settings: Arc<MemorySettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self, root: &Path) -> Harness {
        let runtime = test_runtime_with_version(root, self.packaged, &self.version);
        let process = Arc::new(RecordingProcessControl::new());
        let settings_store: Arc<dyn SettingsStore> = self.settings.clone();
        let session = UpdateSession::new(
            Arc::new(self.config),
            settings_store,
            runtime.clone(),
            self.startup,
            process.clone(),
        )
        .unwrap();

        Harness {
            session,
            settings: self.settings,
            process,
            runtime,
        }
    }
}
