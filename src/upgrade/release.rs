//! Release feed access and evaluation.
//!
//! [`ReleaseClient`] fetches the latest-release object; [`evaluate_release`]
//! turns it into an [`UpdateInfo`] offer, or `None` when there is nothing to
//! install. Evaluation is pure so the version, skip and asset rules can be
//! tested without a server.
//!
//! The payload is the GitHub "latest release" shape. Unknown fields are
//! ignored; `body` and `assets` may be missing or `null`.

use crate::core::{Result, UpdateError};
use crate::upgrade::assets::{AssetSelector, find_checksum_asset};
use crate::upgrade::config::UpdaterConfig;
use crate::version::VersionComparator;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A release object from the remote feed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Release {
    /// Release tag, e.g. `v3.3.2`.
    #[serde(default)]
    pub tag_name: String,
    /// Release notes, usually Markdown.
    #[serde(default)]
    pub body: Option<String>,
    /// Downloadable files attached to the release.
    #[serde(default)]
    pub assets: Option<Vec<ReleaseAsset>>,
}

impl Release {
    /// Attached assets; empty when the list is missing.
    pub fn assets(&self) -> &[ReleaseAsset] {
        self.assets.as_deref().unwrap_or_default()
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: String,
}

/// An offer to install a specific release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Remote tag exactly as published (`v3.3.2`).
    pub version: String,
    pub download_url: String,
    /// Raw release notes.
    pub release_notes: String,
    pub asset_name: String,
    /// Advertised size in bytes, `0` when unknown.
    pub asset_size: u64,
    /// Published checksum file for this asset, if the release has one.
    pub checksum_url: Option<String>,
}

/// Decide whether `release` is an update worth offering.
///
/// Returns `None` when the tag is empty, not strictly newer than
/// `current_version`, equal to `skipped` (unless `force`), or when no asset
/// survives selection or the chosen asset has no download URL.
pub fn evaluate_release(
    release: &Release,
    current_version: &str,
    skipped: Option<&str>,
    force: bool,
    selector: &AssetSelector,
) -> Option<UpdateInfo> {
    let tag = release.tag_name.trim();
    if tag.is_empty() {
        debug!("Release has no tag");
        return None;
    }

    if !VersionComparator::is_newer(tag, current_version) {
        debug!("Remote {} is not newer than {}", tag, current_version);
        return None;
    }

    if !force && skipped.is_some_and(|skipped| skipped.trim() == tag) {
        info!("Version {} was skipped by the user", tag);
        return None;
    }

    let Some(asset) = selector.select(release.assets(), tag) else {
        info!("Release {} has no suitable asset for this platform", tag);
        return None;
    };

    if asset.browser_download_url.trim().is_empty() {
        debug!("Asset {} has no download URL", asset.name);
        return None;
    }

    let checksum_url = find_checksum_asset(release.assets(), &asset.name)
        .map(|checksum| checksum.browser_download_url.clone())
        .filter(|url| !url.is_empty());

    Some(UpdateInfo {
        version: tag.to_string(),
        download_url: asset.browser_download_url.clone(),
        release_notes: release.body.clone().unwrap_or_default(),
        asset_name: asset.name.clone(),
        asset_size: asset.size,
        checksum_url,
    })
}

/// HTTP client for the release feed.
pub struct ReleaseClient {
    http: reqwest::Client,
    config: Arc<UpdaterConfig>,
}

impl ReleaseClient {
    /// Build a client with the configured `User-Agent` and GitHub `Accept` header.
    pub fn new(config: Arc<UpdaterConfig>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.check_timeout())
            .build()
            .map_err(|e| UpdateError::Network {
                operation: "build release client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    /// Fetch the latest release object.
    pub async fn fetch_latest(&self) -> Result<Release> {
        debug!("Fetching release metadata from {}", self.config.release_url);

        let response = self.http.get(&self.config.release_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                operation: "release check".to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Release>().await.map_err(|e| UpdateError::InvalidRelease {
            reason: e.to_string(),
        })
    }

    /// Fetch and evaluate in one step.
    pub async fn check(
        &self,
        current_version: &str,
        skipped: Option<&str>,
        force: bool,
    ) -> Result<Option<UpdateInfo>> {
        let release = self.fetch_latest().await?;
        let selector = AssetSelector::from_config(&self.config);
        Ok(evaluate_release(&release, current_version, skipped, force, &selector))
    }
}
