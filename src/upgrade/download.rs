//! Staged download of a release asset.
//!
//! The asset is streamed to its staging path, verified, and made runnable.
//! Any failure after the first byte is written deletes the partial file, so a
//! failed download never leaves anything that could later be mistaken for a
//! good build.
//!
//! # Staging path
//!
//! - Development runs stage into `updates/<asset>`.
//! - Installed runs stage next to the executable as `<exe-dir>/<asset>`,
//!   unless that is the running executable itself (compared by file identity,
//!   so symlinks and case differences are caught). Then the file goes to
//!   `updates/next-<asset>` instead, because a mapped executable cannot be
//!   overwritten mid-download.

use crate::constants::STAGED_PREFIX;
use crate::core::{Result, UpdateError};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::release::UpdateInfo;
use crate::upgrade::runtime::RuntimeContext;
use crate::upgrade::verification::{ChecksumVerifier, IntegrityChecks};
use crate::utils::fs::{remove_file_best_effort, remove_file_if_exists};
use crate::utils::platform::{same_file, set_executable, unblock_downloaded_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Downloads and verifies release assets.
pub struct Downloader {
    http: reqwest::Client,
    config: Arc<UpdaterConfig>,
}

impl Downloader {
    /// Build a downloader. Connect and read timeouts bound stalls, not the
    /// whole transfer.
    pub fn new(config: Arc<UpdaterConfig>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.download_timeout())
            .read_timeout(config.download_timeout())
            .build()
            .map_err(|e| UpdateError::Network {
                operation: "build download client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    /// File name the asset is staged under. Always carries the configured
    /// executable suffix.
    pub fn staged_file_name(&self, info: &UpdateInfo) -> String {
        let name = Path::new(info.asset_name.trim())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return self.config.default_asset_name();
        }

        let suffix = &self.config.asset_suffix;
        if suffix.is_empty() || name.to_lowercase().ends_with(&suffix.to_lowercase()) {
            name
        } else {
            format!("{name}{suffix}")
        }
    }

    /// Where the asset will be written.
    pub fn staged_path(&self, info: &UpdateInfo, runtime: &RuntimeContext) -> PathBuf {
        let name = self.staged_file_name(info);

        if !runtime.packaged {
            return runtime.paths.updates_dir.join(name);
        }

        let beside_exe = runtime.exe_dir().join(&name);
        if same_file(&beside_exe, &runtime.current_exe) {
            debug!("{} is the running executable, staging under {STAGED_PREFIX}", beside_exe.display());
            runtime.paths.updates_dir.join(format!("{STAGED_PREFIX}{name}"))
        } else {
            beside_exe
        }
    }

    /// Download, verify and unblock the asset described by `info`.
    ///
    /// `on_progress` receives whole percentages after every buffered chunk,
    /// and only when the server reports a `Content-Length`.
    pub async fn download<F>(
        &self,
        info: &UpdateInfo,
        runtime: &RuntimeContext,
        mut on_progress: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(u8) + Send,
    {
        let target = self.staged_path(info, runtime);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UpdateError::io("create staging directory", parent, e))?;
        }
        remove_file_if_exists(&target)
            .map_err(|e| UpdateError::io("remove previous download", &target, e))?;

        info!("Downloading {} to {}", info.download_url, target.display());

        match self.fetch_and_verify(info, &target, &mut on_progress).await {
            Ok(size) => {
                info!("Downloaded {} ({} bytes)", target.display(), size);
                unblock_downloaded_file(&target);
                set_executable(&target);
                Ok(target)
            }
            Err(e) => {
                warn!("Download failed, removing {}: {}", target.display(), e);
                remove_file_best_effort(&target);
                Err(e)
            }
        }
    }

    async fn fetch_and_verify<F>(
        &self,
        info: &UpdateInfo,
        target: &Path,
        on_progress: &mut F,
    ) -> Result<u64>
    where
        F: FnMut(u8) + Send,
    {
        let content_length = self.stream_to_file(info, target, on_progress).await?;

        let checks = IntegrityChecks {
            expected_size: content_length.or(Some(info.asset_size)),
            min_size: self.config.min_asset_size,
        };
        let size = checks.verify(target).await?;

        // Content-Length and the advertised asset size must agree with disk.
        if info.asset_size > 0 && size != info.asset_size {
            return Err(UpdateError::SizeMismatch {
                expected: info.asset_size,
                actual: size,
            });
        }

        if self.config.verify_checksum_when_published {
            let verified = ChecksumVerifier::verify_from_release(
                &self.http,
                target,
                info.checksum_url.as_deref(),
                &info.asset_name,
            )
            .await?;
            if !verified {
                debug!("No checksum verification for {}", info.asset_name);
            }
        }

        Ok(size)
    }

    /// Stream the body to `target`. Returns the advertised length, if any.
    async fn stream_to_file<F>(
        &self,
        info: &UpdateInfo,
        target: &Path,
        on_progress: &mut F,
    ) -> Result<Option<u64>>
    where
        F: FnMut(u8) + Send,
    {
        let mut response = self.http.get(&info.download_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                operation: "asset download".to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length().filter(|len| *len > 0);
        let chunk_size = self.config.download_chunk_size.max(1);

        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| UpdateError::io("create download file", target, e))?;
        let mut buffer: Vec<u8> = Vec::with_capacity(chunk_size);
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
            if buffer.len() >= chunk_size {
                written += flush(&mut file, &mut buffer, target).await?;
                report(total, written, on_progress);
            }
        }
        if !buffer.is_empty() {
            written += flush(&mut file, &mut buffer, target).await?;
            report(total, written, on_progress);
        }

        file.flush().await.map_err(|e| UpdateError::io("flush download", target, e))?;
        file.sync_all().await.map_err(|e| UpdateError::io("sync download", target, e))?;

        debug!("Wrote {} bytes to {}", written, target.display());
        Ok(total)
    }
}

async fn flush(file: &mut tokio::fs::File, buffer: &mut Vec<u8>, target: &Path) -> Result<u64> {
    file.write_all(buffer).await.map_err(|e| UpdateError::io("write download", target, e))?;
    let len = buffer.len() as u64;
    buffer.clear();
    Ok(len)
}

fn report<F: FnMut(u8)>(total: Option<u64>, written: u64, on_progress: &mut F) {
    if let Some(total) = total {
        let percent = (written.saturating_mul(100) / total).min(100);
        on_progress(percent as u8);
    }
}
