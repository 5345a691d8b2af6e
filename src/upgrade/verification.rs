//! Post-download integrity checks.
//!
//! [`IntegrityChecks`] runs the checks every download must pass, in order:
//!
//! 1. the file exists;
//! 2. its size equals the size the server (or release) advertised, if any;
//! 3. its size is at least the configured floor;
//! 4. it starts with the native executable signature.
//!
//! [`ChecksumVerifier`] adds SHA-256 verification when the release publishes
//! a checksum for the asset. Without one, the download is accepted on the
//! checks above alone and the gap is logged.

use crate::core::{Result, UpdateError};
use crate::utils::platform::has_native_signature;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Size and signature checks for a downloaded file.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityChecks {
    /// Exact size expected, if advertised.
    pub expected_size: Option<u64>,
    /// Smallest acceptable size.
    pub min_size: u64,
}

impl IntegrityChecks {
    /// Run every check against `path`. Does not delete anything.
    pub async fn verify(&self, path: &Path) -> Result<u64> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                return Err(UpdateError::DownloadMissing {
                    path: path.to_path_buf(),
                });
            }
        };
        let actual = metadata.len();

        if let Some(expected) = self.expected_size.filter(|size| *size > 0) {
            if actual != expected {
                return Err(UpdateError::SizeMismatch { expected, actual });
            }
        }

        if actual < self.min_size {
            return Err(UpdateError::TooSmall {
                actual,
                minimum: self.min_size,
            });
        }

        let header = read_header(path).await?;
        if !has_native_signature(&header) {
            return Err(UpdateError::InvalidExecutable);
        }

        debug!("{} passed integrity checks ({} bytes)", path.display(), actual);
        Ok(actual)
    }
}

async fn read_header(path: &Path) -> Result<Vec<u8>> {
    let mut file =
        fs::File::open(path).await.map_err(|e| UpdateError::io("open download", path, e))?;
    let mut header = vec![0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let read = file
            .read(&mut header[filled..])
            .await
            .map_err(|e| UpdateError::io("read download header", path, e))?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    header.truncate(filled);
    Ok(header)
}

/// SHA-256 verification against a published checksum.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Hex-encoded SHA-256 of a file.
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {}", file_path.display());

        let mut file = fs::File::open(file_path)
            .await
            .map_err(|e| UpdateError::io("open file for hashing", file_path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| UpdateError::io("read file for hashing", file_path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Verify a file against an expected hex checksum (case-insensitive,
    /// optional `sha256:` prefix).
    pub async fn verify_checksum(file_path: &Path, expected_checksum: &str) -> Result<()> {
        info!("Verifying checksum for: {}", file_path.display());

        let expected = expected_checksum.trim().trim_start_matches("sha256:").to_lowercase();
        let actual = Self::compute_sha256(file_path).await?;

        if actual != expected {
            return Err(UpdateError::ChecksumMismatch { expected, actual });
        }

        info!("Checksum verification successful");
        Ok(())
    }

    /// Extract the checksum for `asset_name` from a checksum file.
    ///
    /// Accepts `sha256sum` listings (`<hex>  <name>` or `<hex> *<name>`) and
    /// single-asset files holding only the hash.
    pub fn parse_checksum_listing(content: &str, asset_name: &str) -> Option<String> {
        let mut bare = None;
        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [hash] if is_sha256_hex(hash) && bare.is_none() => {
                    bare = Some(hash.to_lowercase());
                }
                [hash, name, ..] if is_sha256_hex(hash) => {
                    let name = name.trim_start_matches('*');
                    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
                    if file_name.eq_ignore_ascii_case(asset_name) {
                        return Some(hash.to_lowercase());
                    }
                }
                _ => {}
            }
        }
        bare
    }

    /// Download a checksum file and extract the entry for `asset_name`.
    ///
    /// Returns `Ok(None)` when the file has no entry for the asset.
    pub async fn fetch_expected_checksum(
        http: &reqwest::Client,
        checksums_url: &str,
        asset_name: &str,
    ) -> Result<Option<String>> {
        debug!("Fetching checksums from: {}", checksums_url);

        let response = http.get(checksums_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                operation: "checksum download".to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        let checksum = Self::parse_checksum_listing(&content, asset_name);
        if checksum.is_none() {
            warn!("No checksum found for asset: {}", asset_name);
        }
        Ok(checksum)
    }

    /// Verify a download against the release's published checksum.
    ///
    /// Returns `Ok(true)` when verified, `Ok(false)` when nothing was
    /// published for the asset.
    pub async fn verify_from_release(
        http: &reqwest::Client,
        file_path: &Path,
        checksums_url: Option<&str>,
        asset_name: &str,
    ) -> Result<bool> {
        let Some(url) = checksums_url else {
            debug!("Release publishes no checksum for {}, relying on size and signature", asset_name);
            return Ok(false);
        };

        match Self::fetch_expected_checksum(http, url, asset_name).await? {
            Some(expected) => {
                Self::verify_checksum(file_path, &expected).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn is_sha256_hex(text: &str) -> bool {
    text.len() == 64 && text.chars().all(|c| c.is_ascii_hexdigit())
}
