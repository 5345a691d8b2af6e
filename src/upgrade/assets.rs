//! Asset selection for a release.
//!
//! Releases usually carry several files: the portable executable, an
//! installer, checksum listings, sometimes per-platform builds. Only assets
//! ending in the platform executable suffix are candidates, and installers
//! (`setup`/`installer` anywhere in the name) are never picked because they
//! cannot replace a running portable binary.
//!
//! Candidates are scored:
//!
//! | rule                                             | points |
//! |--------------------------------------------------|--------|
//! | name contains the version (tag without `v`)      | +100   |
//! | name starts with the product name                | +20    |
//! | name is exactly `<product><suffix>`              | +10    |
//! | size above 1,000,000 bytes                       | +5     |
//!
//! All comparisons are case-insensitive. The highest score wins; ties go to
//! the lexicographically smallest lowercased name so the choice is
//! deterministic.

use crate::constants::LARGE_ASSET_THRESHOLD;
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::release::ReleaseAsset;
use crate::version::VersionComparator;
use std::cmp::Reverse;

/// Listing files that carry checksums for several assets.
const CHECKSUM_LISTINGS: &[&str] = &["sha256sums", "sha256sums.txt", "checksums.txt"];

/// Extensions of companion files that are never executables.
const COMPANION_EXTENSIONS: &[&str] = &[".sha256", ".sig", ".asc", ".minisig"];

/// Scores and picks the asset to download.
#[derive(Debug, Clone)]
pub struct AssetSelector {
    product_name: String,
    suffix: String,
}

impl AssetSelector {
    pub fn new(product_name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::new(&config.product_name, &config.asset_suffix)
    }

    /// Whether an asset may be installed at all.
    ///
    /// With an empty suffix (non-Windows) every name ends with it, so
    /// checksum listings and signature companions are excluded explicitly.
    pub fn is_candidate(&self, asset: &ReleaseAsset) -> bool {
        let name = asset.name.to_lowercase();
        if name.is_empty() || !name.ends_with(&self.suffix.to_lowercase()) {
            return false;
        }
        if name.contains("setup") || name.contains("installer") {
            return false;
        }
        !is_checksum_asset(&name)
    }

    /// Score a candidate against a release tag.
    pub fn score(&self, asset: &ReleaseAsset, tag: &str) -> u32 {
        let name = asset.name.to_lowercase();
        let product = self.product_name.to_lowercase();
        let version_hint = VersionComparator::strip_prefix(tag).to_lowercase();

        let mut score = 0;
        if !version_hint.is_empty() && name.contains(&version_hint) {
            score += 100;
        }
        if !product.is_empty() && name.starts_with(&product) {
            score += 20;
        }
        if name == format!("{product}{}", self.suffix.to_lowercase()) {
            score += 10;
        }
        if asset.size > LARGE_ASSET_THRESHOLD {
            score += 5;
        }
        score
    }

    /// Pick the best candidate, or `None` when nothing qualifies.
    pub fn select<'a>(&self, assets: &'a [ReleaseAsset], tag: &str) -> Option<&'a ReleaseAsset> {
        assets
            .iter()
            .filter(|asset| self.is_candidate(asset))
            .min_by_key(|asset| (Reverse(self.score(asset, tag)), asset.name.to_lowercase()))
    }
}

fn is_checksum_asset(lowercase_name: &str) -> bool {
    CHECKSUM_LISTINGS.contains(&lowercase_name)
        || COMPANION_EXTENSIONS.iter().any(|ext| lowercase_name.ends_with(ext))
}

/// Find the published checksum for `asset_name`.
///
/// Prefers a dedicated `<asset>.sha256` file, then a `SHA256SUMS` or
/// `checksums.txt` listing.
pub fn find_checksum_asset<'a>(
    assets: &'a [ReleaseAsset],
    asset_name: &str,
) -> Option<&'a ReleaseAsset> {
    let dedicated = format!("{}.sha256", asset_name.to_lowercase());
    assets
        .iter()
        .find(|asset| asset.name.to_lowercase() == dedicated)
        .or_else(|| {
            assets
                .iter()
                .find(|asset| CHECKSUM_LISTINGS.contains(&asset.name.to_lowercase().as_str()))
        })
}
