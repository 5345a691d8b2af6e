//! Test fixtures for release payloads and executable files
//!
//! Builders for the JSON a release feed returns and for byte buffers that
//! pass (or deliberately fail) the post-download integrity checks.

use crate::utils::platform::native_executable_signatures;
use serde_json::{Value, json};

/// A buffer of `len` bytes that starts with this platform's executable
/// signature. Shorter lengths truncate the signature.
pub fn native_executable_bytes(len: usize) -> Vec<u8> {
    let magic = native_executable_signatures()[0];
    let mut bytes: Vec<u8> = magic.iter().copied().take(len).collect();
    bytes.resize(len, 0xAB);
    bytes
}

/// `len` bytes that do not start with any executable signature.
pub fn non_executable_bytes(len: usize) -> Vec<u8> {
    vec![b'x'; len]
}

/// One entry of a release's `assets` array.
#[derive(Clone, Debug)]
pub struct AssetFixture {
    pub name: String,
    pub size: u64,
    pub url: String,
}

impl AssetFixture {
    pub fn new(name: &str, size: u64, url: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            size,
            url: url.into(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "size": self.size,
            "browser_download_url": self.url,
            "content_type": "application/octet-stream",
        })
    }
}

/// Builder for the latest-release JSON document.
#[derive(Clone, Debug)]
pub struct ReleaseFixture {
    tag: String,
    body: Option<String>,
    assets: Vec<AssetFixture>,
}

impl ReleaseFixture {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            body: Some(format!("Release {tag}")),
            assets: Vec::new(),
        }
    }

    pub fn body(mut self, body: Option<&str>) -> Self {
        self.body = body.map(str::to_string);
        self
    }

    pub fn asset(mut self, asset: AssetFixture) -> Self {
        self.assets.push(asset);
        self
    }

    /// The JSON document, including a few fields the updater ignores.
    pub fn to_json(&self) -> Value {
        json!({
            "tag_name": self.tag,
            "name": format!("Binity {}", self.tag),
            "draft": false,
            "prerelease": false,
            "body": self.body,
            "assets": self.assets.iter().map(AssetFixture::to_json).collect::<Vec<_>>(),
        })
    }
}
