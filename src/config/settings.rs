//! Settings store shared with the rest of the application.
//!
//! The updater does not own the settings file; it reads and writes three keys
//! through the [`SettingsStore`] trait:
//!
//! | key                      | type   | meaning                                  |
//! |--------------------------|--------|------------------------------------------|
//! | `auto_check_updates`     | bool   | background checks enabled (default true) |
//! | `last_update_check`      | string | ISO-8601 time of the last successful check, or empty |
//! | `skipped_update_version` | string | release tag the user chose to skip, or empty |
//!
//! [`JsonSettingsStore`] serves reads from an in-memory copy. Every change
//! re-reads the file, applies the key and rewrites it with
//! write-temp-then-rename, all under one mutex, so keys written by the
//! settings owner in the meantime survive and a crash never leaves a torn
//! file. A file that fails to parse is moved aside to
//! `settings.broken.json` and replaced by defaults.

use crate::core::{Result, UpdateError};
use crate::utils::fs::atomic_write;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key for the background-check toggle.
pub const AUTO_CHECK_KEY: &str = "auto_check_updates";
/// Key for the last successful check time.
pub const LAST_CHECK_KEY: &str = "last_update_check";
/// Key for the skipped release tag.
pub const SKIPPED_VERSION_KEY: &str = "skipped_update_version";

/// Generic key/value settings collaborator.
pub trait SettingsStore: Send + Sync {
    /// Current value for `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` and persist it.
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| UpdateError::Settings {
            message: "settings lock poisoned".to_string(),
        })?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a JSON object on disk.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonSettingsStore {
    /// Open the store, loading the file if it exists.
    ///
    /// Never fails on bad content: a corrupt file is moved aside and the store
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load_or_quarantine(&path).unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut cached = self.values.lock().map_err(|_| UpdateError::Settings {
            message: "settings lock poisoned".to_string(),
        })?;

        // An unreadable file keeps the last known content rather than
        // being overwritten with a single key.
        let mut values = load_or_quarantine(&self.path).unwrap_or_else(|| cached.clone());
        values.insert(key.to_string(), value);

        let content = serde_json::to_string_pretty(&values).map_err(|e| UpdateError::Settings {
            message: format!("Failed to serialize settings: {e}"),
        })?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| UpdateError::Settings {
            message: format!("{e:#}"),
        })?;

        *cached = values;
        Ok(())
    }
}

/// Current file content. `None` when the file exists but cannot be read.
fn load_or_quarantine(path: &Path) -> Option<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Some(Map::new()),
        Err(e) => {
            warn!("Could not read settings {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) | Err(_) => {
            let broken = path.with_extension("broken.json");
            warn!(
                "Settings file {} is corrupt, moving it to {}",
                path.display(),
                broken.display()
            );
            if let Err(e) = std::fs::rename(path, &broken) {
                warn!("Could not move corrupt settings aside: {}", e);
            }
            Some(Map::new())
        }
    }
}

/// Typed view over the three keys the updater uses.
#[derive(Clone, Copy)]
pub struct UpdateSettings<'a> {
    store: &'a dyn SettingsStore,
}

impl<'a> UpdateSettings<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    /// Background checks enabled. Missing or non-boolean values read as `true`.
    pub fn auto_check_enabled(&self) -> bool {
        self.store.get(AUTO_CHECK_KEY).and_then(|v| v.as_bool()).unwrap_or(true)
    }

    pub fn set_auto_check_enabled(&self, enabled: bool) -> Result<()> {
        self.store.set(AUTO_CHECK_KEY, Value::Bool(enabled))
    }

    /// Time of the last successful check.
    ///
    /// Empty, missing or malformed values read as `None`, which forces the
    /// next check. Accepts RFC 3339 and naive ISO-8601 (interpreted as local
    /// time).
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_CHECK_KEY)?;
        let text = raw.as_str()?.trim();
        if text.is_empty() {
            return None;
        }
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            debug!("Ignoring malformed {LAST_CHECK_KEY}: {text:?}");
        }
        parsed
    }

    pub fn set_last_check(&self, when: DateTime<Utc>) -> Result<()> {
        self.store.set(LAST_CHECK_KEY, Value::String(when.to_rfc3339()))
    }

    /// Release tag the user chose to skip, if any.
    pub fn skipped_version(&self) -> Option<String> {
        self.store
            .get(SKIPPED_VERSION_KEY)
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
    }

    pub fn set_skipped_version(&self, version: &str) -> Result<()> {
        self.store.set(SKIPPED_VERSION_KEY, Value::String(version.to_string()))
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
