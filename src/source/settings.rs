//! Persisted album selection.
//!
//! The enabled album set is a JSON object with a single fixed key:
//!
//! ```json
//! { "Enabled Album Set": ["local:Travel", "remote:1234"] }
//! ```
//!
//! Providers read it once at construction. Every toggle writes the file
//! immediately. Ids are provider-prefixed; a provider with no enabled ids of
//! its own prefix offers all of its albums.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Preference key under which the enabled album ids are stored.
pub const ALBUM_SET: &str = "Enabled Album Set";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(rename = "Enabled Album Set", default)]
    enabled: BTreeSet<String>,
}

/// The enabled album id set, bound to the file it persists to.
#[derive(Debug, Clone, Default)]
pub struct AlbumSettings {
    path: Option<PathBuf>,
    enabled: BTreeSet<String>,
}

impl AlbumSettings {
    /// In-memory settings that are never written anywhere.
    pub fn in_memory(enabled: impl IntoIterator<Item = String>) -> Self {
        Self {
            path: None,
            enabled: enabled.into_iter().collect(),
        }
    }

    /// Load from `path`. A missing file is an empty selection.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let enabled = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<StoredSettings>(&content)?.enabled,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            enabled,
        })
    }

    pub fn enabled_albums(&self) -> &BTreeSet<String> {
        &self.enabled
    }

    /// Enable or disable one album and persist the whole set.
    pub fn set_album_enabled(&mut self, album_id: &str, enabled: bool) -> Result<(), SettingsError> {
        let changed = if enabled {
            self.enabled.insert(album_id.to_string())
        } else {
            self.enabled.remove(album_id)
        };
        if changed {
            info!(album = album_id, enabled, "album selection changed");
        }
        self.save()
    }

    fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSettings {
            enabled: self.enabled.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    /// Whether images from `album_id` should be offered.
    ///
    /// True when the album is enabled, or when nothing under the album's
    /// provider prefix is enabled at all.
    pub fn allows(&self, album_id: &str) -> bool {
        if self.enabled.contains(album_id) {
            return true;
        }
        let prefix = match album_id.split_once(':') {
            Some((prefix, _)) => prefix,
            None => return self.enabled.is_empty(),
        };
        !self
            .enabled
            .iter()
            .any(|id| id.split_once(':').is_some_and(|(p, _)| p == prefix))
    }
}
