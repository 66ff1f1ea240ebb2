//! State Storage
//!
//! File-backed key-value store used to persist the asset collection across
//! restarts. The file holds one JSON object; the collection lives under a
//! single namespaced key wrapped in a versioned envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::DashboardError;
use crate::models::asset::AssetCollectionState;

pub const STATE_KEY: &str = "persist:coins";
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEnvelope {
    version: u32,
    state: AssetCollectionState,
}

#[derive(Debug, Clone)]
pub struct StateStorage {
    path: PathBuf,
}

impl StateStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a single key. A missing file reads as an empty store.
    pub fn get(&self, key: &str) -> Result<Option<Value>, DashboardError> {
        Ok(self.read_all()?.remove(key))
    }

    /// Write a single key, keeping every other key in the file
    pub fn set(&self, key: &str, value: Value) -> Result<(), DashboardError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Overwriting unreadable state file {}: {}", self.path.display(), e);
                Map::new()
            }
        };
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    /// Load the persisted collection. Entries with an unknown version or a
    /// shape that no longer parses are discarded.
    pub fn load_state(&self) -> Result<Option<AssetCollectionState>, DashboardError> {
        let Some(raw) = self.get(STATE_KEY)? else {
            debug!("No persisted state under '{}'", STATE_KEY);
            return Ok(None);
        };

        let version = raw.get("version").and_then(Value::as_u64);
        if version != Some(STATE_VERSION as u64) {
            warn!(
                "Discarding persisted state with version {:?} (expected {})",
                version, STATE_VERSION
            );
            return Ok(None);
        }

        match serde_json::from_value::<PersistedEnvelope>(raw) {
            Ok(envelope) => Ok(Some(envelope.state)),
            Err(e) => {
                warn!("Discarding unreadable persisted state: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save_state(&self, state: &AssetCollectionState) -> Result<(), DashboardError> {
        let envelope = PersistedEnvelope {
            version: STATE_VERSION,
            state: state.clone(),
        };
        let value = serde_json::to_value(&envelope)
            .map_err(|e| DashboardError::Persistence(e.to_string()))?;
        self.set(STATE_KEY, value)
    }

    fn read_all(&self) -> Result<Map<String, Value>, DashboardError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(DashboardError::Persistence(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            DashboardError::Persistence(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, entries: &Map<String, Value>) -> Result<(), DashboardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DashboardError::Persistence(e.to_string()))?;
        }

        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| DashboardError::Persistence(e.to_string()))?;

        // Write to a sibling file first so a crash never leaves half a file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|e| {
            DashboardError::Persistence(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            DashboardError::Persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Saved state file {}", self.path.display());
        Ok(())
    }
}
