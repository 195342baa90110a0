use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Last-indexed modification time per absolute file path
///
/// Persisted as a flat JSON object `{ "/abs/path.ts": 1718000000.123, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexTracker {
    files: BTreeMap<String, f64>,
}

impl IndexTracker {
    /// Load the tracker from disk; an absent file yields an empty tracker
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        if !path.exists() {
            tracing::debug!("Tracker file not found, starting with empty tracker");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| TrackerError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let tracker: IndexTracker =
            serde_json::from_str(&content).map_err(|e| TrackerError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Loaded tracker with {} indexed files", tracker.len());
        Ok(tracker)
    }

    /// Load the tracker, falling back to an empty one if the file is unreadable or corrupt
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("{}; starting with empty tracker", e);
            Self::default()
        })
    }

    /// Overwrite the sidecar file with the full mapping (write to temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        let save_err = |reason: String| TrackerError::SaveFailed {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        fs::write(tmp_path, content).map_err(|e| save_err(e.to_string()))?;
        fs::rename(tmp_path, path).map_err(|e| save_err(e.to_string()))?;

        tracing::debug!("Saved tracker to {:?}", path);
        Ok(())
    }

    /// True unless the stored mtime for `path` equals `mtime` exactly
    pub fn needs_update(&self, path: &str, mtime: f64) -> bool {
        self.files.get(path) != Some(&mtime)
    }

    pub fn record(&mut self, path: impl Into<String>, mtime: f64) {
        self.files.insert(path.into(), mtime);
    }

    pub fn get(&self, path: &str) -> Option<f64> {
        self.files.get(path).copied()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Modification time of `path` in seconds since the Unix epoch
pub fn file_mtime(path: &Path) -> std::io::Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    };
    Ok(secs)
}
