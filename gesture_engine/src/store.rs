//! Per-mode calibration baselines, keyed by mode.
//!
//! File layout:
//!
//! ```json
//! {"version": 1, "modes": {"kids": {"pose_baseline_torso_x": 0.5, "updated_epoch": 1700000000}}}
//! ```
//!
//! A missing or unreadable file is treated as an empty store.  A mode entry
//! that is not an object is dropped on its own; the other modes load.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use runner_core::ModeId;

use crate::error::StoreError;
use crate::profile::CalibrationMap;

const VERSION:       u32  = 1;
const UPDATED_EPOCH: &str = "updated_epoch";

pub trait CalibrationStore {
    /// Saved baseline for `mode`; empty when nothing was saved.
    fn get(&self, mode: ModeId) -> CalibrationMap;

    /// Replace the saved baseline for `mode`.
    fn save(&mut self, mode: ModeId, baseline: &CalibrationMap) -> Result<(), StoreError>;

    fn has_profile(&self, mode: ModeId) -> bool {
        !self.get(mode).is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JSON file
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct StoreFile {
    version: u32,
    modes:   BTreeMap<String, BTreeMap<String, Value>>,
}

fn default_version() -> u32 { VERSION }

/// What is actually on disk: mode entries are checked one by one.
#[derive(Debug, Deserialize)]
struct RawStoreFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    modes:   BTreeMap<String, Value>,
}

impl From<RawStoreFile> for StoreFile {
    fn from(raw: RawStoreFile) -> Self {
        let modes = raw
            .modes
            .into_iter()
            .filter_map(|(mode, entry)| match entry {
                Value::Object(fields) => Some((mode, fields.into_iter().collect())),
                other => {
                    log::warn!("calibration entry for {mode:?} is not an object ({other}); dropped");
                    None
                }
            })
            .collect();
        StoreFile { version: raw.version, modes }
    }
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile { version: VERSION, modes: BTreeMap::new() }
    }
}

/// Calibration store backed by one pretty-printed JSON file.  The file is read
/// once on open and rewritten on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file: StoreFile,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = read_store(&path);
        log::info!("calibration store {} ({} modes)", path.display(), file.modes.len());
        JsonFileStore { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, text).map_err(io_err)
    }
}

fn read_store(path: &Path) -> StoreFile {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return StoreFile::default(),
        Err(e) => {
            log::warn!("cannot read {}: {e}; starting with an empty store", path.display());
            return StoreFile::default();
        }
    };
    match serde_json::from_str::<RawStoreFile>(&text) {
        Ok(raw) => raw.into(),
        Err(e) => {
            log::warn!("corrupt calibration store {}: {e}; starting empty", path.display());
            StoreFile::default()
        }
    }
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl CalibrationStore for JsonFileStore {
    fn get(&self, mode: ModeId) -> CalibrationMap {
        let Some(fields) = self.file.modes.get(mode.key()) else {
            return CalibrationMap::new();
        };
        fields
            .iter()
            .filter(|(k, _)| k.as_str() != UPDATED_EPOCH)
            .filter_map(|(k, v)| v.as_f64().map(|v| (k.clone(), v as f32)))
            .collect()
    }

    fn save(&mut self, mode: ModeId, baseline: &CalibrationMap) -> Result<(), StoreError> {
        let mut fields: BTreeMap<String, Value> = baseline
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(*v)))
            .collect();
        fields.insert(UPDATED_EPOCH.to_string(), Value::from(now_epoch()));
        self.file.version = VERSION;
        self.file.modes.insert(mode.key().to_string(), fields);
        self.write()?;
        log::info!("saved {} calibration to {}", mode, self.path.display());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// In memory
// ════════════════════════════════════════════════════════════════════════════

/// Non-persistent store for tests and `--no-save` style runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    modes: HashMap<ModeId, CalibrationMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for MemoryStore {
    fn get(&self, mode: ModeId) -> CalibrationMap {
        self.modes.get(&mode).cloned().unwrap_or_default()
    }

    fn save(&mut self, mode: ModeId, baseline: &CalibrationMap) -> Result<(), StoreError> {
        self.modes.insert(mode, baseline.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::keys;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gesture_engine_{}_{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let store = JsonFileStore::open(scratch("missing").join("none.json"));
        assert!(store.get(ModeId::Kids).is_empty());
        assert!(!store.has_profile(ModeId::Kids));
    }

    #[test]
    fn corrupt_file_is_an_empty_store() {
        let dir = scratch("corrupt");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cal.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::open(&path).get(ModeId::Elderly).is_empty());
    }

    #[test]
    fn save_creates_dirs_and_reloads_numeric_fields() {
        let path = scratch("save").join("nested").join("cal.json");
        let mut store = JsonFileStore::open(&path);
        let baseline = CalibrationMap::from([(keys::LEFT_HAND_REST.to_string(), 0.625)]);
        store.save(ModeId::LegFree, &baseline).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let raw: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["version"], 1);
        assert!(raw["modes"]["leg_free"][UPDATED_EPOCH].is_u64());
        assert!(text.contains("\n  \"modes\""), "two-space indent");

        let reloaded = JsonFileStore::open(&path);
        assert_eq!(reloaded.get(ModeId::LegFree), baseline);
        assert!(reloaded.get(ModeId::Kids).is_empty());
    }

    #[test]
    fn non_numeric_values_are_ignored() {
        let dir = scratch("mixed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cal.json");
        fs::write(
            &path,
            r#"{"version":1,"modes":{"kids":{"smoothed_lane":1.0,"note":"hi","flag":true}}}"#,
        )
        .unwrap();
        let got = JsonFileStore::open(&path).get(ModeId::Kids);
        assert_eq!(got.len(), 1);
        assert_eq!(got[keys::SMOOTHED_LANE], 1.0);
    }

    #[test]
    fn malformed_mode_entry_does_not_drop_the_others() {
        let dir = scratch("bad_entry");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cal.json");
        fs::write(
            &path,
            r#"{"version":1,"modes":{"kids":{"pose_baseline_torso_x":0.42,"updated_epoch":1},"elderly":5}}"#,
        )
        .unwrap();

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get(ModeId::Kids)[keys::TORSO_X], 0.42);
        assert!(store.get(ModeId::Elderly).is_empty());

        // Saving another mode keeps kids on disk.
        store.save(ModeId::LegFree, &CalibrationMap::from([("a".to_string(), 1.0)])).unwrap();
        let reloaded = JsonFileStore::open(&path);
        assert_eq!(reloaded.get(ModeId::Kids)[keys::TORSO_X], 0.42);
        assert_eq!(reloaded.get(ModeId::LegFree)["a"], 1.0);
    }

    #[test]
    fn saving_overwrites_the_previous_profile() {
        let mut store = MemoryStore::new();
        store.save(ModeId::Kids, &CalibrationMap::from([("a".to_string(), 1.0)])).unwrap();
        store.save(ModeId::Kids, &CalibrationMap::from([("b".to_string(), 2.0)])).unwrap();
        let got = store.get(ModeId::Kids);
        assert!(!got.contains_key("a"));
        assert_eq!(got["b"], 2.0);
    }
}
