//! JSON file storage for per-race bookkeeping.
//!
//! One file maps race keys to [`RaceRecord`]s. The file is read lazily on
//! first access and cached; every patch rewrites the whole file through a
//! temp file and an atomic rename, so readers never see a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{RaceRecord, RecordPatch};

/// Storage backend. Owns the in-memory copy of the state file.
pub struct StateStore {
    path: PathBuf,
    races: BTreeMap<String, RaceRecord>,
    loaded: bool,
}

impl StateStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            races: BTreeMap::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read state file, starting empty");
                return;
            }
        };

        let entries = match serde_json::from_str::<BTreeMap<String, Value>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed state file, starting empty");
                return;
            }
        };

        // Records decode independently; a bad one is dropped, its neighbours stay.
        for (key, value) in entries {
            match serde_json::from_value::<RaceRecord>(value) {
                Ok(record) => {
                    self.races.insert(key, record);
                }
                Err(e) => warn!(race = %key, error = %e, "skipping malformed race record"),
            }
        }
        debug!(path = %self.path.display(), races = self.races.len(), "state loaded");
    }

    /// Get the record for `key`, creating a blank one if it doesn't exist.
    ///
    /// A new record lives in memory only until the next [`apply_patch`].
    ///
    /// [`apply_patch`]: StateStore::apply_patch
    pub fn get_or_init(&mut self, key: &str) -> RaceRecord {
        self.load();
        self.races.entry(key.to_string()).or_default().clone()
    }

    /// Read a record without creating it.
    pub fn get(&mut self, key: &str) -> Option<RaceRecord> {
        self.load();
        self.races.get(key).cloned()
    }

    /// Merge `patch` into the record for `key` and persist the whole store.
    pub fn apply_patch(&mut self, key: &str, patch: RecordPatch) -> Result<()> {
        self.load();
        self.races.entry(key.to_string()).or_default().apply(patch);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Round-trip through Value so object keys come out sorted.
        let value = serde_json::to_value(&self.races)?;
        let body = serde_json::to_string_pretty(&value)?;

        let tmp = tmp_path(&self.path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(body.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pcs-pushover-storage-{}-{name}", std::process::id()))
            .join("state.json")
    }

    #[test]
    fn tmp_path_appends_suffix() {
        let p = tmp_path(Path::new(".cache/state.json"));
        assert_eq!(p, PathBuf::from(".cache/state.json.tmp"));
    }

    #[test]
    fn get_or_init_is_idempotent() {
        let mut store = StateStore::open(scratch("idempotent"));
        let a = store.get_or_init("123");
        let b = store.get_or_init("123");
        assert_eq!(a, b);
        assert_eq!(a, RaceRecord::default());
    }

    #[test]
    fn save_leaves_no_tmp_file_behind() {
        let path = scratch("no-tmp");
        let _ = fs::remove_file(&path);
        let mut store = StateStore::open(&path);
        store
            .apply_patch(
                "42",
                RecordPatch {
                    notified_start: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
