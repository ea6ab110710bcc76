use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::constants::{HOME_LAT_KEY, HOME_LON_KEY};
use crate::data::coordinate::Coordinate;
use crate::utils::logging::{self, OperationCategory, StorageType};

/// Key-value persistence for the single home coordinate. Failures are
/// logged and read back as "home not set".
pub trait HomeStore: Send {
    fn get(&self) -> Option<Coordinate>;
    fn set(&mut self, home: Coordinate);
    fn clear(&mut self);
}

/// In-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryHomeStore {
    slot: Arc<Mutex<Option<Coordinate>>>,
}

impl MemoryHomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_home(home: Coordinate) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(home))),
        }
    }
}

impl HomeStore for MemoryHomeStore {
    fn get(&self) -> Option<Coordinate> {
        *self.slot.lock()
    }

    fn set(&mut self, home: Coordinate) {
        *self.slot.lock() = Some(home);
    }

    fn clear(&mut self) {
        *self.slot.lock() = None;
    }
}

/// JSON file of string-valued preference keys, `house_lat` and `house_lon`.
#[derive(Debug, Clone)]
pub struct JsonFileHomeStore {
    path: PathBuf,
}

impl JsonFileHomeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_prefs(&self) -> HashMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), "No stored preferences: {}", e);
                return HashMap::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable preferences: {}", e);
                HashMap::new()
            }
        }
    }

    fn write_prefs(&self, prefs: &HashMap<String, String>) {
        let result = serde_json::to_string_pretty(prefs)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));
        if let Err(e) = result {
            warn!(path = %self.path.display(), "Failed to write preferences: {}", e);
        }
    }
}

impl HomeStore for JsonFileHomeStore {
    fn get(&self) -> Option<Coordinate> {
        let _timing = logging::start_timing("home_store_get",
            OperationCategory::Storage { subcategory: StorageType::Load });

        let prefs = self.read_prefs();
        let lat = prefs.get(HOME_LAT_KEY)?.parse::<f64>().ok()?;
        let lon = prefs.get(HOME_LON_KEY)?.parse::<f64>().ok()?;
        match Coordinate::new(lat, lon) {
            Ok(home) => Some(home),
            Err(e) => {
                warn!("Stored home is invalid: {}", e);
                None
            }
        }
    }

    fn set(&mut self, home: Coordinate) {
        let _timing = logging::start_timing("home_store_set",
            OperationCategory::Storage { subcategory: StorageType::Save });

        let mut prefs = self.read_prefs();
        prefs.insert(HOME_LAT_KEY.to_string(), home.latitude().to_string());
        prefs.insert(HOME_LON_KEY.to_string(), home.longitude().to_string());
        self.write_prefs(&prefs);
    }

    fn clear(&mut self) {
        let _timing = logging::start_timing("home_store_clear",
            OperationCategory::Storage { subcategory: StorageType::Clear });

        let mut prefs = self.read_prefs();
        prefs.remove(HOME_LAT_KEY);
        prefs.remove(HOME_LON_KEY);
        self.write_prefs(&prefs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Coordinate {
        Coordinate::new(9.9347, -84.0875).unwrap()
    }

    #[test]
    fn memory_store_clones_share_slot() {
        let store = MemoryHomeStore::new();
        let mut writer = store.clone();
        writer.set(home());
        assert_eq!(store.get(), Some(home()));
        writer.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.json");

        let mut store = JsonFileHomeStore::new(&path);
        assert_eq!(store.get(), None);
        store.set(home());

        let reopened = JsonFileHomeStore::new(&path);
        assert_eq!(reopened.get(), Some(home()));

        let raw: HashMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("house_lat").map(String::as_str), Some("9.9347"));
    }

    #[test]
    fn file_store_clear_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"theme":"dark","house_lat":"1.0","house_lon":"2.0"}"#).unwrap();

        let mut store = JsonFileHomeStore::new(&path);
        assert_eq!(store.get(), Coordinate::new(1.0, 2.0).ok());
        store.clear();
        assert_eq!(store.get(), None);
        assert!(fs::read_to_string(&path).unwrap().contains("theme"));
    }

    #[test]
    fn corrupt_file_reads_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(JsonFileHomeStore::new(&path).get(), None);

        fs::write(&path, r#"{"house_lat":"abc","house_lon":"2.0"}"#).unwrap();
        assert_eq!(JsonFileHomeStore::new(&path).get(), None);
    }
}
