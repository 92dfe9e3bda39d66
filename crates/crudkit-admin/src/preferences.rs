//! Local user preferences.
//!
//! Preferences are small, non-critical key/value strings such as the phone
//! region a user picked. Nothing here is a stable format: a missing or
//! unreadable preferences file starts over empty.
//!
//! Keys are either static (a fixed name such as [`PHONE_REGION_KEY`]) or
//! dynamic (a prefix plus a resource name, such as the per-resource page
//! size). [`PreferenceStore::wipe`] removes the static keys only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crudkit_core::{CrudError, CrudResult, Settings, ValidationError};
use crudkit_forms::format;
use tracing::warn;

/// The phone region picked in phone editors.
pub const PHONE_REGION_KEY: &str = "phone_number_region";

/// Keys removed by [`PreferenceStore::wipe`].
pub const STATIC_KEYS: &[&str] = &[PHONE_REGION_KEY];

/// Prefix of the per-resource page size keys.
pub const PAGE_SIZE_KEY_PREFIX: &str = "page_size:";

/// Key/value storage for preferences.
///
/// Methods take `&self`; implementations synchronize internally.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> CrudResult<()>;

    fn remove(&self, key: &str) -> CrudResult<()>;

    /// Returns every stored key.
    fn keys(&self) -> Vec<String>;

    /// Removes the static keys. Dynamic keys are kept.
    fn wipe(&self) -> CrudResult<()> {
        for key in STATIC_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Preferences held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> CrudResult<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CrudResult<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Preferences persisted to a JSON object file after every change.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFilePreferences {
    /// Opens the file at `path`, starting empty if it is missing or
    /// unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read(&path);
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> BTreeMap<String, String> {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "ignoring unreadable preferences file");
            BTreeMap::new()
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> CrudResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> CrudResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut values);
        self.persist(&values)
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> CrudResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> CrudResult<()> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Opens the preference store `settings` asks for: a JSON file when
/// `preferences_path` is set, memory otherwise.
pub fn open_preferences(settings: &Settings) -> Box<dyn PreferenceStore> {
    match &settings.preferences_path {
        Some(path) => Box::new(JsonFilePreferences::open(path.clone())),
        None => Box::new(InMemoryPreferences::new()),
    }
}

/// Returns the stored phone region, or `default` when none (or an unknown
/// one) is stored.
pub fn phone_region(store: &dyn PreferenceStore, default: &str) -> String {
    store
        .get(PHONE_REGION_KEY)
        .filter(|region| format::phone_region(region).is_some())
        .unwrap_or_else(|| default.to_string())
}

/// Stores the phone region.
///
/// # Errors
///
/// Rejects regions the phone editors do not offer.
pub fn set_phone_region(store: &dyn PreferenceStore, region: &str) -> CrudResult<()> {
    if format::phone_region(region).is_none() {
        return Err(CrudError::ValidationError(
            ValidationError::new("Unknown phone region.", "invalid_region")
                .with_param("region", region),
        ));
    }
    store.set(PHONE_REGION_KEY, &region.to_ascii_uppercase())
}

fn page_size_key(resource: &str) -> String {
    format!("{PAGE_SIZE_KEY_PREFIX}{resource}")
}

/// Returns the page size stored for `resource`, or `default`.
pub fn page_size(store: &dyn PreferenceStore, resource: &str, default: usize) -> usize {
    store
        .get(&page_size_key(resource))
        .and_then(|s| s.parse().ok())
        .filter(|size| *size > 0)
        .unwrap_or(default)
}

/// Stores the page size for `resource`.
pub fn set_page_size(store: &dyn PreferenceStore, resource: &str, size: usize) -> CrudResult<()> {
    store.set(&page_size_key(resource), &size.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemoryPreferences::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_phone_region_default_and_validation() {
        let store = InMemoryPreferences::new();
        assert_eq!(phone_region(&store, "US"), "US");
        set_phone_region(&store, "gb").unwrap();
        assert_eq!(phone_region(&store, "US"), "GB");

        let err = set_phone_region(&store, "XX").unwrap_err();
        assert!(matches!(err, CrudError::ValidationError(_)));
        assert_eq!(phone_region(&store, "US"), "GB");
    }

    #[test]
    fn test_unknown_stored_region_falls_back() {
        let store = InMemoryPreferences::new();
        store.set(PHONE_REGION_KEY, "Atlantis").unwrap();
        assert_eq!(phone_region(&store, "US"), "US");
    }

    #[test]
    fn test_page_size() {
        let store = InMemoryPreferences::new();
        assert_eq!(page_size(&store, "people", 25), 25);
        set_page_size(&store, "people", 50).unwrap();
        assert_eq!(page_size(&store, "people", 25), 50);
        assert_eq!(page_size(&store, "jobs", 25), 25);
        set_page_size(&store, "jobs", 0).unwrap();
        assert_eq!(page_size(&store, "jobs", 25), 25);
    }

    #[test]
    fn test_wipe_keeps_dynamic_keys() {
        let store = InMemoryPreferences::new();
        set_phone_region(&store, "GB").unwrap();
        set_page_size(&store, "people", 50).unwrap();
        store.wipe().unwrap();
        assert!(store.get(PHONE_REGION_KEY).is_none());
        assert_eq!(store.keys(), vec!["page_size:people"]);
    }

    #[test]
    fn test_json_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let store = JsonFilePreferences::open(&path);
        set_phone_region(&store, "AU").unwrap();

        let reopened = JsonFilePreferences::open(&path);
        assert_eq!(reopened.get(PHONE_REGION_KEY).as_deref(), Some("AU"));
        reopened.wipe().unwrap();
        assert!(JsonFilePreferences::open(&path).keys().is_empty());
    }

    #[test]
    fn test_json_file_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFilePreferences::open(&path);
        assert!(store.keys().is_empty());
        store.set("k", "v").unwrap();
        assert_eq!(JsonFilePreferences::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_open_preferences_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            preferences_path: Some(dir.path().join("prefs.json")),
            ..Settings::default()
        };
        let store = open_preferences(&settings);
        store.set("k", "v").unwrap();
        assert!(dir.path().join("prefs.json").exists());
        assert!(open_preferences(&Settings::default()).keys().is_empty());
    }
}
