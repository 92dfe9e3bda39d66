//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `CRUDKIT_DEBUG` | `debug` |
//! | `CRUDKIT_LOG_LEVEL` | `log_level` |
//! | `CRUDKIT_LANGUAGE_CODE` | `language_code` |
//! | `CRUDKIT_CURRENCY_CODE` | `currency_code` |
//! | `CRUDKIT_CURRENCY_SYMBOL` | `currency_symbol` |
//! | `CRUDKIT_PHONE_REGION` | `default_phone_region` |
//! | `CRUDKIT_UTC_OFFSET_MINUTES` | `utc_offset_minutes` |
//! | `CRUDKIT_PAGE_SIZE` | `page_size` |
//! | `CRUDKIT_PREFERENCES_PATH` | `preferences_path` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use crudkit_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/crudkit.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::CrudError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, CrudError> {
    // Merge through serde_json so that missing keys keep their defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| CrudError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_into_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, CrudError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, CrudError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, CrudError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| CrudError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_into_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, CrudError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, CrudError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `CRUDKIT_*` environment variable overrides to a settings struct.
///
/// Numeric variables that fail to parse are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Applies overrides from an arbitrary lookup function.
///
/// [`apply_env_overrides`] is this function backed by the process environment.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CRUDKIT_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("CRUDKIT_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("CRUDKIT_LANGUAGE_CODE") {
        settings.language_code = val;
    }

    if let Some(val) = lookup("CRUDKIT_CURRENCY_CODE") {
        settings.currency_code = val.to_uppercase();
    }

    if let Some(val) = lookup("CRUDKIT_CURRENCY_SYMBOL") {
        settings.currency_symbol = val;
    }

    if let Some(val) = lookup("CRUDKIT_PHONE_REGION") {
        settings.default_phone_region = val.to_uppercase();
    }

    if let Some(val) = lookup("CRUDKIT_UTC_OFFSET_MINUTES") {
        if let Ok(minutes) = val.trim().parse::<i32>() {
            settings.utc_offset_minutes = minutes;
        }
    }

    if let Some(val) = lookup("CRUDKIT_PAGE_SIZE") {
        if let Ok(size) = val.trim().parse::<usize>() {
            settings.page_size = size;
        }
    }

    if let Some(val) = lookup("CRUDKIT_PREFERENCES_PATH") {
        settings.preferences_path = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, CrudError> {
    std::fs::read_to_string(path).map_err(|e| {
        CrudError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_into_defaults(value: serde_json::Value, format: &str) -> Result<Settings, CrudError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        CrudError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        CrudError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            currency_symbol = "€"
            utc_offset_minutes = -300
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.currency_symbol, "€");
        assert_eq!(settings.utc_offset_minutes, -300);
        // Defaults preserved
        assert_eq!(settings.page_size, 100);
    }

    #[test]
    fn test_from_toml_str_extra() {
        let toml = r#"
            [extra]
            brand = "Acme"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.extra["brand"], serde_json::json!("Acme"));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.currency_code, "USD");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(CrudError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("page_size = \"lots\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "log_level": "debug",
            "default_phone_region": "CA",
            "preferences_path": "/tmp/prefs.json"
        }"#;

        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.default_phone_region, "CA");
        assert_eq!(
            settings.preferences_path,
            Some(PathBuf::from("/tmp/prefs.json"))
        );
        assert_eq!(settings.currency_symbol, "$");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let result = from_toml_file("/definitely/not/here.toml");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("not/here.toml"));
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("crudkit.toml");
        std::fs::write(&toml_path, "currency_symbol = \"€\"\npage_size = 10\n").unwrap();
        let settings = from_toml_file(&toml_path).unwrap();
        assert_eq!(settings.currency_symbol, "€");
        assert_eq!(settings.page_size, 10);

        let json_path = dir.path().join("crudkit.json");
        std::fs::write(&json_path, r#"{"default_phone_region": "GB"}"#).unwrap();
        assert_eq!(from_json_file(&json_path).unwrap().default_phone_region, "GB");
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("CRUDKIT_DEBUG", "false"),
            ("CRUDKIT_CURRENCY_CODE", "eur"),
            ("CRUDKIT_PHONE_REGION", "gb"),
            ("CRUDKIT_UTC_OFFSET_MINUTES", "60"),
            ("CRUDKIT_PAGE_SIZE", "25"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides(&mut settings, |name| env.get(name).map(|v| (*v).to_string()));

        assert!(!settings.debug);
        assert_eq!(settings.currency_code, "EUR");
        assert_eq!(settings.default_phone_region, "GB");
        assert_eq!(settings.utc_offset_minutes, 60);
        assert_eq!(settings.page_size, 25);
    }

    #[test]
    fn test_apply_overrides_ignores_bad_numbers() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |name| {
            (name == "CRUDKIT_PAGE_SIZE").then(|| "many".to_string())
        });
        assert_eq!(settings.page_size, 100);
    }

    #[test]
    fn test_apply_overrides_clears_preferences_path() {
        let mut settings = Settings {
            preferences_path: Some(PathBuf::from("/tmp/x.json")),
            ..Settings::default()
        };
        apply_overrides(&mut settings, |name| {
            (name == "CRUDKIT_PREFERENCES_PATH").then(String::new)
        });
        assert!(settings.preferences_path.is_none());
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}});
        let over = serde_json::json!({"a": {"c": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"b": 1, "c": 3}}));
    }
}
