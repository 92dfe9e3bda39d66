//! Settings system for crudkit.
//!
//! This module provides the [`Settings`] struct, which holds the library's
//! configuration. Components take a `Settings` value explicitly.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The complete set of library settings.
///
/// Pass a `Settings` value to the components that need it.
///
/// # Examples
///
/// ```
/// use crudkit_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.currency_symbol, "$");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level filter (e.g. "info", "crudkit_forms=debug").
    pub log_level: String,

    // ── Formatting ───────────────────────────────────────────────────

    /// The language code used for labels (e.g. "en-us").
    pub language_code: String,
    /// ISO 4217 code of the currency stored in currency fields.
    pub currency_code: String,
    /// Symbol prefixed to formatted currency values.
    pub currency_symbol: String,
    /// Region used to display phone numbers when none was picked by the user.
    pub default_phone_region: String,
    /// Offset from UTC, in minutes, used to display local date-times.
    pub utc_offset_minutes: i32,

    // ── Listing ──────────────────────────────────────────────────────

    /// Default page size for reference lookups and tables.
    pub page_size: usize,

    // ── Preferences ──────────────────────────────────────────────────

    /// File backing the local preference store. In-memory when `None`.
    pub preferences_path: Option<PathBuf>,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            language_code: "en-us".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            default_phone_region: "US".to_string(),
            utc_offset_minutes: 0,
            page_size: 100,
            preferences_path: None,
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.language_code, "en-us");
        assert_eq!(s.currency_code, "USD");
        assert_eq!(s.default_phone_region, "US");
        assert_eq!(s.utc_offset_minutes, 0);
        assert_eq!(s.page_size, 100);
        assert!(s.preferences_path.is_none());
    }

    #[test]
    fn test_settings_serde_round_trip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page_size, s.page_size);
        assert_eq!(back.currency_code, s.currency_code);
    }
}
