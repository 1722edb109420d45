//! The persisted user choice.
//!
//! Settings live under two storage keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `color-scheme` | palette name, or `system` to follow the platform |
//! | `color-scheme-system` | object mapping platform scheme name → palette name |
//!
//! The second key only exists while system tracking is enabled; storing
//! settings with tracking disabled deletes it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;
use crate::palette::SchemeChoice;
use crate::storage::SettingsStorage;

/// Storage key of the selected palette name.
pub const SETTINGS_KEY_COLOR_SCHEME: &str = "color-scheme";

/// Storage key of the per-platform-scheme overrides.
pub const SETTINGS_KEY_COLOR_SCHEME_SYSTEM: &str = "color-scheme-system";

/// A user's selection plus optional per-platform-scheme overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// The selected scheme; `None` means "use the configured default".
    pub choice: Option<SchemeChoice>,
    /// Platform scheme name → palette name.
    pub system_overrides: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the choice, returning `self` for chaining.
    pub fn with_choice(mut self, choice: impl Into<SchemeChoice>) -> Self {
        self.choice = Some(choice.into());
        self
    }

    /// Adds a platform scheme override, returning `self` for chaining.
    pub fn with_override(
        mut self,
        platform_scheme: impl Into<String>,
        palette: impl Into<String>,
    ) -> Self {
        self.system_overrides
            .insert(platform_scheme.into(), palette.into());
        self
    }

    /// Reads settings from storage.
    ///
    /// Overrides are only read when `system_tracking` is enabled. Values of
    /// the wrong shape are ignored (and logged) rather than treated as
    /// errors, so a corrupted entry falls back to defaults.
    pub fn load(storage: &dyn SettingsStorage, system_tracking: bool) -> Result<Self> {
        let choice = match storage.get(SETTINGS_KEY_COLOR_SCHEME)? {
            Some(Value::String(name)) => Some(SchemeChoice::from(name.as_str())),
            Some(other) => {
                log::warn!(
                    "ignoring stored '{}' value that is not a string: {}",
                    SETTINGS_KEY_COLOR_SCHEME,
                    other
                );
                None
            }
            None => None,
        };

        let mut system_overrides = BTreeMap::new();
        if system_tracking {
            match storage.get(SETTINGS_KEY_COLOR_SCHEME_SYSTEM)? {
                Some(Value::Object(map)) => {
                    for (platform_scheme, palette) in map {
                        match palette {
                            Value::String(palette) => {
                                system_overrides.insert(platform_scheme, palette);
                            }
                            other => log::warn!(
                                "ignoring override for '{}' that is not a string: {}",
                                platform_scheme,
                                other
                            ),
                        }
                    }
                }
                Some(other) => log::warn!(
                    "ignoring stored '{}' value that is not an object: {}",
                    SETTINGS_KEY_COLOR_SCHEME_SYSTEM,
                    other
                ),
                None => {}
            }
        }

        Ok(Self {
            choice,
            system_overrides,
        })
    }

    /// Writes settings to storage.
    ///
    /// With `system_tracking` enabled the overrides are written; otherwise
    /// the overrides key is deleted.
    pub fn store(&self, storage: &dyn SettingsStorage, system_tracking: bool) -> Result<()> {
        match &self.choice {
            Some(choice) => storage.store(
                SETTINGS_KEY_COLOR_SCHEME,
                Value::String(choice.as_str().to_string()),
            )?,
            None => storage.delete(SETTINGS_KEY_COLOR_SCHEME)?,
        }

        if system_tracking {
            let overrides = self
                .system_overrides
                .iter()
                .map(|(scheme, palette)| (scheme.clone(), Value::String(palette.clone())))
                .collect();
            storage.store(SETTINGS_KEY_COLOR_SCHEME_SYSTEM, Value::Object(overrides))?;
        } else {
            storage.delete(SETTINGS_KEY_COLOR_SCHEME_SYSTEM)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_load_empty_storage() {
        let settings = Settings::load(&MemoryStorage::new(), true).unwrap();
        assert_eq!(settings, Settings::new());
    }

    #[test]
    fn test_load_choice_and_overrides() {
        let storage = MemoryStorage::new()
            .with_value(SETTINGS_KEY_COLOR_SCHEME, "system")
            .with_value(SETTINGS_KEY_COLOR_SCHEME_SYSTEM, json!({"dark": "light"}));

        let settings = Settings::load(&storage, true).unwrap();
        assert_eq!(settings.choice, Some(SchemeChoice::FollowPlatform));
        assert_eq!(
            settings.system_overrides.get("dark").map(String::as_str),
            Some("light")
        );
    }

    #[test]
    fn test_load_skips_overrides_without_tracking() {
        let storage = MemoryStorage::new()
            .with_value(SETTINGS_KEY_COLOR_SCHEME_SYSTEM, json!({"dark": "light"}));

        let settings = Settings::load(&storage, false).unwrap();
        assert!(settings.system_overrides.is_empty());
    }

    #[test]
    fn test_load_ignores_malformed_values() {
        let storage = MemoryStorage::new()
            .with_value(SETTINGS_KEY_COLOR_SCHEME, json!(42))
            .with_value(
                SETTINGS_KEY_COLOR_SCHEME_SYSTEM,
                json!({"dark": 1, "light": "dark"}),
            );

        let settings = Settings::load(&storage, true).unwrap();
        assert_eq!(settings.choice, None);
        assert_eq!(settings.system_overrides.len(), 1);
        assert!(settings.system_overrides.contains_key("light"));
    }

    #[test]
    fn test_store_with_tracking_writes_overrides() {
        let storage = MemoryStorage::new();
        Settings::new()
            .with_choice("dark")
            .with_override("light", "dark")
            .store(&storage, true)
            .unwrap();

        let values = storage.snapshot();
        assert_eq!(values[SETTINGS_KEY_COLOR_SCHEME], json!("dark"));
        assert_eq!(
            values[SETTINGS_KEY_COLOR_SCHEME_SYSTEM],
            json!({"light": "dark"})
        );
    }

    #[test]
    fn test_store_without_tracking_deletes_overrides() {
        let storage = MemoryStorage::new()
            .with_value(SETTINGS_KEY_COLOR_SCHEME_SYSTEM, json!({"dark": "light"}));

        Settings::new()
            .with_choice(SchemeChoice::FollowPlatform)
            .store(&storage, false)
            .unwrap();

        let values = storage.snapshot();
        assert_eq!(values[SETTINGS_KEY_COLOR_SCHEME], json!("system"));
        assert!(!values.contains_key(SETTINGS_KEY_COLOR_SCHEME_SYSTEM));
    }
}
