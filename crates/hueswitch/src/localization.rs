//! Picker labels.
//!
//! The picker asks a [`Localization`] for every label it shows: the fixed
//! keys below plus each palette and platform scheme name.

use std::collections::HashMap;

/// Label of the picker itself.
pub const KEY_COLOR_SCHEME: &str = "color_scheme";
/// Label of the follow-the-platform option.
pub const KEY_SYSTEM: &str = "system";
/// Heading of the per-platform-scheme override selectors.
pub const KEY_SYSTEM_COLOR_SCHEME: &str = "system_color_scheme";

/// Translates label keys.
pub trait Localization: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Map-backed localization. Unknown keys translate to themselves.
///
/// ```rust
/// use hueswitch::localization::{Localization, StaticLocalization};
///
/// let l10n = StaticLocalization::new().with("dark", "Dunkel");
/// assert_eq!(l10n.translate("dark"), "Dunkel");
/// assert_eq!(l10n.translate("light"), "light");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLocalization {
    entries: HashMap<String, String>,
}

impl StaticLocalization {
    pub fn new() -> Self {
        Self::default()
    }

    /// English labels for the fixed keys and the built-in palettes.
    pub fn english() -> Self {
        Self::new()
            .with(KEY_COLOR_SCHEME, "Color scheme")
            .with(KEY_SYSTEM, "System")
            .with(KEY_SYSTEM_COLOR_SCHEME, "System color scheme")
            .with("light", "Light")
            .with("dark", "Dark")
    }

    pub fn with(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.entries.insert(key.into(), label.into());
        self
    }
}

impl Localization for StaticLocalization {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
