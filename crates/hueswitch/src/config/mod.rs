//! Scheme configuration.
//!
//! [`SchemeConfig`] bundles everything the manager needs besides its
//! collaborators: palettes, platform schemes, the default choice, the
//! projected variables and the two feature flags.
//!
//! # Sources
//!
//! - Builder methods on [`SchemeConfig::new`] (which starts from the
//!   built-in `light`/`dark` setup)
//! - YAML, via [`SchemeConfig::from_yaml`] / [`SchemeConfig::from_file`]
//! - Palettes in CSS, via [`parse_palettes_css`]
//! - The [`SCHEME_ENV_VAR`] environment variable, via
//!   [`SchemeConfig::with_env`]
//!
//! # YAML format
//!
//! ```yaml
//! default: system            # palette name or "system"
//! system_tracking: true      # remember a palette per platform scheme
//! show_accent_color: true    # accent swatches in the picker
//! variables: [accent-color-rgb, color-scheme]
//! palettes:
//!   - name: light
//!     accent-color: "#005ab4"
//!     color-scheme: light
//!   - name: dark
//!     accent-color: "#78b4ff"
//!     color-scheme: dark
//! platform_schemes:
//!   - name: light
//!     mode: light
//!     default: light
//!   - name: dark
//!     mode: dark
//!     default: dark
//! ```
//!
//! Every key is optional. Omitted `palettes` and `platform_schemes` use the
//! built-in ones; an empty `platform_schemes` list disables platform
//! following. `palettes_css` may name a CSS palette file instead of listing
//! palettes inline; it is resolved relative to the YAML file.
//!
//! YAML platform schemes are bound to the operating system's color mode.
//! Schemes with other detectors are configured in code.

mod css;
mod env;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use css::{load_palettes_css, parse_palettes_css};
pub use env::{EnvReader, MockEnv, RealEnv, SCHEME_ENV_VAR};

use crate::defaults::{default_palettes, default_platform_schemes, default_variables};
use crate::error::{Result, SchemeError};
use crate::palette::{Palette, PaletteSet, SchemeChoice};
use crate::platform::{validate_platform_schemes, ColorMode, OsColorMode, PlatformScheme};

/// Manager configuration.
///
/// ```rust
/// use hueswitch::config::SchemeConfig;
/// use hueswitch::platform::{ManualDetector, PlatformScheme};
/// use hueswitch::{Palette, SchemeChoice};
///
/// let config = SchemeConfig::new()
///     .palettes(vec![Palette::new("paper"), Palette::new("ink")])
///     .platform_schemes(vec![
///         PlatformScheme::new("light", ManualDetector::new(true), "paper"),
///         PlatformScheme::new("dark", ManualDetector::new(false), "ink"),
///     ])
///     .system_tracking(true);
///
/// assert_eq!(config.effective_default_choice(), SchemeChoice::FollowPlatform);
/// ```
#[derive(Debug, Clone)]
pub struct SchemeConfig {
    palettes: Vec<Palette>,
    platform_schemes: Vec<PlatformScheme>,
    default_choice: Option<SchemeChoice>,
    variables: Vec<String>,
    system_tracking: bool,
    show_accent_color: bool,
    os_color_mode: OsColorMode,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        let os_color_mode = OsColorMode::new();
        Self {
            palettes: default_palettes(),
            platform_schemes: default_platform_schemes(&os_color_mode),
            default_choice: None,
            variables: default_variables(),
            system_tracking: false,
            show_accent_color: false,
            os_color_mode,
        }
    }
}

impl SchemeConfig {
    /// Starts from the built-in configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palettes(mut self, palettes: Vec<Palette>) -> Self {
        self.palettes = palettes;
        self
    }

    pub fn platform_schemes(mut self, schemes: Vec<PlatformScheme>) -> Self {
        self.platform_schemes = schemes;
        self
    }

    pub fn default_choice(mut self, choice: impl Into<SchemeChoice>) -> Self {
        self.default_choice = Some(choice.into());
        self
    }

    pub fn variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Remembers a palette per platform scheme.
    pub fn system_tracking(mut self, enabled: bool) -> Self {
        self.system_tracking = enabled;
        self
    }

    /// Shows accent color swatches in the picker.
    pub fn show_accent_color(mut self, enabled: bool) -> Self {
        self.show_accent_color = enabled;
        self
    }

    /// Replaces the default choice with [`SCHEME_ENV_VAR`] when it is set
    /// and not blank.
    pub fn with_env(mut self, env: &dyn EnvReader) -> Self {
        if let Some(value) = env.var(SCHEME_ENV_VAR) {
            let value = value.trim();
            if !value.is_empty() {
                log::debug!("default color scheme '{}' taken from {}", value, SCHEME_ENV_VAR);
                self.default_choice = Some(SchemeChoice::from(value));
            }
        }
        self
    }

    pub fn palette_list(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn platform_scheme_list(&self) -> &[PlatformScheme] {
        &self.platform_schemes
    }

    pub fn variable_list(&self) -> &[String] {
        &self.variables
    }

    pub fn is_system_tracking(&self) -> bool {
        self.system_tracking
    }

    pub fn is_showing_accent_color(&self) -> bool {
        self.show_accent_color
    }

    /// The OS color mode source the built-in and YAML platform schemes are
    /// bound to. Hosts call [`OsColorMode::poll`] on it to pick up changes.
    pub fn os_color_mode(&self) -> &OsColorMode {
        &self.os_color_mode
    }

    /// The configured default, or follow-the-platform when platform schemes
    /// exist, or the first palette.
    pub fn effective_default_choice(&self) -> SchemeChoice {
        if let Some(choice) = &self.default_choice {
            return choice.clone();
        }
        if !self.platform_schemes.is_empty() {
            return SchemeChoice::FollowPlatform;
        }
        match self.palettes.first() {
            Some(palette) => SchemeChoice::fixed(palette.name()),
            None => SchemeChoice::FollowPlatform,
        }
    }

    /// Checks palette and platform scheme names, returning the palette set.
    pub fn validate(&self) -> Result<PaletteSet> {
        let palettes = PaletteSet::new(self.palettes.clone())?;
        validate_platform_schemes(&self.platform_schemes)?;
        Ok(palettes)
    }

    /// Parses a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_document(yaml, None)
    }

    /// Loads a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemeError::config(Some(path.to_path_buf()), e.to_string()))?;
        Self::from_document(&content, Some(path))
    }

    fn from_document(yaml: &str, path: Option<&Path>) -> Result<Self> {
        let doc: ConfigDocument = serde_yaml::from_str(yaml)
            .map_err(|e| SchemeError::config(path.map(Path::to_path_buf), e.to_string()))?;

        let mut config = Self::default();

        match (doc.palettes, doc.palettes_css) {
            (Some(_), Some(_)) => {
                return Err(SchemeError::config(
                    path.map(Path::to_path_buf),
                    "'palettes' and 'palettes_css' are mutually exclusive",
                ))
            }
            (Some(palettes), None) => config.palettes = palettes,
            (None, Some(css_path)) => {
                let css_path = match path.and_then(Path::parent) {
                    Some(dir) if css_path.is_relative() => dir.join(css_path),
                    _ => css_path,
                };
                config.palettes = load_palettes_css(css_path)?;
            }
            (None, None) => {}
        }

        if let Some(schemes) = doc.platform_schemes {
            config.platform_schemes = schemes
                .into_iter()
                .map(|scheme| {
                    let detector = config.os_color_mode.detector(scheme.mode);
                    let default = scheme.default.unwrap_or_else(|| scheme.mode.to_string());
                    PlatformScheme::new(scheme.name, detector, default)
                })
                .collect();
        }

        if let Some(variables) = doc.variables {
            config.variables = variables;
        }
        config.default_choice = doc.default;
        config.system_tracking = doc.system_tracking;
        config.show_accent_color = doc.show_accent_color;

        config
            .validate()
            .map_err(|e| SchemeError::config(path.map(Path::to_path_buf), e.to_string()))?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    default: Option<SchemeChoice>,
    #[serde(default)]
    system_tracking: bool,
    #[serde(default)]
    show_accent_color: bool,
    #[serde(default)]
    variables: Option<Vec<String>>,
    #[serde(default)]
    palettes: Option<Vec<Palette>>,
    #[serde(default)]
    palettes_css: Option<PathBuf>,
    #[serde(default)]
    platform_schemes: Option<Vec<PlatformSchemeDocument>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlatformSchemeDocument {
    name: String,
    mode: ColorMode,
    #[serde(default)]
    default: Option<String>,
}
