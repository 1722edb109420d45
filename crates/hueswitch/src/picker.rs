//! Scheme picker model.
//!
//! [`SchemePicker`] describes a selection UI without committing to a
//! toolkit: one selector for the scheme itself (every palette plus the
//! follow-the-platform option when platform schemes are configured) and, with system tracking enabled, one
//! selector per platform scheme choosing the palette used while that
//! platform scheme is active. Changing either stores the settings through
//! the manager, which re-renders.
//!
//! [`SchemePicker::render_terminal`] draws the model as text for CLIs.

use std::fmt::Write as _;

use console::Style;

use crate::color::Rgb;
use crate::error::{Result, SchemeError};
use crate::localization::{Localization, KEY_COLOR_SCHEME, KEY_SYSTEM, KEY_SYSTEM_COLOR_SCHEME};
use crate::manager::ColorScheme;
use crate::palette::{Palette, PaletteSet, SchemeChoice};
use crate::platform::PlatformScheme;
use crate::resolver::Resolution;
use crate::settings::Settings;
use crate::stylesheet::palette_value;

const ACCENT_COLOR: &str = "accent-color";

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub choice: SchemeChoice,
    pub label: String,
    /// Accent swatch, when enabled and the palette defines a parsable
    /// accent color.
    pub accent: Option<Rgb>,
}

/// Palette selector for one platform scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSelector {
    pub platform_scheme: String,
    pub label: String,
    pub selected: String,
}

#[derive(Debug)]
pub struct SchemePicker {
    manager: ColorScheme,
    title: String,
    system_heading: String,
    options: Vec<PickerOption>,
    overrides: Vec<OverrideSelector>,
    settings: Settings,
}

impl SchemePicker {
    pub(crate) fn new(
        manager: ColorScheme,
        palettes: &PaletteSet,
        platform_schemes: &[PlatformScheme],
        resolution: &Resolution,
        system_tracking: bool,
        show_accent_color: bool,
        localization: &dyn Localization,
    ) -> Self {
        let mut options = Vec::with_capacity(palettes.len() + 1);
        if !platform_schemes.is_empty() {
            options.push(PickerOption {
                choice: SchemeChoice::FollowPlatform,
                label: localization.translate(KEY_SYSTEM),
                accent: None,
            });
        }
        options.extend(palettes.iter().map(|palette| PickerOption {
            choice: SchemeChoice::fixed(palette.name()),
            label: localization.translate(palette.name()),
            accent: show_accent_color.then(|| accent(palette)).flatten(),
        }));

        let overrides = if system_tracking {
            platform_schemes
                .iter()
                .filter_map(|scheme| {
                    let palette = resolution.system_palette(scheme.name())?;
                    Some(OverrideSelector {
                        platform_scheme: scheme.name().to_string(),
                        label: localization.translate(scheme.name()),
                        selected: palette.name().to_string(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            manager,
            title: localization.translate(KEY_COLOR_SCHEME),
            system_heading: localization.translate(KEY_SYSTEM_COLOR_SCHEME),
            options,
            overrides,
            settings: resolution.settings(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The follow-the-platform option first (only with platform schemes),
    /// then every palette.
    pub fn options(&self) -> &[PickerOption] {
        &self.options
    }

    /// Per-platform-scheme selectors; empty without system tracking.
    pub fn overrides(&self) -> &[OverrideSelector] {
        &self.overrides
    }

    pub fn selected(&self) -> Option<&SchemeChoice> {
        self.settings.choice.as_ref()
    }

    /// The settings the picker currently shows.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Selects a scheme and stores it.
    ///
    /// # Errors
    ///
    /// [`SchemeError::InvalidConfiguration`] for an unknown palette, and
    /// storage or render errors.
    pub fn select(&mut self, choice: impl Into<SchemeChoice>) -> Result<Resolution> {
        let choice = choice.into();
        if !self.options.iter().any(|option| option.choice == choice) {
            return Err(SchemeError::invalid(choice.as_str()));
        }
        self.settings.choice = Some(choice);
        self.submit()
    }

    /// Sets the palette used while `platform_scheme` is active, and stores
    /// it.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnknownPlatformScheme`] when there is no selector for
    /// `platform_scheme` (including when system tracking is disabled),
    /// [`SchemeError::InvalidConfiguration`] for an unknown palette.
    pub fn set_override(&mut self, platform_scheme: &str, palette: &str) -> Result<Resolution> {
        let known_palette = self
            .options
            .iter()
            .any(|option| option.choice == SchemeChoice::fixed(palette));
        let selector = self
            .overrides
            .iter_mut()
            .find(|selector| selector.platform_scheme == platform_scheme)
            .ok_or_else(|| SchemeError::UnknownPlatformScheme(platform_scheme.to_string()))?;
        if !known_palette {
            return Err(SchemeError::invalid(palette));
        }

        selector.selected = palette.to_string();
        self.settings
            .system_overrides
            .insert(platform_scheme.to_string(), palette.to_string());
        self.submit()
    }

    fn submit(&self) -> Result<Resolution> {
        self.manager.store_settings(&self.settings)
    }

    /// Renders the picker as terminal text. `styled` forces ANSI styling on
    /// or off.
    pub fn render_terminal(&self, styled: bool) -> String {
        let heading = Style::new().bold().force_styling(styled);
        let chosen = Style::new().cyan().force_styling(styled);

        let mut out = String::new();
        let _ = writeln!(out, "{}", heading.apply_to(&self.title));
        for option in &self.options {
            let is_selected = self.selected() == Some(&option.choice);
            let marker = if is_selected { "(•)" } else { "( )" };
            let label = if is_selected {
                chosen.apply_to(&option.label).to_string()
            } else {
                option.label.clone()
            };
            match option.accent {
                Some(rgb) => {
                    let swatch = Style::new()
                        .color256(rgb.to_ansi256())
                        .force_styling(styled)
                        .apply_to("■");
                    let _ = writeln!(out, "  {} {} {}", marker, label, swatch);
                }
                None => {
                    let _ = writeln!(out, "  {} {}", marker, label);
                }
            }
        }

        if !self.overrides.is_empty() {
            let _ = writeln!(out, "{}", heading.apply_to(&self.system_heading));
            for selector in &self.overrides {
                let palette = self
                    .options
                    .iter()
                    .find(|option| option.choice.as_str() == selector.selected)
                    .map(|option| option.label.as_str())
                    .unwrap_or(selector.selected.as_str());
                let _ = writeln!(out, "  {}: {}", selector.label, palette);
            }
        }
        out
    }
}

fn accent(palette: &Palette) -> Option<Rgb> {
    let value = palette_value(palette, ACCENT_COLOR).ok().flatten()?;
    Rgb::parse(&value).ok()
}
