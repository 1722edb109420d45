//! Settings resolution.
//!
//! Turns a user's [`Settings`] plus the configured palettes and platform
//! schemes into one effective [`Palette`], and a palette for every platform
//! scheme.
//!
//! ## Precedence
//!
//! The base choice is the first of these that is valid:
//!
//! 1. the stored choice (a known palette, or follow-the-platform when at
//!    least one platform scheme is configured)
//! 2. the configured fallback
//!
//! If neither is valid the configuration is broken and resolution fails with
//! [`SchemeError::InvalidConfiguration`].
//!
//! A palette for each platform scheme is the first of these that names a
//! known palette:
//!
//! 1. the user's override for that scheme (only with system tracking enabled)
//! 2. the scheme's own default palette
//! 3. the fallback, when it is a fixed palette
//!
//! When the base choice follows the platform, detectors are queried in
//! declaration order and the first one that matches selects the effective
//! palette. No match is an error ([`SchemeError::UnresolvableSystemScheme`]).
//!
//! ```rust
//! use hueswitch::platform::{ManualDetector, PlatformScheme};
//! use hueswitch::resolver::resolve;
//! use hueswitch::{Palette, PaletteSet, SchemeChoice, Settings};
//!
//! let palettes = PaletteSet::new(vec![Palette::new("light"), Palette::new("dark")]).unwrap();
//! let schemes = vec![
//!     PlatformScheme::new("light", ManualDetector::new(false), "light"),
//!     PlatformScheme::new("dark", ManualDetector::new(true), "dark"),
//! ];
//! let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
//!
//! let resolution = resolve(&settings, &palettes, &schemes, &SchemeChoice::fixed("light"), false).unwrap();
//! assert_eq!(resolution.palette().name(), "dark");
//! assert_eq!(resolution.platform_scheme(), Some("dark"));
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, SchemeError};
use crate::palette::{Palette, PaletteSet, SchemeChoice};
use crate::platform::{active_platform_scheme, PlatformScheme};
use crate::settings::Settings;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    choice: SchemeChoice,
    palette: Palette,
    platform_scheme: Option<String>,
    system_palettes: Vec<(String, Palette)>,
    system_tracking: bool,
}

impl Resolution {
    /// The effective palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The base choice that was used (stored choice or fallback).
    pub fn choice(&self) -> &SchemeChoice {
        &self.choice
    }

    /// Returns true when the platform is being followed.
    pub fn follows_platform(&self) -> bool {
        self.choice.follows_platform()
    }

    /// The platform scheme whose detector selected the palette, if following
    /// the platform.
    pub fn platform_scheme(&self) -> Option<&str> {
        self.platform_scheme.as_deref()
    }

    /// The palette for every platform scheme, in declaration order.
    pub fn system_palettes(&self) -> &[(String, Palette)] {
        &self.system_palettes
    }

    /// The palette for one platform scheme.
    pub fn system_palette(&self, platform_scheme: &str) -> Option<&Palette> {
        self.system_palettes
            .iter()
            .find(|(name, _)| name == platform_scheme)
            .map(|(_, palette)| palette)
    }

    /// Platform scheme name → palette name, only when system tracking is
    /// enabled.
    pub fn system_overrides(&self) -> Option<BTreeMap<String, String>> {
        if !self.system_tracking {
            return None;
        }
        Some(
            self.system_palettes
                .iter()
                .map(|(scheme, palette)| (scheme.clone(), palette.name().to_string()))
                .collect(),
        )
    }

    /// Settings that reproduce this resolution, e.g. to seed a picker.
    pub fn settings(&self) -> Settings {
        Settings {
            choice: Some(self.choice.clone()),
            system_overrides: self.system_overrides().unwrap_or_default(),
        }
    }
}

/// Resolves the effective palette.
///
/// Pure apart from reading each detector's current state.
///
/// # Errors
///
/// - [`SchemeError::InvalidConfiguration`] if neither the stored choice nor
///   the fallback resolves, or a platform scheme has no resolvable palette
/// - [`SchemeError::UnresolvableSystemScheme`] if following the platform and
///   no detector matches
pub fn resolve(
    settings: &Settings,
    palettes: &PaletteSet,
    platform_schemes: &[PlatformScheme],
    fallback: &SchemeChoice,
    system_tracking: bool,
) -> Result<Resolution> {
    let can_follow = !platform_schemes.is_empty();
    let choice = base_choice(settings.choice.as_ref(), palettes, can_follow)
        .or_else(|| base_choice(Some(fallback), palettes, can_follow))
        .ok_or_else(|| SchemeError::invalid(fallback.as_str()))?
        .clone();

    let system_palettes = platform_schemes
        .iter()
        .map(|scheme| {
            platform_palette(scheme, settings, palettes, fallback, system_tracking)
                .map(|palette| (scheme.name().to_string(), palette.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let (palette, platform_scheme) = match &choice {
        SchemeChoice::Fixed(name) => {
            let palette = palettes.get(name).ok_or_else(|| SchemeError::invalid(name))?;
            (palette.clone(), None)
        }
        SchemeChoice::FollowPlatform => {
            let active = active_platform_scheme(platform_schemes)
                .ok_or(SchemeError::UnresolvableSystemScheme)?;
            let palette = system_palettes
                .iter()
                .find(|(name, _)| name == active.name())
                .map(|(_, palette)| palette.clone())
                .ok_or_else(|| SchemeError::invalid(active.default_palette()))?;
            (palette, Some(active.name().to_string()))
        }
    };

    log::debug!(
        "resolved color scheme {} (choice: {}, platform scheme: {})",
        palette.name(),
        choice,
        platform_scheme.as_deref().unwrap_or("-")
    );

    Ok(Resolution {
        choice,
        palette,
        platform_scheme,
        system_palettes,
        system_tracking,
    })
}

fn base_choice<'a>(
    choice: Option<&'a SchemeChoice>,
    palettes: &PaletteSet,
    can_follow: bool,
) -> Option<&'a SchemeChoice> {
    choice.filter(|choice| match choice {
        SchemeChoice::Fixed(name) => palettes.contains(name),
        SchemeChoice::FollowPlatform => can_follow,
    })
}

/// Resolves the palette for one platform scheme.
pub fn platform_palette<'p>(
    scheme: &PlatformScheme,
    settings: &Settings,
    palettes: &'p PaletteSet,
    fallback: &SchemeChoice,
    system_tracking: bool,
) -> Result<&'p Palette> {
    let user_override = system_tracking
        .then(|| settings.system_overrides.get(scheme.name()))
        .flatten()
        .and_then(|name| palettes.get(name));

    user_override
        .or_else(|| palettes.get(scheme.default_palette()))
        .or_else(|| match fallback {
            SchemeChoice::Fixed(name) => palettes.get(name),
            SchemeChoice::FollowPlatform => None,
        })
        .ok_or_else(|| SchemeError::invalid(scheme.default_palette()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualDetector;

    fn palettes() -> PaletteSet {
        PaletteSet::new(vec![
            Palette::new("light").with("color-scheme", "light"),
            Palette::new("dark").with("color-scheme", "dark"),
        ])
        .unwrap()
    }

    fn schemes(light: bool, dark: bool) -> Vec<PlatformScheme> {
        vec![
            PlatformScheme::new("light", ManualDetector::new(light), "light"),
            PlatformScheme::new("dark", ManualDetector::new(dark), "dark"),
        ]
    }

    fn light() -> SchemeChoice {
        SchemeChoice::fixed("light")
    }

    // =========================================================================
    // Base choice
    // =========================================================================

    #[test]
    fn test_fixed_choice_wins() {
        let settings = Settings::new().with_choice("dark");
        let resolution = resolve(&settings, &palettes(), &schemes(true, false), &light(), true)
            .unwrap();
        assert_eq!(resolution.palette().name(), "dark");
        assert_eq!(resolution.platform_scheme(), None);
        assert!(!resolution.follows_platform());
    }

    #[test]
    fn test_unknown_choice_falls_back() {
        let settings = Settings::new().with_choice("nonexistent");
        let resolution = resolve(&settings, &palettes(), &[], &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "light");
        assert_eq!(resolution.choice(), &light());
    }

    #[test]
    fn test_unset_choice_falls_back() {
        let resolution = resolve(&Settings::new(), &palettes(), &[], &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "light");
    }

    #[test]
    fn test_follow_platform_without_schemes_falls_back() {
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let resolution = resolve(&settings, &palettes(), &[], &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "light");
        assert_eq!(resolution.choice(), &light());
        assert!(!resolution.follows_platform());
    }

    #[test]
    fn test_follow_platform_fallback_without_schemes_is_invalid() {
        let err = resolve(
            &Settings::new(),
            &palettes(),
            &[],
            &SchemeChoice::FollowPlatform,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SchemeError::InvalidConfiguration { name } if name == "system"));
    }

    #[test]
    fn test_invalid_fallback_is_invalid_configuration() {
        let settings = Settings::new().with_choice("nonexistent");
        let err = resolve(
            &settings,
            &palettes(),
            &[],
            &SchemeChoice::fixed("nonexistent"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SchemeError::InvalidConfiguration { name } if name == "nonexistent"));
    }

    // =========================================================================
    // Following the platform
    // =========================================================================

    #[test]
    fn test_follow_platform_uses_matching_default() {
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let resolution =
            resolve(&settings, &palettes(), &schemes(false, true), &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "dark");
        assert_eq!(resolution.platform_scheme(), Some("dark"));
    }

    #[test]
    fn test_follow_platform_honors_override_with_tracking() {
        let settings = Settings::new()
            .with_choice(SchemeChoice::FollowPlatform)
            .with_override("dark", "light");
        let resolution =
            resolve(&settings, &palettes(), &schemes(false, true), &light(), true).unwrap();
        assert_eq!(resolution.palette().name(), "light");
        assert_eq!(resolution.platform_scheme(), Some("dark"));
    }

    #[test]
    fn test_follow_platform_ignores_override_without_tracking() {
        let settings = Settings::new()
            .with_choice(SchemeChoice::FollowPlatform)
            .with_override("dark", "light");
        let resolution =
            resolve(&settings, &palettes(), &schemes(false, true), &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "dark");
    }

    #[test]
    fn test_invalid_override_falls_back_to_scheme_default() {
        let settings = Settings::new()
            .with_choice(SchemeChoice::FollowPlatform)
            .with_override("dark", "sepia");
        let resolution =
            resolve(&settings, &palettes(), &schemes(false, true), &light(), true).unwrap();
        assert_eq!(resolution.palette().name(), "dark");
    }

    #[test]
    fn test_first_matching_detector_wins() {
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let resolution =
            resolve(&settings, &palettes(), &schemes(true, true), &light(), false).unwrap();
        assert_eq!(resolution.platform_scheme(), Some("light"));
    }

    #[test]
    fn test_no_matching_detector_is_unresolvable() {
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let err = resolve(&settings, &palettes(), &schemes(false, false), &light(), false)
            .unwrap_err();
        assert!(matches!(err, SchemeError::UnresolvableSystemScheme));
    }

    #[test]
    fn test_follow_platform_fallback() {
        let resolution = resolve(
            &Settings::new(),
            &palettes(),
            &schemes(false, true),
            &SchemeChoice::FollowPlatform,
            false,
        )
        .unwrap();
        assert_eq!(resolution.palette().name(), "dark");
    }

    // =========================================================================
    // Platform scheme palettes
    // =========================================================================

    #[test]
    fn test_scheme_default_missing_uses_fixed_fallback() {
        let schemes = vec![PlatformScheme::new(
            "dark",
            ManualDetector::new(true),
            "midnight",
        )];
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let resolution = resolve(&settings, &palettes(), &schemes, &light(), false).unwrap();
        assert_eq!(resolution.palette().name(), "light");
    }

    #[test]
    fn test_scheme_default_missing_with_platform_fallback_fails() {
        let schemes = vec![PlatformScheme::new(
            "dark",
            ManualDetector::new(true),
            "midnight",
        )];
        let err = resolve(
            &Settings::new(),
            &palettes(),
            &schemes,
            &SchemeChoice::FollowPlatform,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SchemeError::InvalidConfiguration { name } if name == "midnight"));
    }

    #[test]
    fn test_system_palettes_computed_for_every_scheme() {
        let settings = Settings::new()
            .with_choice("dark")
            .with_override("light", "dark");
        let resolution =
            resolve(&settings, &palettes(), &schemes(true, false), &light(), true).unwrap();

        assert_eq!(resolution.system_palette("light").unwrap().name(), "dark");
        assert_eq!(resolution.system_palette("dark").unwrap().name(), "dark");
        let overrides = resolution.system_overrides().unwrap();
        assert_eq!(overrides["light"], "dark");
        assert_eq!(overrides["dark"], "dark");
    }

    #[test]
    fn test_system_overrides_hidden_without_tracking() {
        let resolution =
            resolve(&Settings::new(), &palettes(), &schemes(true, false), &light(), false)
                .unwrap();
        assert_eq!(resolution.system_overrides(), None);
        assert_eq!(resolution.system_palettes().len(), 2);
    }

    #[test]
    fn test_settings_roundtrip_from_resolution() {
        let settings = Settings::new()
            .with_choice(SchemeChoice::FollowPlatform)
            .with_override("dark", "light");
        let resolution =
            resolve(&settings, &palettes(), &schemes(false, true), &light(), true).unwrap();

        let reproduced = resolution.settings();
        assert_eq!(reproduced.choice, Some(SchemeChoice::FollowPlatform));
        assert_eq!(reproduced.system_overrides["dark"], "light");
        assert_eq!(reproduced.system_overrides["light"], "light");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let settings = Settings::new().with_choice(SchemeChoice::FollowPlatform);
        let schemes = schemes(false, true);
        let first = resolve(&settings, &palettes(), &schemes, &light(), true).unwrap();
        let second = resolve(&settings, &palettes(), &schemes, &light(), true).unwrap();
        assert_eq!(first, second);
    }
}
