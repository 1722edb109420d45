//! Built-in palettes, platform schemes and variable list.

use crate::palette::Palette;
use crate::platform::{ColorMode, OsColorMode, PlatformScheme};

/// Variables projected when none are configured.
pub const DEFAULT_VARIABLES: &[&str] = &[
    "accent-color-rgb",
    "accent-foreground-color-rgb",
    "background-color-rgb",
    "color-scheme",
    "foreground-color-rgb",
];

pub fn default_variables() -> Vec<String> {
    DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
}

pub fn light_palette() -> Palette {
    Palette::new("light")
        .with("accent-color-rgb", "0, 90, 180")
        .with("accent-foreground-color-rgb", "255, 255, 255")
        .with("background-color-rgb", "255, 255, 255")
        .with("color-scheme", "light")
        .with("foreground-color-rgb", "0, 0, 0")
}

pub fn dark_palette() -> Palette {
    Palette::new("dark")
        .with("accent-color-rgb", "120, 180, 255")
        .with("accent-foreground-color-rgb", "0, 0, 0")
        .with("background-color-rgb", "30, 30, 30")
        .with("color-scheme", "dark")
        .with("foreground-color-rgb", "255, 255, 255")
}

pub fn default_palettes() -> Vec<Palette> {
    vec![light_palette(), dark_palette()]
}

/// `light` and `dark` platform schemes bound to the OS color mode, each
/// defaulting to the palette of the same name.
pub fn default_platform_schemes(source: &OsColorMode) -> Vec<PlatformScheme> {
    [ColorMode::Light, ColorMode::Dark]
        .into_iter()
        .map(|mode| PlatformScheme::new(mode.as_str(), source.detector(mode), mode.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteSet;
    use crate::stylesheet::palette_value;

    #[test]
    fn test_default_palettes_define_every_variable() {
        let palettes = PaletteSet::new(default_palettes()).unwrap();
        for palette in &palettes {
            for variable in DEFAULT_VARIABLES {
                assert!(
                    palette_value(palette, variable).unwrap().is_some(),
                    "{} lacks {}",
                    palette.name(),
                    variable
                );
            }
        }
    }

    #[test]
    fn test_default_platform_schemes_match_palettes() {
        let schemes = default_platform_schemes(&OsColorMode::new());
        let names: Vec<_> = schemes.iter().map(|s| s.default_palette()).collect();
        assert_eq!(names, vec!["light", "dark"]);
    }
}
