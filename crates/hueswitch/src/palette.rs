//! Named palettes and the user's scheme choice.
//!
//! A [`Palette`] is one selectable visual theme: a name plus an ordered map of
//! attributes (`accent-color`, `background-color`, `color-scheme`, ...).
//! Palettes are immutable configuration; the full set is held in a
//! [`PaletteSet`], which guarantees unique names and keeps declaration order.
//!
//! What the user selects is a [`SchemeChoice`]: either a fixed palette, or
//! "follow the platform", in which case the platform's current light/dark
//! state picks the palette. The reserved word [`SYSTEM`] is the persisted
//! form of the latter and can never name a palette.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SchemeError};

/// Persisted identifier for [`SchemeChoice::FollowPlatform`].
pub const SYSTEM: &str = "system";

/// A named set of color and metadata attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    name: String,
    #[serde(default, flatten)]
    attributes: BTreeMap<String, String>,
}

impl Palette {
    /// Creates an empty palette with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute, returning `self` for chaining.
    ///
    /// ```rust
    /// use hueswitch::Palette;
    ///
    /// let light = Palette::new("light")
    ///     .with("background-color", "#ffffff")
    ///     .with("color-scheme", "light");
    /// assert_eq!(light.get("color-scheme"), Some("light"));
    /// ```
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// The palette's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// All attributes, ordered by name.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// An ordered, non-empty collection of palettes with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSet {
    palettes: Vec<Palette>,
}

impl PaletteSet {
    /// Builds a palette set, validating names.
    ///
    /// # Errors
    ///
    /// - [`SchemeError::InvalidConfiguration`] if `palettes` is empty
    /// - [`SchemeError::DuplicatePalette`] if two palettes share a name
    /// - [`SchemeError::ReservedPaletteName`] if a palette is named [`SYSTEM`]
    pub fn new(palettes: Vec<Palette>) -> Result<Self> {
        if palettes.is_empty() {
            return Err(SchemeError::invalid("<empty palette set>"));
        }
        for (i, palette) in palettes.iter().enumerate() {
            if palette.name == SYSTEM {
                return Err(SchemeError::ReservedPaletteName(palette.name.clone()));
            }
            if palettes[..i].iter().any(|p| p.name == palette.name) {
                return Err(SchemeError::DuplicatePalette(palette.name.clone()));
            }
        }
        Ok(Self { palettes })
    }

    /// Finds a palette by name.
    pub fn get(&self, name: &str) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.name == name)
    }

    /// Returns true if a palette with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates palettes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Palette> {
        self.palettes.iter()
    }

    /// The first declared palette.
    pub fn first(&self) -> &Palette {
        &self.palettes[0]
    }

    /// Number of palettes.
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Always false; a palette set is never empty.
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

impl<'a> IntoIterator for &'a PaletteSet {
    type Item = &'a Palette;
    type IntoIter = std::slice::Iter<'a, Palette>;

    fn into_iter(self) -> Self::IntoIter {
        self.palettes.iter()
    }
}

/// What the user has selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemeChoice {
    /// Always use the named palette.
    Fixed(String),
    /// Use whichever palette the platform's current scheme maps to.
    FollowPlatform,
}

impl SchemeChoice {
    /// Shorthand for [`SchemeChoice::Fixed`].
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    /// The persisted string form: the palette name, or [`SYSTEM`].
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fixed(name) => name,
            Self::FollowPlatform => SYSTEM,
        }
    }

    /// Returns true for [`SchemeChoice::FollowPlatform`].
    pub fn follows_platform(&self) -> bool {
        matches!(self, Self::FollowPlatform)
    }
}

impl fmt::Display for SchemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            SYSTEM => Self::FollowPlatform,
            name => Self::Fixed(name.to_string()),
        })
    }
}

impl From<&str> for SchemeChoice {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(choice) => choice,
            Err(never) => match never {},
        }
    }
}

impl Serialize for SchemeChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SchemeChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SchemeChoice::from(s.as_str()))
    }
}
