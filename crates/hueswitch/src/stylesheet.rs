//! Projection of palettes into CSS custom properties.
//!
//! Every palette is written out under its own prefix, and a second set of
//! "active" variables aliases whichever palette is currently effective:
//!
//! ```css
//! :root, :host {
//!   --color-schemes-light-background-color-rgb: 255, 255, 255;
//!   --color-schemes-dark-background-color-rgb: 30, 30, 30;
//!   --color-scheme-background-color-rgb: var(--color-schemes-dark-background-color-rgb);
//! }
//! ```
//!
//! Switching palettes only rewrites the alias targets; consumers always read
//! `--color-scheme-*`.
//!
//! ## Numeric-components variables
//!
//! Variables ending in [`RGB_SUFFIX`] hold a color as `r, g, b`. A palette
//! may define them directly, or define only the plain color, in which case
//! the components are derived. When the configured variable list contains
//! `accent-color-rgb` but not `accent-color`, the plain variable is derived
//! from the components with `rgb(var(...))` so both forms are available.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::color::Rgb;
use crate::error::Result;
use crate::palette::{Palette, PaletteSet};

/// Prefix of the active (aliasing) variables.
pub const VARIABLE_PREFIX: &str = "--color-scheme-";

/// Prefix of the per-palette variables.
pub const PALETTES_VARIABLE_PREFIX: &str = "--color-schemes-";

/// Suffix marking a numeric-components variable.
pub const RGB_SUFFIX: &str = "-rgb";

/// Selector the projected rule applies to.
pub const RULE_SELECTOR: &str = ":root, :host";

/// Name of the active variable for `variable`.
pub fn active_variable(variable: &str) -> String {
    format!("{}{}", VARIABLE_PREFIX, variable)
}

/// Name of the per-palette variable for `variable`.
pub fn palette_variable(palette: &str, variable: &str) -> String {
    format!("{}{}-{}", PALETTES_VARIABLE_PREFIX, palette, variable)
}

/// An ordered set of custom property declarations under one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    selector: String,
    declarations: Vec<(String, String)>,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
        }
    }

    /// Sets a property, replacing an earlier value in place.
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into();
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => self.declarations.push((property, value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Renders the rule as CSS text.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        let _ = writeln!(css, "{} {{", self.selector);
        for (property, value) in &self.declarations {
            let _ = writeln!(css, "  {}: {};", property, value);
        }
        css.push_str("}\n");
        css
    }
}

/// Builds the rule for `active`, covering every palette in `palettes`.
///
/// A palette lacking a variable simply gets no declaration for it; the
/// active alias is still written so the consumer's own fallback applies.
///
/// # Errors
///
/// [`SchemeError::InvalidColor`](crate::SchemeError::InvalidColor) if
/// components have to be derived from a color that cannot be parsed.
pub fn project(active: &Palette, palettes: &PaletteSet, variables: &[String]) -> Result<StyleRule> {
    let mut rule = StyleRule::new(RULE_SELECTOR);

    for variable in variables {
        if let Some(base) = variable.strip_suffix(RGB_SUFFIX) {
            if !variables.iter().any(|v| v == base) {
                for palette in palettes {
                    rule.set(
                        palette_variable(palette.name(), base),
                        format!("rgb(var({}))", palette_variable(palette.name(), variable)),
                    );
                }
                rule.set(
                    active_variable(base),
                    format!("var({})", palette_variable(active.name(), base)),
                );
            }
        }

        for palette in palettes {
            match palette_value(palette, variable)? {
                Some(value) => rule.set(palette_variable(palette.name(), variable), value),
                None => log::trace!(
                    "palette {} defines no value for {}",
                    palette.name(),
                    variable
                ),
            }
        }

        rule.set(
            active_variable(variable),
            format!("var({})", palette_variable(active.name(), variable)),
        );
    }

    Ok(rule)
}

/// The value a palette contributes for `variable`, deriving between the
/// plain and numeric-components forms when only one is defined.
pub fn palette_value(palette: &Palette, variable: &str) -> Result<Option<String>> {
    if let Some(value) = palette.get(variable) {
        return Ok(Some(value.to_string()));
    }

    if let Some(base) = variable.strip_suffix(RGB_SUFFIX) {
        if let Some(color) = palette.get(base) {
            return Ok(Some(Rgb::parse(color)?.components()));
        }
        return Ok(None);
    }

    match palette.get(&format!("{}{}", variable, RGB_SUFFIX)) {
        Some(components) => Ok(Some(format!("rgb({})", components))),
        None => Ok(None),
    }
}

/// Consumer of projected style rules.
pub trait StyleTarget: Send + Sync {
    /// Replaces the previously applied rule with `rule`.
    fn apply(&self, rule: &StyleRule) -> Result<()>;

    /// Computed value of a custom property, with `var()` references
    /// substituted. `None` if the property (or a reference without a
    /// fallback) is undefined.
    fn computed(&self, property: &str) -> Option<String>;

    /// Records the color a host may use for window chrome (e.g. a
    /// `theme-color` meta element).
    fn set_theme_color(&self, _color: &str) {}
}

#[derive(Debug, Default)]
struct TargetState {
    rule: Option<StyleRule>,
    theme_color: Option<String>,
    applied: usize,
}

/// In-memory style target. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStyleTarget {
    state: Arc<Mutex<TargetState>>,
}

impl MemoryStyleTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently applied rule.
    pub fn rule(&self) -> Option<StyleRule> {
        self.lock().rule.clone()
    }

    /// The last recorded theme color.
    pub fn theme_color(&self) -> Option<String> {
        self.lock().theme_color.clone()
    }

    /// How many rules have been applied.
    pub fn applied_count(&self) -> usize {
        self.lock().applied
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StyleTarget for MemoryStyleTarget {
    fn apply(&self, rule: &StyleRule) -> Result<()> {
        let mut state = self.lock();
        state.rule = Some(rule.clone());
        state.applied += 1;
        Ok(())
    }

    fn computed(&self, property: &str) -> Option<String> {
        let state = self.lock();
        let rule = state.rule.as_ref()?;
        let raw = rule.get(property)?;
        substitute(rule, raw, 0)
    }

    fn set_theme_color(&self, color: &str) {
        self.lock().theme_color = Some(color.to_string());
    }
}

/// Style target that also writes every applied rule to a CSS file.
#[derive(Debug, Clone)]
pub struct CssFileTarget {
    path: PathBuf,
    memory: MemoryStyleTarget,
}

impl CssFileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            memory: MemoryStyleTarget::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StyleTarget for CssFileTarget {
    fn apply(&self, rule: &StyleRule) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, rule.to_css())?;
        self.memory.apply(rule)
    }

    fn computed(&self, property: &str) -> Option<String> {
        self.memory.computed(property)
    }

    fn set_theme_color(&self, color: &str) {
        self.memory.set_theme_color(color)
    }
}

const MAX_VAR_DEPTH: usize = 16;

/// Replaces `var(--name[, fallback])` references in `value`.
fn substitute(rule: &StyleRule, value: &str, depth: usize) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }

    let mut out = String::new();
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 4..];
        let end = closing_paren(after)?;
        let inner = after[..end].trim();

        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner, None),
        };
        let resolved = match rule.get(name) {
            Some(referenced) => substitute(rule, referenced, depth + 1),
            None => None,
        }
        .or_else(|| fallback.and_then(|f| substitute(rule, f, depth + 1)))?;

        out.push_str(&resolved);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(out.trim().to_string())
}

fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}
