//! Operating system light/dark detection.
//!
//! The OS preference is queried with the `dark-light` crate. There is no
//! portable change notification, so [`OsColorMode::poll`] re-detects and
//! notifies subscribers when the mode differs from the last observation;
//! hosts call it from their event loop or a timer.
//!
//! For tests, the detector can be replaced globally:
//!
//! ```rust
//! use hueswitch::platform::{detect_color_mode, set_color_mode_detector, ColorMode};
//!
//! set_color_mode_detector(|| ColorMode::Dark);
//! assert_eq!(detect_color_mode(), ColorMode::Dark);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{ChangeCallback, SchemeDetector, Subscription};
use crate::listeners::Listeners;

/// The user's preferred color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Light mode (light background, dark text).
    Light,
    /// Dark mode (dark background, light text).
    Dark,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Light => "light",
            ColorMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ColorModeDetector = fn() -> ColorMode;

static COLOR_MODE_DETECTOR: Lazy<Mutex<ColorModeDetector>> =
    Lazy::new(|| Mutex::new(os_color_mode_detector));

/// Overrides the function used to determine the OS color mode.
///
/// Useful for tests, or to force a mode regardless of the OS.
pub fn set_color_mode_detector(detector: ColorModeDetector) {
    let mut guard = COLOR_MODE_DETECTOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = detector;
}

/// Detects the user's preferred color mode.
///
/// Uses `dark-light` unless overridden with [`set_color_mode_detector`].
/// An unspecified or undetectable preference is reported as light.
pub fn detect_color_mode() -> ColorMode {
    let detector = *COLOR_MODE_DETECTOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    detector()
}

fn os_color_mode_detector() -> ColorMode {
    match detect_os_theme() {
        Ok(OsThemeMode::Dark) => ColorMode::Dark,
        Ok(_) => ColorMode::Light,
        Err(err) => {
            log::debug!("OS color mode detection failed, assuming light: {:?}", err);
            ColorMode::Light
        }
    }
}

/// Shared source of OS color mode changes.
///
/// Each [`ModeDetector`] created from the same `OsColorMode` shares its
/// change notifications.
#[derive(Clone)]
pub struct OsColorMode {
    last: Arc<Mutex<ColorMode>>,
    listeners: Listeners<()>,
}

impl OsColorMode {
    /// Creates a monitor seeded with the current OS mode.
    pub fn new() -> Self {
        Self {
            last: Arc::new(Mutex::new(detect_color_mode())),
            listeners: Listeners::new(),
        }
    }

    /// A detector matching when the OS is in `mode`.
    pub fn detector(&self, mode: ColorMode) -> ModeDetector {
        ModeDetector {
            mode,
            source: self.clone(),
        }
    }

    /// Re-detects the OS mode, notifying subscribers if it changed.
    ///
    /// Returns true when a change was observed.
    pub fn poll(&self) -> bool {
        let current = detect_color_mode();
        let changed = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = *last != current;
            *last = current;
            changed
        };

        if changed {
            log::debug!("OS color mode changed to {}", current);
            self.listeners.emit(&());
        }
        changed
    }

    /// The mode seen by the last [`poll`](Self::poll) (or at construction).
    pub fn last_observed(&self) -> ColorMode {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for OsColorMode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OsColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsColorMode")
            .field("last", &self.last_observed())
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

/// Detector for one OS color mode.
#[derive(Clone, Debug)]
pub struct ModeDetector {
    mode: ColorMode,
    source: OsColorMode,
}

impl ModeDetector {
    pub fn mode(&self) -> ColorMode {
        self.mode
    }
}

impl SchemeDetector for ModeDetector {
    fn matches(&self) -> bool {
        detect_color_mode() == self.mode
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Subscription {
        self.source
            .listeners
            .subscribe(Arc::new(move |_: &()| on_change()))
    }

    fn change_source(&self) -> Option<usize> {
        Some(Arc::as_ptr(&self.source.last) as usize)
    }
}
