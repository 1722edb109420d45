//! Platform-tracked schemes and their detectors.
//!
//! A [`PlatformScheme`] is a platform-level state such as "light" or "dark".
//! Whether it is currently in effect is answered by an injected
//! [`SchemeDetector`], which also notifies subscribers when the platform
//! state changes. This keeps resolution independent of any particular
//! detection mechanism:
//!
//! - [`ManualDetector`]: state pushed by the host application (or a test)
//! - [`ModeDetector`]: the operating system's light/dark preference, via
//!   [`OsColorMode`]
//!
//! Subscriptions are RAII handles: dropping a [`Subscription`] removes the
//! listener, so nothing can outlive the owner that asked for it.

mod os;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use os::{detect_color_mode, set_color_mode_detector, ColorMode, ModeDetector, OsColorMode};

use crate::error::{Result, SchemeError};
use crate::listeners::Listeners;

/// Callback invoked when a detector's state changes.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// A live, observable boolean reflecting platform state.
pub trait SchemeDetector: Send + Sync {
    /// Returns whether the platform scheme is currently in effect.
    fn matches(&self) -> bool;

    /// Registers a change callback. The callback stays registered for as
    /// long as the returned [`Subscription`] is alive.
    fn subscribe(&self, on_change: ChangeCallback) -> Subscription;

    /// Identity of the notification source shared by several detectors.
    ///
    /// Detectors reporting the same source notify together, so subscribing
    /// to one of them is enough. `None` means the detector notifies on its
    /// own.
    fn change_source(&self) -> Option<usize> {
        None
    }
}

/// Handle to a registered listener. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `unsubscribe` when dropped.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release, for detectors that never change.
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    /// Unsubscribes now. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// A detector whose state is set explicitly.
///
/// Clones share state, so one handle can be given to a [`PlatformScheme`]
/// while another drives it.
///
/// ```rust
/// use hueswitch::platform::{ManualDetector, SchemeDetector};
///
/// let dark = ManualDetector::new(false);
/// let handle = dark.clone();
/// handle.set(true);
/// assert!(dark.matches());
/// ```
#[derive(Clone)]
pub struct ManualDetector {
    state: Arc<AtomicBool>,
    listeners: Listeners<()>,
}

impl ManualDetector {
    /// Creates a detector with the given initial state.
    pub fn new(matches: bool) -> Self {
        Self {
            state: Arc::new(AtomicBool::new(matches)),
            listeners: Listeners::new(),
        }
    }

    /// Sets the state, notifying subscribers if it changed.
    pub fn set(&self, matches: bool) {
        if self.state.swap(matches, Ordering::SeqCst) != matches {
            self.listeners.emit(&());
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SchemeDetector for ManualDetector {
    fn matches(&self) -> bool {
        self.state.load(Ordering::SeqCst)
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Subscription {
        self.listeners.subscribe(Arc::new(move |_: &()| on_change()))
    }
}

impl fmt::Debug for ManualDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualDetector")
            .field("matches", &self.matches())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A platform-level scheme with a live detector and its own default palette.
#[derive(Clone)]
pub struct PlatformScheme {
    name: String,
    detector: Arc<dyn SchemeDetector>,
    default_palette: String,
}

impl PlatformScheme {
    /// Creates a platform scheme.
    pub fn new(
        name: impl Into<String>,
        detector: impl SchemeDetector + 'static,
        default_palette: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            detector: Arc::new(detector),
            default_palette: default_palette.into(),
        }
    }

    /// Creates a platform scheme from a shared detector.
    pub fn with_shared_detector(
        name: impl Into<String>,
        detector: Arc<dyn SchemeDetector>,
        default_palette: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            detector,
            default_palette: default_palette.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detector(&self) -> &dyn SchemeDetector {
        self.detector.as_ref()
    }

    pub fn default_palette(&self) -> &str {
        &self.default_palette
    }

    /// Shorthand for `self.detector().matches()`.
    pub fn is_active(&self) -> bool {
        self.detector.matches()
    }
}

impl fmt::Debug for PlatformScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformScheme")
            .field("name", &self.name)
            .field("default_palette", &self.default_palette)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Checks that platform scheme names are unique.
pub fn validate_platform_schemes(schemes: &[PlatformScheme]) -> Result<()> {
    for (i, scheme) in schemes.iter().enumerate() {
        if schemes[..i].iter().any(|s| s.name == scheme.name) {
            return Err(SchemeError::DuplicatePlatformScheme(scheme.name.clone()));
        }
    }
    Ok(())
}

/// The first platform scheme whose detector currently matches.
///
/// Declaration order decides ties: when more than one detector matches, the
/// earliest wins.
pub fn active_platform_scheme(schemes: &[PlatformScheme]) -> Option<&PlatformScheme> {
    schemes.iter().find(|scheme| scheme.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_detector_notifies_on_change() {
        let detector = ManualDetector::new(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = detector.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        detector.set(true);
        assert!(detector.matches());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_detector_ignores_same_state() {
        let detector = ManualDetector::new(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = detector.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        detector.set(true);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let detector = ManualDetector::new(false);
        let sub = detector.subscribe(Arc::new(|| {}));
        assert_eq!(detector.subscriber_count(), 1);
        sub.cancel();
        assert_eq!(detector.subscriber_count(), 0);
    }

    #[test]
    fn test_active_platform_scheme_first_match_wins() {
        let schemes = vec![
            PlatformScheme::new("light", ManualDetector::new(false), "light"),
            PlatformScheme::new("dark", ManualDetector::new(true), "dark"),
            PlatformScheme::new("dim", ManualDetector::new(true), "dark"),
        ];
        let active = active_platform_scheme(&schemes).unwrap();
        assert_eq!(active.name(), "dark");
    }

    #[test]
    fn test_active_platform_scheme_none_matching() {
        let schemes = vec![PlatformScheme::new(
            "light",
            ManualDetector::new(false),
            "light",
        )];
        assert!(active_platform_scheme(&schemes).is_none());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let schemes = vec![
            PlatformScheme::new("dark", ManualDetector::new(false), "dark"),
            PlatformScheme::new("dark", ManualDetector::new(true), "dark"),
        ];
        let err = validate_platform_schemes(&schemes).unwrap_err();
        assert!(matches!(err, SchemeError::DuplicatePlatformScheme(name) if name == "dark"));
    }
}
