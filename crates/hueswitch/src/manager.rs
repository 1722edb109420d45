//! The color scheme manager.
//!
//! [`ColorScheme`] ties the pieces together. Each render:
//!
//! 1. loads [`Settings`] from storage (defaults without storage)
//! 2. [`resolve`]s them against the configured palettes and platform schemes
//! 3. subscribes to (or releases) the platform detectors, depending on
//!    whether the platform is followed
//! 4. [`project`]s every palette into a [`StyleRule`] and applies it to the
//!    style target, recording the accent color as the theme color
//! 5. emits a [`SchemeChange`] to listeners
//!
//! Construction renders once without emitting. Afterwards a render happens
//! whenever settings are stored through the manager, a tracked detector
//! changes, or [`ColorScheme::refresh`] is called.
//!
//! A failed render leaves the previously applied rule in place.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hueswitch::config::SchemeConfig;
//! use hueswitch::platform::{ManualDetector, PlatformScheme};
//! use hueswitch::storage::MemoryStorage;
//! use hueswitch::{ColorScheme, SchemeChoice, Settings};
//!
//! let dark = ManualDetector::new(false);
//! let config = SchemeConfig::new().platform_schemes(vec![
//!     PlatformScheme::new("light", ManualDetector::new(true), "light"),
//!     PlatformScheme::new("dark", dark.clone(), "dark"),
//! ]);
//!
//! let scheme = ColorScheme::builder(config)
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .build()
//!     .unwrap();
//! assert_eq!(scheme.current().palette().name(), "light");
//!
//! scheme
//!     .store_settings(&Settings::new().with_choice(SchemeChoice::fixed("dark")))
//!     .unwrap();
//! assert_eq!(scheme.color_scheme().as_deref(), Some("dark"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::config::SchemeConfig;
use crate::error::{Result, SchemeError};
use crate::events::{ChangeEvents, SchemeChange};
use crate::localization::Localization;
use crate::palette::{PaletteSet, SchemeChoice};
use crate::picker::SchemePicker;
use crate::platform::{ChangeCallback, OsColorMode, PlatformScheme, Subscription};
use crate::resolver::{resolve, Resolution};
use crate::settings::Settings;
use crate::storage::SettingsStorage;
use crate::stylesheet::{
    active_variable, palette_value, project, MemoryStyleTarget, StyleRule, StyleTarget,
};
use crate::tracking::PlatformTracking;

const ACCENT_COLOR: &str = "accent-color";

/// Builder for [`ColorScheme`].
pub struct ColorSchemeBuilder {
    config: SchemeConfig,
    storage: Option<Arc<dyn SettingsStorage>>,
    target: Option<Arc<dyn StyleTarget>>,
    localization: Option<Arc<dyn Localization>>,
}

impl ColorSchemeBuilder {
    pub fn new(config: SchemeConfig) -> Self {
        Self {
            config,
            storage: None,
            target: None,
            localization: None,
        }
    }

    /// Settings storage. Without it the default choice is always used and
    /// settings cannot be stored.
    pub fn storage(mut self, storage: Arc<dyn SettingsStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Style target. Defaults to a [`MemoryStyleTarget`].
    pub fn target(mut self, target: Arc<dyn StyleTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Labels for the picker. Required by [`ColorScheme::picker`].
    pub fn localization(mut self, localization: Arc<dyn Localization>) -> Self {
        self.localization = Some(localization);
        self
    }

    /// Validates the configuration and performs the initial render.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, and any error of the initial render.
    pub fn build(self) -> Result<ColorScheme> {
        let palettes = self.config.validate()?;
        let default_choice = self.config.effective_default_choice();
        let system_tracking = self.config.is_system_tracking();

        let settings = match &self.storage {
            Some(storage) => Settings::load(storage.as_ref(), system_tracking)?,
            None => Settings::default(),
        };
        let initial = resolve(
            &settings,
            &palettes,
            self.config.platform_scheme_list(),
            &default_choice,
            system_tracking,
        )?;

        let mut state = State {
            platform_schemes: self.config.platform_scheme_list().to_vec(),
            variables: self.config.variable_list().to_vec(),
            show_accent_color: self.config.is_showing_accent_color(),
            os_color_mode: self.config.os_color_mode().clone(),
            palettes,
            default_choice,
            system_tracking,
            storage: self.storage,
            target: self
                .target
                .unwrap_or_else(|| Arc::new(MemoryStyleTarget::new())),
            localization: self.localization,
            tracking: PlatformTracking::NotTracking,
            current: initial.clone(),
            theme_color: None,
        };
        state.apply(initial)?;

        let shared = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            state: Mutex::new(state),
            events: ChangeEvents::new(),
        });
        shared.sync_tracking();

        Ok(ColorScheme { shared })
    }
}

/// Manages the active color scheme of one style target.
///
/// Clones are handles to the same manager.
#[derive(Clone)]
pub struct ColorScheme {
    shared: Arc<Shared>,
}

impl ColorScheme {
    pub fn builder(config: SchemeConfig) -> ColorSchemeBuilder {
        ColorSchemeBuilder::new(config)
    }

    /// Builds a manager with the given collaborators.
    pub fn new(
        config: SchemeConfig,
        storage: Option<Arc<dyn SettingsStorage>>,
        target: Arc<dyn StyleTarget>,
        localization: Option<Arc<dyn Localization>>,
    ) -> Result<Self> {
        let mut builder = ColorSchemeBuilder::new(config).target(target);
        if let Some(storage) = storage {
            builder = builder.storage(storage);
        }
        if let Some(localization) = localization {
            builder = builder.localization(localization);
        }
        builder.build()
    }

    /// The resolution of the last successful render.
    pub fn current(&self) -> Resolution {
        self.shared.lock().current.clone()
    }

    /// Resolves the stored settings without rendering.
    pub fn resolve(&self) -> Result<Resolution> {
        let state = self.shared.lock();
        let settings = state.load_settings()?;
        state.resolve(&settings)
    }

    /// Re-renders from the stored settings.
    pub fn refresh(&self) -> Result<Resolution> {
        self.shared.render()
    }

    /// Reads the stored settings.
    pub fn load_settings(&self) -> Result<Settings> {
        self.shared.lock().load_settings()
    }

    /// Stores settings and re-renders.
    ///
    /// Overrides are written only with system tracking enabled; otherwise
    /// any stored overrides are removed.
    ///
    /// # Errors
    ///
    /// [`SchemeError::MissingCollaborator`] without storage, otherwise storage
    /// and render errors.
    pub fn store_settings(&self, settings: &Settings) -> Result<Resolution> {
        {
            let state = self.shared.lock();
            let storage = state
                .storage
                .as_ref()
                .ok_or(SchemeError::MissingCollaborator("settings storage"))?;
            settings.store(storage.as_ref(), state.system_tracking)?;
        }
        self.shared.render()
    }

    /// Registers a change listener. It stays registered while the returned
    /// subscription is alive.
    pub fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SchemeChange) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    /// Builds the picker model for the current settings.
    ///
    /// # Errors
    ///
    /// [`SchemeError::MissingCollaborator`] without localization or storage.
    pub fn picker(&self) -> Result<SchemePicker> {
        let state = self.shared.lock();
        let localization = state
            .localization
            .clone()
            .ok_or(SchemeError::MissingCollaborator("localization"))?;
        if state.storage.is_none() {
            return Err(SchemeError::MissingCollaborator("settings storage"));
        }

        let settings = state.load_settings()?;
        let resolution = state.resolve(&settings)?;
        Ok(SchemePicker::new(
            self.clone(),
            &state.palettes,
            &state.platform_schemes,
            &resolution,
            state.system_tracking,
            state.show_accent_color,
            localization.as_ref(),
        ))
    }

    /// Computed value of `--color-scheme-{name}` on the style target.
    pub fn variable(&self, name: &str) -> Option<String> {
        let target = Arc::clone(&self.shared.lock().target);
        target.computed(&active_variable(name))
    }

    pub fn accent_color(&self) -> Option<String> {
        self.variable("accent-color")
    }

    pub fn accent_color_rgb(&self) -> Option<String> {
        self.variable("accent-color-rgb")
    }

    pub fn accent_foreground_color(&self) -> Option<String> {
        self.variable("accent-foreground-color")
    }

    pub fn accent_foreground_color_rgb(&self) -> Option<String> {
        self.variable("accent-foreground-color-rgb")
    }

    pub fn background_color(&self) -> Option<String> {
        self.variable("background-color")
    }

    pub fn background_color_rgb(&self) -> Option<String> {
        self.variable("background-color-rgb")
    }

    pub fn foreground_color(&self) -> Option<String> {
        self.variable("foreground-color")
    }

    pub fn foreground_color_rgb(&self) -> Option<String> {
        self.variable("foreground-color-rgb")
    }

    /// The active palette's `color-scheme` value (e.g. `light`, `dark`).
    pub fn color_scheme(&self) -> Option<String> {
        self.variable("color-scheme")
    }

    /// The color last recorded on the style target as theme color.
    pub fn theme_color(&self) -> Option<String> {
        self.shared.lock().theme_color.clone()
    }

    /// The rule built by the last successful render.
    pub fn style_rule(&self) -> Result<StyleRule> {
        let state = self.shared.lock();
        project(state.current.palette(), &state.palettes, &state.variables)
    }

    pub fn palettes(&self) -> PaletteSet {
        self.shared.lock().palettes.clone()
    }

    /// The OS color mode source; hosts poll it to pick up OS changes.
    pub fn os_color_mode(&self) -> OsColorMode {
        self.shared.lock().os_color_mode.clone()
    }

    /// Returns true while subscribed to the platform detectors.
    pub fn is_tracking_platform(&self) -> bool {
        self.shared.lock().tracking.is_tracking()
    }

    /// Number of live detector subscriptions.
    pub fn detector_subscription_count(&self) -> usize {
        self.shared.lock().tracking.subscription_count()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.events.len()
    }
}

impl fmt::Debug for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ColorScheme")
            .field("palette", &state.current.palette().name())
            .field("choice", state.current.choice())
            .field("platform_scheme", &state.current.platform_scheme())
            .field("tracking", &state.tracking.is_tracking())
            .finish()
    }
}

struct Shared {
    this: Weak<Shared>,
    state: Mutex<State>,
    events: ChangeEvents,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self) -> Result<Resolution> {
        let on_platform_change = self.platform_change_callback();
        let resolution = self.lock().render(&on_platform_change)?;

        self.events.emit(&SchemeChange::from_resolution(&resolution));
        Ok(resolution)
    }

    /// Subscribes to the detectors if the current resolution follows the
    /// platform.
    fn sync_tracking(&self) {
        let on_platform_change = self.platform_change_callback();
        let mut state = self.lock();
        let State {
            tracking,
            current,
            platform_schemes,
            ..
        } = &mut *state;
        tracking.set(
            current.follows_platform(),
            platform_schemes,
            &on_platform_change,
        );
    }

    fn platform_change_callback(&self) -> ChangeCallback {
        let this = self.this.clone();
        Arc::new(move || {
            if let Some(shared) = this.upgrade() {
                if let Err(err) = shared.render() {
                    log::warn!("re-render after platform change failed: {}", err);
                }
            }
        })
    }
}

struct State {
    palettes: PaletteSet,
    platform_schemes: Vec<PlatformScheme>,
    default_choice: SchemeChoice,
    variables: Vec<String>,
    system_tracking: bool,
    show_accent_color: bool,
    os_color_mode: OsColorMode,
    storage: Option<Arc<dyn SettingsStorage>>,
    target: Arc<dyn StyleTarget>,
    localization: Option<Arc<dyn Localization>>,
    tracking: PlatformTracking,
    current: Resolution,
    theme_color: Option<String>,
}

impl State {
    fn load_settings(&self) -> Result<Settings> {
        match &self.storage {
            Some(storage) => Settings::load(storage.as_ref(), self.system_tracking),
            None => Ok(Settings::default()),
        }
    }

    fn resolve(&self, settings: &Settings) -> Result<Resolution> {
        resolve(
            settings,
            &self.palettes,
            &self.platform_schemes,
            &self.default_choice,
            self.system_tracking,
        )
    }

    fn render(&mut self, on_platform_change: &ChangeCallback) -> Result<Resolution> {
        let settings = self.load_settings()?;
        let resolution = match self.resolve(&settings) {
            Ok(resolution) => resolution,
            Err(SchemeError::UnresolvableSystemScheme) => {
                // Following the platform; a detector change may resolve it.
                self.tracking
                    .set(true, &self.platform_schemes, on_platform_change);
                return Err(SchemeError::UnresolvableSystemScheme);
            }
            Err(err) => return Err(err),
        };

        self.tracking.set(
            resolution.follows_platform(),
            &self.platform_schemes,
            on_platform_change,
        );
        self.apply(resolution)
    }

    /// Projects `resolution` onto the style target and records it as current.
    fn apply(&mut self, resolution: Resolution) -> Result<Resolution> {
        let rule = project(resolution.palette(), &self.palettes, &self.variables)?;
        self.target.apply(&rule)?;

        let theme_color = self
            .target
            .computed(&active_variable(ACCENT_COLOR))
            .or_else(|| palette_value(resolution.palette(), ACCENT_COLOR).ok().flatten());
        if let Some(color) = &theme_color {
            self.target.set_theme_color(color);
        }
        self.theme_color = theme_color;

        log::debug!(
            "rendered color scheme {} ({} declarations)",
            resolution.palette().name(),
            rule.len()
        );
        self.current = resolution.clone();
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::platform::ManualDetector;
    use crate::settings::{SETTINGS_KEY_COLOR_SCHEME, SETTINGS_KEY_COLOR_SCHEME_SYSTEM};
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        light: ManualDetector,
        dark: ManualDetector,
        storage: MemoryStorage,
        target: MemoryStyleTarget,
    }

    impl Fixture {
        fn new(dark: bool) -> Self {
            Self {
                light: ManualDetector::new(!dark),
                dark: ManualDetector::new(dark),
                storage: MemoryStorage::new(),
                target: MemoryStyleTarget::new(),
            }
        }

        fn config(&self) -> SchemeConfig {
            SchemeConfig::new()
                .platform_schemes(vec![
                    PlatformScheme::new("light", self.light.clone(), "light"),
                    PlatformScheme::new("dark", self.dark.clone(), "dark"),
                ])
                .default_choice("light")
        }

        fn build(&self, config: SchemeConfig) -> ColorScheme {
            ColorScheme::builder(config)
                .storage(Arc::new(self.storage.clone()))
                .target(Arc::new(self.target.clone()))
                .build()
                .unwrap()
        }
    }

    fn follow() -> Settings {
        Settings::new().with_choice(SchemeChoice::FollowPlatform)
    }

    #[test]
    fn test_initial_render_applies_without_event() {
        let fx = Fixture::new(false);
        let scheme = fx.build(fx.config());

        assert_eq!(fx.target.applied_count(), 1);
        assert_eq!(scheme.current().palette().name(), "light");
        assert_eq!(scheme.color_scheme().as_deref(), Some("light"));
        assert!(!scheme.is_tracking_platform());
    }

    #[test]
    fn test_store_settings_follows_platform() {
        let fx = Fixture::new(true);
        let scheme = fx.build(fx.config());

        let resolution = scheme.store_settings(&follow()).unwrap();
        assert_eq!(resolution.palette().name(), "dark");
        assert_eq!(resolution.platform_scheme(), Some("dark"));
        assert_eq!(fx.storage.snapshot()[SETTINGS_KEY_COLOR_SCHEME], json!("system"));
        assert_eq!(scheme.detector_subscription_count(), 2);
    }

    #[test]
    fn test_detector_change_rerenders_and_emits() {
        let fx = Fixture::new(false);
        let scheme = fx.build(fx.config());
        scheme.store_settings(&follow()).unwrap();

        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        let _sub = scheme.on_change(move |change| {
            assert_eq!(change.platform_scheme.as_deref(), Some("dark"));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        fx.light.set(false);
        fx.dark.set(true);

        assert_eq!(scheme.color_scheme().as_deref(), Some("dark"));
        assert!(events.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_fixed_choice_releases_detectors() {
        let fx = Fixture::new(true);
        let scheme = fx.build(fx.config());
        scheme.store_settings(&follow()).unwrap();
        assert_eq!(fx.dark.subscriber_count(), 1);

        scheme
            .store_settings(&Settings::new().with_choice("light"))
            .unwrap();
        assert_eq!(fx.dark.subscriber_count(), 0);
        assert_eq!(fx.light.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_manager_releases_detectors() {
        let fx = Fixture::new(true);
        let scheme = fx.build(fx.config().default_choice(SchemeChoice::FollowPlatform));
        assert_eq!(fx.dark.subscriber_count(), 1);

        drop(scheme);
        assert_eq!(fx.dark.subscriber_count(), 0);
    }

    #[test]
    fn test_store_without_storage_is_missing_collaborator() {
        let fx = Fixture::new(false);
        let scheme = ColorScheme::builder(fx.config()).build().unwrap();
        let err = scheme.store_settings(&follow()).unwrap_err();
        assert!(matches!(err, SchemeError::MissingCollaborator("settings storage")));
    }

    #[test]
    fn test_picker_without_localization_is_missing_collaborator() {
        let fx = Fixture::new(false);
        let scheme = fx.build(fx.config());
        let err = scheme.picker().unwrap_err();
        assert!(matches!(err, SchemeError::MissingCollaborator("localization")));
    }

    #[test]
    fn test_picker_without_storage_is_missing_collaborator() {
        let fx = Fixture::new(false);
        let scheme = ColorScheme::builder(fx.config())
            .localization(Arc::new(crate::localization::StaticLocalization::english()))
            .build()
            .unwrap();
        let err = scheme.picker().unwrap_err();
        assert!(matches!(err, SchemeError::MissingCollaborator("settings storage")));
    }

    #[test]
    fn test_stored_system_without_platform_schemes_uses_default() {
        let fx = Fixture::new(false);
        fx.storage
            .store(SETTINGS_KEY_COLOR_SCHEME, json!("system"))
            .unwrap();
        let config = SchemeConfig::new().platform_schemes(Vec::new());
        let scheme = fx.build(config);

        assert_eq!(scheme.current().palette().name(), "light");
        assert!(!scheme.current().follows_platform());
        assert!(!scheme.is_tracking_platform());
        assert_eq!(scheme.color_scheme().as_deref(), Some("light"));
    }

    #[test]
    fn test_unparsable_color_is_error_and_keeps_previous_rule() {
        let fx = Fixture::new(false);
        let _first = fx.build(fx.config());
        let before = fx.target.rule();
        assert!(before.is_some());

        let config = fx
            .config()
            .palettes(vec![
                Palette::new("light").with("accent-color", "#aéaaa"),
                Palette::new("dark").with("accent-color", "#000"),
            ])
            .variables(["accent-color-rgb"]);
        let err = ColorScheme::builder(config)
            .storage(Arc::new(fx.storage.clone()))
            .target(Arc::new(fx.target.clone()))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemeError::InvalidColor { .. }));
        assert_eq!(fx.target.rule(), before);
        assert_eq!(fx.target.applied_count(), 1);
    }

    #[test]
    fn test_build_reads_settings_once_and_renders_once() {
        let fx = Fixture::new(true);
        let scheme = fx.build(fx.config().default_choice(SchemeChoice::FollowPlatform));

        assert_eq!(fx.target.applied_count(), 1);
        assert_eq!(scheme.current().platform_scheme(), Some("dark"));
        assert_eq!(scheme.detector_subscription_count(), 2);
    }

    #[test]
    #[serial_test::serial]
    fn test_os_mode_change_renders_once() {
        use crate::platform::{set_color_mode_detector, ColorMode};

        set_color_mode_detector(|| ColorMode::Light);
        let target = MemoryStyleTarget::new();
        let scheme = ColorScheme::builder(
            SchemeConfig::new().default_choice(SchemeChoice::FollowPlatform),
        )
        .target(Arc::new(target.clone()))
        .build()
        .unwrap();
        assert_eq!(scheme.detector_subscription_count(), 1);

        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        let _sub = scheme.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        set_color_mode_detector(|| ColorMode::Dark);
        assert!(scheme.os_color_mode().poll());

        assert_eq!(events.load(Ordering::SeqCst), 1);
        assert_eq!(target.applied_count(), 2);
        assert_eq!(scheme.color_scheme().as_deref(), Some("dark"));

        set_color_mode_detector(|| ColorMode::Light);
    }

    #[test]
    fn test_failed_render_keeps_previous_rule() {
        let fx = Fixture::new(false);
        let scheme = fx.build(fx.config());
        let before = fx.target.rule();

        fx.light.set(false);
        let err = scheme.store_settings(&follow()).unwrap_err();

        assert!(matches!(err, SchemeError::UnresolvableSystemScheme));
        assert_eq!(fx.target.rule(), before);
        assert_eq!(scheme.current().palette().name(), "light");
        assert!(scheme.is_tracking_platform());

        // A detector starting to match resolves it.
        fx.dark.set(true);
        assert_eq!(scheme.current().palette().name(), "dark");
    }

    #[test]
    fn test_theme_color_follows_accent() {
        let fx = Fixture::new(false);
        let scheme = fx.build(fx.config());
        assert_eq!(scheme.theme_color().as_deref(), Some("rgb(0, 90, 180)"));
        assert_eq!(fx.target.theme_color().as_deref(), Some("rgb(0, 90, 180)"));
    }

    #[test]
    fn test_overrides_removed_when_tracking_disabled() {
        let fx = Fixture::new(true);
        fx.storage
            .store(SETTINGS_KEY_COLOR_SCHEME_SYSTEM, json!({"dark": "light"}))
            .unwrap();
        let scheme = fx.build(fx.config());

        scheme
            .store_settings(&follow().with_override("dark", "light"))
            .unwrap();
        assert!(!fx.storage.snapshot().contains_key(SETTINGS_KEY_COLOR_SCHEME_SYSTEM));
        assert_eq!(scheme.current().palette().name(), "dark");
    }

    #[test]
    fn test_custom_palettes_and_variables() {
        let fx = Fixture::new(false);
        let config = fx
            .config()
            .palettes(vec![
                Palette::new("light").with("background-color", "#fafafa"),
                Palette::new("dark").with("background-color", "#101010"),
            ])
            .variables(["background-color-rgb"]);
        let scheme = fx.build(config);

        assert_eq!(scheme.background_color_rgb().as_deref(), Some("250, 250, 250"));
        assert_eq!(
            scheme.background_color().as_deref(),
            Some("rgb(250, 250, 250)")
        );
        assert_eq!(scheme.accent_color(), None);
        assert_eq!(scheme.theme_color(), None);
    }
}
