//! Color scheme selection for documents and style consumers.
//!
//! `hueswitch` keeps a user's color scheme choice, follows the platform's
//! light/dark preference when asked to, and writes the effective palette
//! into CSS custom properties.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hueswitch::config::SchemeConfig;
//! use hueswitch::platform::{ManualDetector, PlatformScheme};
//! use hueswitch::storage::MemoryStorage;
//! use hueswitch::stylesheet::MemoryStyleTarget;
//! use hueswitch::{ColorScheme, SchemeChoice, Settings};
//!
//! let os_dark = ManualDetector::new(true);
//! let config = SchemeConfig::new().platform_schemes(vec![
//!     PlatformScheme::new("light", ManualDetector::new(false), "light"),
//!     PlatformScheme::new("dark", os_dark.clone(), "dark"),
//! ]);
//!
//! let target = MemoryStyleTarget::new();
//! let scheme = ColorScheme::builder(config)
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .target(Arc::new(target.clone()))
//!     .build()
//!     .unwrap();
//!
//! // Nothing stored yet: the default follows the platform.
//! assert_eq!(scheme.color_scheme().as_deref(), Some("dark"));
//!
//! scheme
//!     .store_settings(&Settings::new().with_choice(SchemeChoice::fixed("light")))
//!     .unwrap();
//! assert_eq!(scheme.background_color_rgb().as_deref(), Some("255, 255, 255"));
//! println!("{}", target.rule().unwrap().to_css());
//! ```
//!
//! # Architecture
//!
//! ```text
//! Settings ──┐
//! Palettes ──┼─▶ resolver::resolve ─▶ Resolution ─▶ stylesheet::project ─▶ StyleTarget
//! Platform ──┘                                  └─▶ SchemeChange listeners
//! schemes
//! ```
//!
//! - [`resolver`]: the pure settings-resolution algorithm
//! - [`manager`]: [`ColorScheme`], which loads settings, renders, tracks
//!   platform detectors and emits change events
//! - [`stylesheet`]: projection into custom properties and style targets
//! - [`platform`]: platform schemes, detectors and OS light/dark detection
//! - [`storage`] / [`settings`]: persisted choice
//! - [`config`]: builder, YAML and CSS configuration
//! - [`picker`]: selection UI model
//!
//! # Logging
//!
//! The crate logs through the `log` facade and installs no logger.

pub mod color;
pub mod config;
pub mod defaults;
mod error;
pub mod events;
mod listeners;
pub mod localization;
pub mod manager;
pub mod palette;
pub mod picker;
pub mod platform;
pub mod resolver;
pub mod settings;
pub mod storage;
pub mod stylesheet;
pub mod tracking;

pub use config::SchemeConfig;
pub use error::{Result, SchemeError};
pub use events::SchemeChange;
pub use manager::{ColorScheme, ColorSchemeBuilder};
pub use palette::{Palette, PaletteSet, SchemeChoice, SYSTEM};
pub use picker::SchemePicker;
pub use resolver::{resolve, Resolution};
pub use settings::Settings;
