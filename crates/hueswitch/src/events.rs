//! Change events emitted after a re-render.

use std::sync::Arc;

use crate::listeners::Listeners;
use crate::palette::Palette;
use crate::platform::Subscription;
use crate::resolver::Resolution;

/// Emitted after every successful re-render except the one performed while
/// constructing the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeChange {
    /// The palette now in effect.
    pub palette: Palette,
    /// The platform scheme that selected it, when following the platform.
    pub platform_scheme: Option<String>,
}

impl SchemeChange {
    pub(crate) fn from_resolution(resolution: &Resolution) -> Self {
        Self {
            palette: resolution.palette().clone(),
            platform_scheme: resolution.platform_scheme().map(str::to_string),
        }
    }
}

/// Listeners for [`SchemeChange`].
#[derive(Clone)]
pub(crate) struct ChangeEvents {
    listeners: Listeners<SchemeChange>,
}

impl ChangeEvents {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    pub(crate) fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SchemeChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(handler))
    }

    pub(crate) fn emit(&self, change: &SchemeChange) {
        log::trace!(
            "emitting scheme change to {} listener(s)",
            self.listeners.len()
        );
        self.listeners.emit(change);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}
