//! Subscription state while following the platform.
//!
//! ```text
//!   NotTracking ──set(true)──▶ Tracking([one subscription per change source])
//!        ▲                              │
//!        └───────────set(false)─────────┘
//! ```
//!
//! Detectors sharing a change source (e.g. the light and dark detectors of
//! one OS monitor) get a single subscription, so one platform change causes
//! one re-render. Leaving `Tracking` drops the subscriptions, which
//! unsubscribes them.
//! Setting the current state again is a no-op, so repeated renders never
//! stack listeners.

use std::collections::HashSet;

use crate::platform::{ChangeCallback, PlatformScheme, Subscription};

#[derive(Debug, Default)]
pub enum PlatformTracking {
    #[default]
    NotTracking,
    Tracking(Vec<Subscription>),
}

impl PlatformTracking {
    pub fn is_tracking(&self) -> bool {
        matches!(self, PlatformTracking::Tracking(_))
    }

    /// Moves to the requested state. `on_change` is subscribed once per
    /// change source when entering `Tracking`.
    ///
    /// Returns true when the state changed.
    pub fn set(
        &mut self,
        enabled: bool,
        schemes: &[PlatformScheme],
        on_change: &ChangeCallback,
    ) -> bool {
        match (enabled, self.is_tracking()) {
            (true, false) => {
                let mut sources = HashSet::new();
                let subscriptions = schemes
                    .iter()
                    .map(|scheme| scheme.detector())
                    .filter(|detector| match detector.change_source() {
                        Some(source) => sources.insert(source),
                        None => true,
                    })
                    .map(|detector| detector.subscribe(on_change.clone()))
                    .collect::<Vec<_>>();
                log::trace!(
                    "tracking {} platform scheme detector(s)",
                    subscriptions.len()
                );
                *self = PlatformTracking::Tracking(subscriptions);
                true
            }
            (false, true) => {
                log::trace!("stopped tracking platform scheme detectors");
                *self = PlatformTracking::NotTracking;
                true
            }
            _ => false,
        }
    }

    /// Number of live detector subscriptions.
    pub fn subscription_count(&self) -> usize {
        match self {
            PlatformTracking::NotTracking => 0,
            PlatformTracking::Tracking(subscriptions) => subscriptions.len(),
        }
    }
}
