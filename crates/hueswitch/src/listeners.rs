//! Listener registry shared by detectors and change events.

use std::sync::{Arc, Mutex, PoisonError};

use crate::platform::Subscription;

pub(crate) type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

/// A set of callbacks. Subscribing returns a [`Subscription`] that removes
/// the callback when dropped.
pub(crate) struct Listeners<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> Listeners<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub(crate) fn subscribe(&self, callback: Callback<E>) -> Subscription {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, callback));
            id
        };

        let registry = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entries
                    .retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Calls every callback. The lock is released first so callbacks may
    /// subscribe or unsubscribe.
    pub(crate) fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
