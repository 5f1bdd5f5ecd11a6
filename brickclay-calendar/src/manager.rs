//! Coordinates popups so only one calendar is open at a time.
//!
//! ## Usage
//!
//! Every mounted picker registers a close [`Callback`] and keeps the returned
//! [`Registration`] alive for as long as it is mounted. Opening a picker calls
//! [`CalendarRegistry::close_all_except`] with its own callback; hosts can
//! collapse everything with [`CalendarRegistry::close_all`].
//!
//! Callbacks are copied out of the registry before they run, so a callback
//! may register, unregister or broadcast again without deadlocking.

use std::sync::{
    Arc, OnceLock, Weak,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

use crate::callback::Callback;

static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_REGISTRY: OnceLock<Arc<CalendarRegistry>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Close,
    Broadcast,
}

/// One registered callback; `guards` counts the live [`Registration`]s for it.
struct Entry {
    id: u64,
    callback: Callback,
    guards: usize,
}

#[derive(Default)]
struct RegistryInner {
    closers: Vec<Entry>,
    listeners: Vec<Entry>,
}

impl RegistryInner {
    fn list_mut(&mut self, kind: EntryKind) -> &mut Vec<Entry> {
        match kind {
            EntryKind::Close => &mut self.closers,
            EntryKind::Broadcast => &mut self.listeners,
        }
    }
}

fn callbacks(entries: &[Entry]) -> Vec<Callback> {
    entries.iter().map(|entry| entry.callback.clone()).collect()
}

/// Process-wide set of mounted calendar instances.
#[derive(Default)]
pub struct CalendarRegistry {
    inner: Mutex<RegistryInner>,
}

impl CalendarRegistry {
    /// Creates an independent registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The shared registry used when a picker is mounted without one.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(Self::new))
    }

    /// Adds a close callback; it stays registered until the guard is dropped.
    ///
    /// Registering a callback that is already present adds no second entry.
    /// The callback stays registered until every guard for it is gone.
    pub fn register(self: &Arc<Self>, close: Callback) -> Registration {
        self.insert(EntryKind::Close, close)
    }

    /// Observes [`Self::close_all`] broadcasts.
    ///
    /// Listeners run before the registered close callbacks.
    pub fn subscribe_close_all(self: &Arc<Self>, listener: Callback) -> Registration {
        self.insert(EntryKind::Broadcast, listener)
    }

    fn insert(self: &Arc<Self>, kind: EntryKind, callback: Callback) -> Registration {
        let mut inner = self.inner.lock();
        let list = inner.list_mut(kind);
        let id = match list.iter().position(|entry| entry.callback == callback) {
            Some(index) => {
                let entry = &mut list[index];
                entry.guards += 1;
                tracing::trace!(id = entry.id, ?kind, "calendar callback already registered");
                entry.id
            }
            None => {
                let id = NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed);
                list.push(Entry {
                    id,
                    callback,
                    guards: 1,
                });
                tracing::debug!(id, ?kind, "calendar callback registered");
                id
            }
        };
        Registration {
            registry: Arc::downgrade(self),
            id,
            kind,
            active: true,
        }
    }

    fn remove(&self, kind: EntryKind, id: u64) {
        let mut inner = self.inner.lock();
        let list = inner.list_mut(kind);
        let Some(index) = list.iter().position(|entry| entry.id == id) else {
            return;
        };
        list[index].guards -= 1;
        if list[index].guards == 0 {
            list.remove(index);
            tracing::debug!(id, ?kind, "calendar callback unregistered");
        }
    }

    /// Runs every registered close callback except `except`.
    pub fn close_all_except(&self, except: &Callback) {
        let targets: Vec<Callback> = self
            .inner
            .lock()
            .closers
            .iter()
            .filter(|entry| entry.callback != *except)
            .map(|entry| entry.callback.clone())
            .collect();
        tracing::debug!(count = targets.len(), "closing sibling calendars");
        for callback in targets {
            callback.call();
        }
    }

    /// Broadcasts to listeners, then runs every registered close callback.
    pub fn close_all(&self) {
        let (listeners, closers) = {
            let inner = self.inner.lock();
            (callbacks(&inner.listeners), callbacks(&inner.closers))
        };
        tracing::debug!(
            listeners = listeners.len(),
            closers = closers.len(),
            "closing all calendars"
        );
        for callback in listeners.iter().chain(closers.iter()) {
            callback.call();
        }
    }

    /// Number of registered close callbacks.
    pub fn len(&self) -> usize {
        self.inner.lock().closers.len()
    }

    /// Whether no close callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a callback registered; dropping it unregisters.
#[must_use = "dropping a Registration unregisters its callback immediately"]
pub struct Registration {
    registry: Weak<CalendarRegistry>,
    id: u64,
    kind: EntryKind,
    active: bool,
}

impl Registration {
    /// Removes the callback now. Calling it again does nothing.
    pub fn unregister(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.kind, self.id);
        }
    }

    /// Whether the callback is still registered through this guard.
    pub fn is_active(&self) -> bool {
        self.active && self.registry.strong_count() > 0
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .finish()
    }
}
