//! Stores: authoritative client-side state.
//!
//! DESIGN
//! ======
//! State is split by domain (`auth`, `board`, `ticket`) so the socket and
//! action layers can depend on small focused models. A store mutates only
//! from its dispatch handler, exposes read accessors over current state,
//! and notifies change listeners synchronously after a mutation.

pub mod auth;
pub mod board;
pub mod ticket;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `add_change_listener`, used to remove the listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerHandle(u64);

/// Change-notification list shared by every store.
#[derive(Default)]
pub(crate) struct Listeners {
    next: AtomicU64,
    entries: Mutex<Vec<(u64, Callback)>>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(listener)));
        ListenerHandle(id)
    }

    pub fn remove(&self, handle: ListenerHandle) {
        self.lock().retain(|(id, _)| *id != handle.0);
    }

    /// Invokes every listener. Snapshots the list first so a listener may
    /// add or remove listeners without deadlocking.
    pub fn notify(&self) {
        let snapshot: Vec<Callback> = self.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for listener in snapshot {
            listener();
        }
    }
}
