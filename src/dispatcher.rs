//! Process-wide action broadcast.
//!
//! DESIGN
//! ======
//! One dispatcher per process. `dispatch` delivers an action to every
//! registered handler in registration order and refuses to start while a
//! dispatch is already running on the current thread — a handler that
//! synchronously dispatches again gets an error instead of corrupting the
//! in-progress delivery. Cross-thread dispatches serialize on the handler
//! list, so no two actions are ever processed concurrently.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::action::{Action, ActionKind};

/// Error returned by [`Dispatcher::dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Dispatch was invoked from inside a handler of a dispatch already in
    /// progress on this thread. The outer dispatch still completes.
    #[error("re-entrant dispatch of {0}")]
    Reentrant(ActionKind),
}

type Handler = Box<dyn Fn(&Action) + Send + Sync>;

/// Opaque registration handle returned by [`Dispatcher::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchToken(u64);

thread_local! {
    static IN_DISPATCH: Cell<bool> = const { Cell::new(false) };
}

/// Clears the in-dispatch flag even when a handler panics.
struct DispatchGuard;

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        IN_DISPATCH.set(false);
    }
}

#[derive(Default)]
pub struct Dispatcher {
    next_token: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Handler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a handler. Delivery follows registration order.
    pub fn register(&self, handler: impl Fn(&Action) + Send + Sync + 'static) -> DispatchToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.lock().push((token, Box::new(handler)));
        DispatchToken(token)
    }

    /// Removes a previously registered handler. Unknown tokens are ignored.
    pub fn unregister(&self, token: DispatchToken) {
        self.lock().retain(|(id, _)| *id != token.0);
    }

    /// Delivers `action` to every registered handler, in registration
    /// order. One action is fully processed before the next begins.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Reentrant`] when called from inside a handler of a
    /// dispatch already running on this thread.
    pub fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        if IN_DISPATCH.get() {
            return Err(DispatchError::Reentrant(action.kind));
        }

        let handlers = self.lock();
        IN_DISPATCH.set(true);
        let _guard = DispatchGuard;

        tracing::debug!(kind = %action.kind, "dispatch");
        for (_, handler) in handlers.iter() {
            handler(action);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
