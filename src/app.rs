//! Application context.
//!
//! One [`App`] per process: the dispatcher plus the three stores,
//! constructed and registered once, then injected into the socket and
//! action layers. Explicit instances instead of globals, with the same
//! single-instance semantics.

use std::sync::Arc;

use crate::action::Action;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::storage::SessionStorage;
use crate::store::auth::AuthStore;
use crate::store::board::BoardStore;
use crate::store::ticket::TicketStore;

pub struct App {
    dispatcher: Dispatcher,
    pub auth: Arc<AuthStore>,
    pub boards: Arc<BoardStore>,
    pub tickets: Arc<TicketStore>,
}

impl App {
    /// Builds the context and registers the stores with the dispatcher, in
    /// order: auth, boards, tickets.
    #[must_use]
    pub fn new(storage: SessionStorage) -> Arc<Self> {
        let dispatcher = Dispatcher::new();
        let auth = Arc::new(AuthStore::new(storage));
        let boards = Arc::new(BoardStore::new());
        let tickets = Arc::new(TicketStore::new());

        dispatcher.register({
            let store = auth.clone();
            move |action| store.handle(action)
        });
        dispatcher.register({
            let store = boards.clone();
            move |action| store.handle(action)
        });
        dispatcher.register({
            let store = tickets.clone();
            move |action| store.handle(action)
        });

        Arc::new(Self { dispatcher, auth, boards, tickets })
    }

    /// Broadcasts `action` to every store.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Reentrant`] when called from inside a store handler.
    pub fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action)
    }

    /// The underlying dispatcher, for observers that want every action.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
