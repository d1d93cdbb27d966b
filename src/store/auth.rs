//! Session store.
//!
//! Holds the current user and access token. Every read goes through durable
//! storage, so the accessors are correct before any action has been
//! dispatched in this process — the session survives restarts. The session
//! is all-or-nothing: user and token are written together and cleared
//! together.

use serde_json::Value;

use super::{ListenerHandle, Listeners};
use crate::action::{Action, ActionKind, Op};
use crate::model::User;
use crate::storage::SessionStorage;

pub struct AuthStore {
    storage: SessionStorage,
    listeners: Listeners,
}

impl AuthStore {
    #[must_use]
    pub fn new(storage: SessionStorage) -> Self {
        Self { storage, listeners: Listeners::default() }
    }

    /// The currently logged-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.storage.user()
    }

    /// The access token for the current session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.storage.token()
    }

    pub fn add_change_listener(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.listeners.add(listener)
    }

    pub fn remove_change_listener(&self, handle: ListenerHandle) {
        self.listeners.remove(handle);
    }

    pub(crate) fn handle(&self, action: &Action) {
        match action.kind {
            ActionKind::Success(Op::Login | Op::LoginGuest) => {
                self.set_session(&action.payload);
                self.listeners.notify();
            }
            ActionKind::Success(Op::LoadUser) => {
                if let Some(user) = parse_user(&action.payload) {
                    self.storage.set_user(&user);
                } else {
                    tracing::warn!(kind = %action.kind, "payload carried no user");
                }
                self.listeners.notify();
            }
            ActionKind::Success(Op::Logout) | ActionKind::AuthenticationFailure => {
                self.storage.clear();
                self.listeners.notify();
            }
            _ => {}
        }
    }

    /// Stores user and token together. A payload missing either leaves the
    /// previous session untouched.
    fn set_session(&self, payload: &Value) {
        let user = parse_user(payload);
        let token = payload.get("token").and_then(Value::as_str);
        match (user, token) {
            (Some(user), Some(token)) => {
                self.storage.set_user(&user);
                self.storage.set_token(token);
            }
            _ => tracing::warn!("session payload missing user or token"),
        }
    }
}

fn parse_user(payload: &Value) -> Option<User> {
    payload
        .get("user")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
