//! Action vocabulary for the unidirectional data flow.
//!
//! Every state mutation travels as an [`Action`]: a kind from a closed
//! enumeration plus a flexible JSON payload. Async operations move through
//! three phases of the same [`Op`] — the optimistic request, then exactly
//! one of success or failure — with [`ActionKind::AuthenticationFailure`]
//! as the single cross-cutting exception.

use std::fmt;

use serde_json::Value;

/// Client operations that flow through the action pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    LoginGuest,
    LoadUser,
    Logout,
    LoadBoards,
    AddBoard,
    EditBoard,
    RemoveBoard,
    LoadTickets,
    AddTicket,
    EditTicket,
    RemoveTicket,
}

impl Op {
    /// Canonical wire/log name of the operation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::LoginGuest => "LOGIN_GUEST",
            Self::LoadUser => "LOAD_USER",
            Self::Logout => "LOGOUT",
            Self::LoadBoards => "LOAD_BOARDS",
            Self::AddBoard => "ADD_BOARD",
            Self::EditBoard => "EDIT_BOARD",
            Self::RemoveBoard => "REMOVE_BOARD",
            Self::LoadTickets => "LOAD_TICKETS",
            Self::AddTicket => "ADD_TICKET",
            Self::EditTicket => "EDIT_TICKET",
            Self::RemoveTicket => "REMOVE_TICKET",
        }
    }
}

/// Lifecycle position of a dispatched action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Optimistic action dispatched before the operation settles.
    Request(Op),
    /// The operation resolved; the payload carries the server result.
    Success(Op),
    /// The operation failed; the payload carries the error.
    Failure(Op),
    /// Cross-cutting unauthorized marker, dispatched in addition to the
    /// specific failure so any store may react.
    AuthenticationFailure,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(op) => f.write_str(op.name()),
            Self::Success(op) => write!(f, "{}_SUCCESS", op.name()),
            Self::Failure(op) => write!(f, "{}_FAILURE", op.name()),
            Self::AuthenticationFailure => f.write_str("AUTHENTICATION_FAILURE"),
        }
    }
}

/// A single message on the dispatcher. Transient; never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub payload: Value,
}

impl Action {
    #[must_use]
    pub fn request(op: Op, payload: Value) -> Self {
        Self { kind: ActionKind::Request(op), payload }
    }

    #[must_use]
    pub fn success(op: Op, payload: Value) -> Self {
        Self { kind: ActionKind::Success(op), payload }
    }

    #[must_use]
    pub fn failure(op: Op, payload: Value) -> Self {
        Self { kind: ActionKind::Failure(op), payload }
    }

    #[must_use]
    pub fn authentication_failure() -> Self {
        Self { kind: ActionKind::AuthenticationFailure, payload: Value::Null }
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
