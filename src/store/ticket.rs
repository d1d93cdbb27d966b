//! Ticket store: per-board sticky-note collections.
//!
//! Mutations arrive from two overlapping paths — locally-optimistic actions
//! and socket-confirmed events — so every handler is idempotent-safe: a
//! duplicate `ADD_TICKET` is a no-op, edits merge rather than replace, and
//! removing an absent ticket does nothing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::{ListenerHandle, Listeners};
use crate::action::{Action, ActionKind, Op};
use crate::model::{Color, Position, Ticket};

type Tickets = HashMap<String, HashMap<String, Ticket>>;

#[derive(Default)]
pub struct TicketStore {
    boards: Mutex<Tickets>,
    listeners: Listeners,
}

impl TicketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tickets currently known for `board_id`. Order is unspecified.
    #[must_use]
    pub fn tickets(&self, board_id: &str) -> Vec<Ticket> {
        self.lock()
            .get(board_id)
            .map(|tickets| tickets.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn ticket(&self, board_id: &str, ticket_id: &str) -> Option<Ticket> {
        self.lock()
            .get(board_id)
            .and_then(|tickets| tickets.get(ticket_id))
            .cloned()
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
        let changed = {
            let mut boards = self.lock();
            apply(&mut boards, action)
        };
        if changed {
            self.listeners.notify();
        }
    }
}

fn apply(state: &mut Tickets, action: &Action) -> bool {
    match action.kind {
        ActionKind::Request(Op::AddTicket) | ActionKind::Success(Op::AddTicket) => {
            let Some(board_id) = board_id(&action.payload) else {
                return false;
            };
            let Some(mut ticket) = parse_ticket(&action.payload) else {
                tracing::warn!(kind = %action.kind, "ticket payload was malformed");
                return false;
            };
            ticket.board_id = board_id.to_owned();
            let tickets = state.entry(board_id.to_owned()).or_default();
            if tickets.contains_key(&ticket.id) {
                // Duplicate delivery from overlapping local and socket paths.
                return false;
            }
            tickets.insert(ticket.id.clone(), ticket);
            true
        }
        ActionKind::Request(Op::EditTicket) | ActionKind::Success(Op::EditTicket) => {
            let (Some(board_id), Some(ticket_id)) = ids(&action.payload) else {
                return false;
            };
            let Some(ticket) = state
                .get_mut(board_id)
                .and_then(|tickets| tickets.get_mut(ticket_id))
            else {
                return false;
            };
            merge_ticket(ticket, action.payload.get("ticket").unwrap_or(&Value::Null))
        }
        ActionKind::Request(Op::RemoveTicket) | ActionKind::Success(Op::RemoveTicket) => {
            let (Some(board_id), Some(ticket_id)) = ids(&action.payload) else {
                return false;
            };
            state
                .get_mut(board_id)
                .and_then(|tickets| tickets.remove(ticket_id))
                .is_some()
        }
        ActionKind::Success(Op::LoadTickets) => {
            let Some(board_id) = board_id(&action.payload) else {
                return false;
            };
            let Some(list) = action
                .payload
                .get("tickets")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<Ticket>>(value).ok())
            else {
                tracing::warn!("ticket list payload was malformed");
                return false;
            };
            let mut tickets = HashMap::with_capacity(list.len());
            for mut ticket in list {
                ticket.board_id = board_id.to_owned();
                tickets.insert(ticket.id.clone(), ticket);
            }
            state.insert(board_id.to_owned(), tickets);
            true
        }
        _ => false,
    }
}

fn board_id(payload: &Value) -> Option<&str> {
    payload.get("boardID").and_then(Value::as_str)
}

fn ids(payload: &Value) -> (Option<&str>, Option<&str>) {
    (board_id(payload), payload.get("ticketID").and_then(Value::as_str))
}

fn parse_ticket(payload: &Value) -> Option<Ticket> {
    payload
        .get("ticket")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
}

/// Merges partial attributes into an existing ticket; unspecified
/// attributes keep their prior values.
fn merge_ticket(ticket: &mut Ticket, attrs: &Value) -> bool {
    let mut changed = false;
    if let Some(content) = attrs.get("content").and_then(Value::as_str) {
        if ticket.content != content {
            ticket.content = content.to_owned();
            changed = true;
        }
    }
    if let Some(color) = attrs
        .get("color")
        .cloned()
        .and_then(|value| serde_json::from_value::<Color>(value).ok())
    {
        if ticket.color != color {
            ticket.color = color;
            changed = true;
        }
    }
    if let Some(position) = attrs
        .get("position")
        .cloned()
        .and_then(|value| serde_json::from_value::<Position>(value).ok())
    {
        if ticket.position != position {
            ticket.position = position;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
#[path = "ticket_test.rs"]
mod tests;
