//! Board store.
//!
//! Boards the client knows about, in insertion order. A board created
//! locally carries a dirty id until the server confirms it; dirty ids are
//! excluded from [`BoardStore::confirmed_ids`], which drives room joins.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::{ListenerHandle, Listeners};
use crate::action::{Action, ActionKind, Op};
use crate::model::{self, Board};

#[derive(Default)]
pub struct BoardStore {
    boards: Mutex<Vec<Board>>,
    listeners: Listeners,
}

impl BoardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Board>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All boards currently in store.
    #[must_use]
    pub fn boards(&self) -> Vec<Board> {
        self.lock().clone()
    }

    #[must_use]
    pub fn board(&self, id: &str) -> Option<Board> {
        self.lock().iter().find(|board| board.id == id).cloned()
    }

    /// Ids of server-confirmed boards (dirty ids excluded).
    #[must_use]
    pub fn confirmed_ids(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|board| board.id.clone())
            .filter(|id| !model::is_dirty(id))
            .collect()
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

fn apply(boards: &mut Vec<Board>, action: &Action) -> bool {
    match action.kind {
        ActionKind::Success(Op::LoadBoards) => {
            let Some(list) = action
                .payload
                .get("boards")
                .cloned()
                .and_then(|value| serde_json::from_value::<Vec<Board>>(value).ok())
            else {
                tracing::warn!("board list payload was malformed");
                return false;
            };
            *boards = list;
            true
        }
        ActionKind::Request(Op::AddBoard) => {
            let Some(board) = parse_board(&action.payload) else {
                return false;
            };
            if boards.iter().any(|existing| existing.id == board.id) {
                return false;
            }
            boards.push(board);
            true
        }
        ActionKind::Success(Op::AddBoard) => {
            // The optimistic entry sits under a dirty id; the payload maps
            // it onto the server-assigned board.
            let Some(board) = parse_board(&action.payload) else {
                return false;
            };
            let dirty_id = action.payload.get("boardID").and_then(Value::as_str);
            if let Some(existing) = boards
                .iter_mut()
                .find(|b| Some(b.id.as_str()) == dirty_id || b.id == board.id)
            {
                *existing = board;
            } else {
                boards.push(board);
            }
            true
        }
        ActionKind::Request(Op::EditBoard) | ActionKind::Success(Op::EditBoard) => {
            let Some(id) = action.payload.get("boardID").and_then(Value::as_str) else {
                return false;
            };
            let Some(board) = boards.iter_mut().find(|b| b.id == id) else {
                return false;
            };
            merge_board(board, action.payload.get("board").unwrap_or(&Value::Null))
        }
        ActionKind::Request(Op::RemoveBoard) => {
            let Some(id) = action.payload.get("boardID").and_then(Value::as_str) else {
                return false;
            };
            let before = boards.len();
            boards.retain(|board| board.id != id);
            boards.len() != before
        }
        _ => false,
    }
}

fn parse_board(payload: &Value) -> Option<Board> {
    payload
        .get("board")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
}

/// Merges partial attributes into an existing board. Unknown fields are
/// ignored.
fn merge_board(board: &mut Board, attrs: &Value) -> bool {
    let mut changed = false;
    if let Some(name) = attrs.get("name").and_then(Value::as_str) {
        if board.name != name {
            board.name = name.to_owned();
            changed = true;
        }
    }
    if let Some(background) = attrs.get("background").and_then(Value::as_str) {
        if board.background.as_deref() != Some(background) {
            board.background = Some(background.to_owned());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
