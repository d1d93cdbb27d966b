//! Domain model shared by the stores and the sync layer.
//!
//! Payloads on the wire stay flexible (`serde_json::Value`); these types are
//! what the stores hold once a payload has been accepted.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix marking a client-created board the server has not confirmed yet.
/// Dirty ids never join realtime rooms.
pub const DIRTY_PREFIX: &str = "dirty";

/// Returns true for ids of boards that only exist locally.
#[must_use]
pub fn is_dirty(id: &str) -> bool {
    id.starts_with(DIRTY_PREFIX)
}

/// An authenticated (or guest) user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// A board summary as held by the board store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// Sticky-note palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Yellow,
    Red,
    Green,
    Blue,
    Purple,
}

/// Error returned when parsing a [`Color`] from text.
#[derive(Debug, thiserror::Error)]
#[error("unknown color: {0}")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "purple" => Ok(Self::Purple),
            other => Err(ParseColorError(other.to_owned())),
        }
    }
}

/// Position of a ticket on its board, in board coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A sticky-note ticket. Owned by exactly one board; unique per
/// `(board, id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    /// Filled in by the ticket store from the action payload; wire
    /// representations of a ticket may omit it.
    #[serde(rename = "boardID", default)]
    pub board_id: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Position,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
