use serde_json::json;

use super::*;

// =============================================================
// Wire/log names
// =============================================================

#[test]
fn kind_display_matches_wire_names() {
    assert_eq!(ActionKind::Request(Op::Login).to_string(), "LOGIN");
    assert_eq!(ActionKind::Success(Op::LoginGuest).to_string(), "LOGIN_GUEST_SUCCESS");
    assert_eq!(ActionKind::Failure(Op::LoadUser).to_string(), "LOAD_USER_FAILURE");
    assert_eq!(ActionKind::AuthenticationFailure.to_string(), "AUTHENTICATION_FAILURE");
}

#[test]
fn op_names_are_distinct() {
    let ops = [
        Op::Login,
        Op::LoginGuest,
        Op::LoadUser,
        Op::Logout,
        Op::LoadBoards,
        Op::AddBoard,
        Op::EditBoard,
        Op::RemoveBoard,
        Op::LoadTickets,
        Op::AddTicket,
        Op::EditTicket,
        Op::RemoveTicket,
    ];
    let mut names: Vec<_> = ops.iter().map(|op| op.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), ops.len());
}

// =============================================================
// Constructors
// =============================================================

#[test]
fn constructors_set_kind_and_payload() {
    let action = Action::request(Op::AddTicket, json!({ "boardID": "b1" }));
    assert_eq!(action.kind, ActionKind::Request(Op::AddTicket));
    assert_eq!(action.payload, json!({ "boardID": "b1" }));

    let failure = Action::authentication_failure();
    assert_eq!(failure.kind, ActionKind::AuthenticationFailure);
    assert!(failure.payload.is_null());
}
