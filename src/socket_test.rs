use std::path::PathBuf;
use std::sync::Mutex as StdMutex;

use serde_json::json;

use super::*;
use crate::action::ActionKind;
use crate::storage::SessionStorage;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("teamboard-socket-test-{}", uuid::Uuid::new_v4()))
}

fn app_with_boards(ids: &[&str]) -> Arc<App> {
    let app = App::new(SessionStorage::new(temp_dir()));
    let boards: Vec<_> = ids.iter().map(|id| json!({ "id": id, "name": id })).collect();
    app.dispatch(&Action::success(Op::LoadBoards, json!({ "boards": boards })))
        .unwrap();
    app
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Vec<Envelope> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope);
    }
    out
}

fn joined_board(envelope: &Envelope) -> String {
    envelope.data["board"].as_str().unwrap().to_owned()
}

// =============================================================
// Room reconciliation
// =============================================================

#[test]
fn reconcile_joins_only_confirmed_boards() {
    let app = app_with_boards(&["b1", "dirty-b2", "b3"]);
    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();
    let (tx, mut rx) = mpsc::unbounded_channel();

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);

    let mut requested: Vec<_> = drain(&mut rx).iter().map(joined_board).collect();
    requested.sort();
    assert_eq!(requested, vec!["b1".to_owned(), "b3".to_owned()]);

    let joined = rooms.lock().unwrap();
    assert!(joined.contains("b1") && joined.contains("b3"));
    assert!(!joined.contains("dirty-b2"));
}

#[test]
fn joined_rooms_are_never_rerequested() {
    let app = app_with_boards(&["b1"]);
    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();
    let (tx, mut rx) = mpsc::unbounded_channel();

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);
    assert_eq!(drain(&mut rx).len(), 1);

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn errored_ack_rolls_back_and_the_next_reconciliation_retries() {
    let app = app_with_boards(&["b1"]);
    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();
    let (tx, mut rx) = mpsc::unbounded_channel();

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);
    let join = drain(&mut rx).pop().unwrap();

    let ack = Envelope {
        id: "ack-1".to_owned(),
        parent_id: Some(join.id),
        event: wire::JOIN_EVENT.to_owned(),
        data: json!({ "error": { "statusCode": 500 } }),
    };
    handle_join_ack(&rooms, &pending, &ack);

    assert!(!rooms.lock().unwrap().contains("b1"));
    assert!(pending.lock().unwrap().is_empty());

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);
    let retried: Vec<_> = drain(&mut rx).iter().map(joined_board).collect();
    assert_eq!(retried, vec!["b1".to_owned()]);
}

#[test]
fn clean_ack_keeps_the_room() {
    let app = app_with_boards(&["b1"]);
    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();
    let (tx, mut rx) = mpsc::unbounded_channel();

    reconcile_rooms(&app.boards, &rooms, &pending, &tx);
    let join = drain(&mut rx).pop().unwrap();

    let ack = Envelope {
        id: "ack-1".to_owned(),
        parent_id: Some(join.id),
        event: wire::JOIN_EVENT.to_owned(),
        data: json!({}),
    };
    handle_join_ack(&rooms, &pending, &ack);

    assert!(rooms.lock().unwrap().contains("b1"));
    assert!(pending.lock().unwrap().is_empty());
}

// =============================================================
// Inbound event translation
// =============================================================

#[test]
fn ticket_create_for_a_known_id_is_suppressed() {
    let app = app_with_boards(&["b1"]);
    app.dispatch(&Action::request(
        Op::AddTicket,
        json!({ "boardID": "b1", "ticket": { "id": "t1", "content": "mine" } }),
    ))
    .unwrap();

    let event = BoardEvent {
        kind: EventKind::TicketCreate,
        board: "b1".to_owned(),
        data: json!({ "id": "t1", "content": "echo" }),
    };
    assert!(translate(&app.tickets, &event).is_none());
}

#[test]
fn ticket_create_for_a_new_id_becomes_add_ticket() {
    let app = app_with_boards(&["b1"]);
    let event = BoardEvent {
        kind: EventKind::TicketCreate,
        board: "b1".to_owned(),
        data: json!({ "id": "t9", "content": "from elsewhere" }),
    };

    let action = translate(&app.tickets, &event).unwrap();
    assert_eq!(action.kind, ActionKind::Request(Op::AddTicket));
    assert_eq!(action.payload["boardID"], json!("b1"));
    assert_eq!(action.payload["ticket"]["id"], json!("t9"));
}

#[test]
fn ticket_edit_maps_new_attributes() {
    let app = app_with_boards(&["b1"]);
    let event = BoardEvent {
        kind: EventKind::TicketEdit,
        board: "b1".to_owned(),
        data: json!({ "id": "t1", "newAttributes": { "content": "moved" } }),
    };

    let action = translate(&app.tickets, &event).unwrap();
    assert_eq!(action.kind, ActionKind::Request(Op::EditTicket));
    assert_eq!(action.payload["ticketID"], json!("t1"));
    assert_eq!(action.payload["ticket"], json!({ "content": "moved" }));
}

#[test]
fn ticket_remove_maps_ids() {
    let app = app_with_boards(&["b1"]);
    let event = BoardEvent {
        kind: EventKind::TicketRemove,
        board: "b1".to_owned(),
        data: json!({ "id": "t1" }),
    };

    let action = translate(&app.tickets, &event).unwrap();
    assert_eq!(action.kind, ActionKind::Request(Op::RemoveTicket));
    assert_eq!(action.payload, json!({ "boardID": "b1", "ticketID": "t1" }));
}

#[test]
fn board_events_are_reserved_noops() {
    let app = app_with_boards(&["b1"]);
    for kind in [EventKind::BoardEdit, EventKind::BoardRemove] {
        let event = BoardEvent { kind, board: "b1".to_owned(), data: json!({ "id": "b1" }) };
        assert!(translate(&app.tickets, &event).is_none());
    }
}

// =============================================================
// Envelope handling
// =============================================================

fn data_envelope(board: &str, ticket_id: &str) -> Envelope {
    Envelope {
        id: uuid::Uuid::new_v4().to_string(),
        parent_id: None,
        event: wire::DATA_EVENT.to_owned(),
        data: json!({
            "type": "TICKET_CREATE",
            "board": board,
            "data": { "id": ticket_id, "content": "pushed" }
        }),
    }
}

#[test]
fn duplicate_data_events_dispatch_exactly_one_add() {
    let app = app_with_boards(&["b1"]);
    let adds = Arc::new(StdMutex::new(0_usize));
    app.dispatcher().register({
        let adds = adds.clone();
        move |action| {
            if action.kind == ActionKind::Request(Op::AddTicket) {
                *adds.lock().unwrap() += 1;
            }
        }
    });

    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();
    let envelope = data_envelope("b1", "t1");
    handle_envelope(&app, &rooms, &pending, &envelope);
    handle_envelope(&app, &rooms, &pending, &envelope);

    assert_eq!(*adds.lock().unwrap(), 1);
    assert_eq!(app.tickets.tickets("b1").len(), 1);
}

#[test]
fn unknown_events_are_ignored() {
    let app = app_with_boards(&["b1"]);
    let rooms: Rooms = Arc::default();
    let pending: PendingJoins = Arc::default();

    let envelope = Envelope {
        id: "e-1".to_owned(),
        parent_id: None,
        event: "presence:update".to_owned(),
        data: json!({}),
    };
    handle_envelope(&app, &rooms, &pending, &envelope);

    assert!(app.tickets.tickets("b1").is_empty());
}
