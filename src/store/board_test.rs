use serde_json::json;

use super::*;

fn loaded_store(ids: &[&str]) -> BoardStore {
    let store = BoardStore::new();
    let boards: Vec<_> = ids.iter().map(|id| json!({ "id": id, "name": id })).collect();
    store.handle(&Action::success(Op::LoadBoards, json!({ "boards": boards })));
    store
}

#[test]
fn load_replaces_the_collection() {
    let store = loaded_store(&["b1", "b2"]);
    store.handle(&Action::success(
        Op::LoadBoards,
        json!({ "boards": [{ "id": "b3", "name": "Three" }] }),
    ));

    let boards = store.boards();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].id, "b3");
}

#[test]
fn add_board_inserts_the_optimistic_entry_once() {
    let store = BoardStore::new();
    let add = Action::request(Op::AddBoard, json!({ "board": { "id": "dirty-1", "name": "New" } }));
    store.handle(&add);
    store.handle(&add);

    assert_eq!(store.boards().len(), 1);
    assert_eq!(store.board("dirty-1").map(|b| b.name), Some("New".to_owned()));
}

#[test]
fn add_board_success_replaces_the_dirty_entry() {
    let store = BoardStore::new();
    store.handle(&Action::request(
        Op::AddBoard,
        json!({ "board": { "id": "dirty-1", "name": "New" } }),
    ));
    store.handle(&Action::success(
        Op::AddBoard,
        json!({ "boardID": "dirty-1", "board": { "id": "b9", "name": "New" } }),
    ));

    assert!(store.board("dirty-1").is_none());
    assert_eq!(store.board("b9").map(|b| b.name), Some("New".to_owned()));
    assert_eq!(store.boards().len(), 1);
}

#[test]
fn edit_merges_partial_attributes() {
    let store = BoardStore::new();
    store.handle(&Action::success(
        Op::LoadBoards,
        json!({ "boards": [{ "id": "b1", "name": "One", "background": "grid" }] }),
    ));
    store.handle(&Action::request(
        Op::EditBoard,
        json!({ "boardID": "b1", "board": { "name": "Renamed" } }),
    ));

    let board = store.board("b1").unwrap();
    assert_eq!(board.name, "Renamed");
    assert_eq!(board.background.as_deref(), Some("grid"));
}

#[test]
fn edit_of_an_absent_board_is_a_noop() {
    let store = loaded_store(&["b1"]);
    store.handle(&Action::request(
        Op::EditBoard,
        json!({ "boardID": "nope", "board": { "name": "x" } }),
    ));
    assert_eq!(store.board("b1").map(|b| b.name), Some("b1".to_owned()));
}

#[test]
fn remove_deletes_and_tolerates_absent_ids() {
    let store = loaded_store(&["b1", "b2"]);
    store.handle(&Action::request(Op::RemoveBoard, json!({ "boardID": "b1" })));
    store.handle(&Action::request(Op::RemoveBoard, json!({ "boardID": "b1" })));

    assert!(store.board("b1").is_none());
    assert_eq!(store.boards().len(), 1);
}

#[test]
fn confirmed_ids_exclude_dirty_boards() {
    let store = loaded_store(&["b1", "dirty-b2", "b3"]);
    assert_eq!(store.confirmed_ids(), vec!["b1".to_owned(), "b3".to_owned()]);
}
