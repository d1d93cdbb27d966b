use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;
use crate::action::Op;

fn action() -> Action {
    Action::request(Op::AddTicket, json!({ "boardID": "b1" }))
}

fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl Fn(&Action) + Send + Sync + use<> {
    let log = log.clone();
    move |_| log.lock().unwrap().push(tag.to_owned())
}

// =============================================================
// Delivery
// =============================================================

#[test]
fn handlers_run_in_registration_order() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.register(recorder(&log, "first"));
    dispatcher.register(recorder(&log, "second"));

    dispatcher.dispatch(&action()).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn unregister_stops_delivery() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = dispatcher.register(recorder(&log, "first"));
    dispatcher.register(recorder(&log, "second"));

    dispatcher.unregister(token);
    dispatcher.dispatch(&action()).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["second"]);
}

// =============================================================
// Re-entrancy
// =============================================================

#[test]
fn reentrant_dispatch_is_refused_and_outer_completes() {
    let dispatcher = Arc::new(Dispatcher::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let inner_result = Arc::new(Mutex::new(None));

    dispatcher.register({
        let dispatcher = dispatcher.clone();
        let inner_result = inner_result.clone();
        move |_| {
            let nested = dispatcher.dispatch(&Action::request(Op::EditTicket, json!({})));
            inner_result.lock().unwrap().replace(nested);
        }
    });
    dispatcher.register(recorder(&log, "after"));

    dispatcher.dispatch(&action()).unwrap();

    let nested = inner_result.lock().unwrap().take().unwrap();
    assert!(matches!(
        nested,
        Err(DispatchError::Reentrant(ActionKind::Request(Op::EditTicket)))
    ));
    // The outer dispatch still reached every handler.
    assert_eq!(*log.lock().unwrap(), vec!["after"]);

    // The dispatcher is usable again afterwards.
    dispatcher.dispatch(&action()).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["after", "after"]);
}
