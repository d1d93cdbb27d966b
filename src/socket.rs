//! Realtime sync client.
//!
//! DESIGN
//! ======
//! At most one live websocket per client. The joined-rooms set is kept in
//! step with the board store: every board-list change nudges a
//! reconciliation task that joins rooms the connection is not in yet, and
//! an errored join acknowledgment rolls its room back out so the next
//! reconciliation retries it. Server pushes are translated into actions
//! and funnel through the same dispatcher as local ones, so
//! socket-confirmed and locally-optimistic updates interleave safely.
//!
//! A generation counter advances on every connect and disconnect; frames
//! observed by a superseded connection's reader are dropped, so
//! `disconnect` followed immediately by `connect` is safe.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::action::{Action, Op};
use crate::app::App;
use crate::store::ListenerHandle;
use crate::store::board::BoardStore;
use crate::store::ticket::TicketStore;
use crate::wire::{self, BoardEvent, Envelope, EventKind};

/// Error returned by [`SyncClient::connect`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The server refused the handshake; `detail` is the parsed error body.
    #[error("connection rejected ({status}): {detail}")]
    Rejected { status: u16, detail: Value },
    /// Transport-level failure before or during the handshake.
    #[error("websocket connect failed: {0}")]
    Transport(#[from] Box<tungstenite::Error>),
}

/// Lifecycle of the realtime connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Board ids the connection has joined.
type Rooms = Arc<Mutex<HashSet<String>>>;
/// Outstanding join requests: envelope id to board id.
type PendingJoins = Arc<Mutex<HashMap<String, String>>>;

struct Connection {
    outbound: mpsc::UnboundedSender<Envelope>,
    rooms: Rooms,
    board_listener: ListenerHandle,
    tasks: Vec<JoinHandle<()>>,
}

pub struct SyncClient {
    app: Arc<App>,
    url: String,
    generation: Arc<AtomicU64>,
    status: Mutex<ConnectionStatus>,
    conn: Mutex<Option<Connection>>,
}

impl SyncClient {
    #[must_use]
    pub fn new(app: Arc<App>, url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            app,
            url: url.into(),
            generation: Arc::new(AtomicU64::new(0)),
            status: Mutex::new(ConnectionStatus::Disconnected),
            conn: Mutex::new(None),
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while a connection is established.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.lock_conn().is_some()
    }

    /// Opens the realtime connection with `token` as the handshake
    /// credential. Resolves immediately when already connected; at most one
    /// fresh transport exists at a time. On success the inbound listener is
    /// attached, rooms are reconciled once, and every future board-list
    /// change re-triggers reconciliation.
    ///
    /// # Errors
    ///
    /// [`ConnectionError`] when the transport fails or the server rejects
    /// the handshake. An unauthorized rejection dispatches the
    /// authentication-failure action before the error is returned.
    pub async fn connect(&self, token: &str) -> Result<(), ConnectionError> {
        if self.connected() {
            return Ok(());
        }
        self.set_status(ConnectionStatus::Connecting);

        let url = format!("{}?access-token={}", self.url, token);
        let (stream, _) = match connect_async(&url).await {
            Ok(ok) => ok,
            Err(error) => {
                self.set_status(ConnectionStatus::Disconnected);
                return Err(self.handshake_failure(error));
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (sink, source) = stream.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel::<Envelope>();
        let rooms: Rooms = Arc::default();
        let pending: PendingJoins = Arc::default();
        let nudge = Arc::new(Notify::new());

        // The writer is left to finish on its own: it closes the socket
        // once every sender is gone.
        tokio::spawn(write_loop(outbound_rx, sink));
        let reader = tokio::spawn(read_loop(
            source,
            self.app.clone(),
            self.generation.clone(),
            generation,
            rooms.clone(),
            pending.clone(),
        ));
        let joiner = tokio::spawn(reconcile_loop(
            self.app.clone(),
            nudge.clone(),
            rooms.clone(),
            pending.clone(),
            outbound.clone(),
        ));

        let board_listener = self.app.boards.add_change_listener({
            let nudge = nudge.clone();
            move || nudge.notify_one()
        });

        let mut conn = self.lock_conn();
        if conn.is_some() {
            // Lost a connect race; keep the established connection.
            reader.abort();
            joiner.abort();
            self.app.boards.remove_change_listener(board_listener);
            self.set_status(ConnectionStatus::Connected);
            return Ok(());
        }
        *conn = Some(Connection {
            outbound,
            rooms,
            board_listener,
            tasks: vec![reader, joiner],
        });
        drop(conn);
        self.set_status(ConnectionStatus::Connected);
        tracing::info!("realtime connection established");
        Ok(())
    }

    /// Closes the connection if one exists; always clears the room set, the
    /// connection reference, and the board listener. Safe to call
    /// repeatedly.
    pub fn disconnect(&self) {
        let Some(conn) = self.lock_conn().take() else {
            return;
        };
        // Advance the generation so frames from the old socket are dropped
        // even if its reader gets one last poll in.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.app.boards.remove_change_listener(conn.board_listener);
        conn.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        for task in &conn.tasks {
            task.abort();
        }
        self.set_status(ConnectionStatus::Disconnected);
        tracing::info!("realtime connection closed");
    }

    fn handshake_failure(&self, error: tungstenite::Error) -> ConnectionError {
        if let tungstenite::Error::Http(response) = &error {
            let status = response.status().as_u16();
            let detail = response
                .body()
                .as_deref()
                .and_then(|bytes| serde_json::from_slice::<Value>(bytes).ok())
                .unwrap_or(Value::Null);
            if status == 401 {
                if let Err(error) = self.app.dispatch(&Action::authentication_failure()) {
                    tracing::warn!(%error, "authentication failure not dispatched");
                }
            }
            return ConnectionError::Rejected { status, detail };
        }
        ConnectionError::Transport(Box::new(error))
    }
}

/// Drains the outbound queue into the socket; closes the socket once every
/// sender is gone.
async fn write_loop(mut rx: mpsc::UnboundedReceiver<Envelope>, mut sink: WsSink) {
    while let Some(envelope) = rx.recv().await {
        if sink
            .send(Message::Text(wire::encode(&envelope).into()))
            .await
            .is_err()
        {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop(
    mut source: WsSource,
    app: Arc<App>,
    current: Arc<AtomicU64>,
    generation: u64,
    rooms: Rooms,
    pending: PendingJoins,
) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if current.load(Ordering::SeqCst) != generation {
                    // Superseded connection; drop late frames.
                    return;
                }
                match wire::decode(text.as_str()) {
                    Ok(envelope) => handle_envelope(&app, &rooms, &pending, &envelope),
                    Err(error) => tracing::warn!(%error, "undecodable frame"),
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// Joins every confirmed board the connection is not in yet, then waits for
/// the next board-store nudge.
async fn reconcile_loop(
    app: Arc<App>,
    nudge: Arc<Notify>,
    rooms: Rooms,
    pending: PendingJoins,
    outbound: mpsc::UnboundedSender<Envelope>,
) {
    loop {
        reconcile_rooms(&app.boards, &rooms, &pending, &outbound);
        nudge.notified().await;
    }
}

/// Emits a join request for each id in `desired - joined`. Ids already in
/// the set are never re-requested; errored joins are rolled back by the
/// acknowledgment handler and picked up again on the next call.
fn reconcile_rooms(
    boards: &BoardStore,
    rooms: &Rooms,
    pending: &PendingJoins,
    outbound: &mpsc::UnboundedSender<Envelope>,
) {
    let desired = boards.confirmed_ids();
    let mut joined = rooms.lock().unwrap_or_else(PoisonError::into_inner);
    for board_id in desired {
        if !joined.insert(board_id.clone()) {
            continue;
        }
        let request = Envelope::join(&board_id);
        let request_id = request.id.clone();
        pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id.clone(), board_id.clone());
        if outbound.send(request).is_err() {
            // Connection torn down mid-reconcile.
            pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&request_id);
            joined.remove(&board_id);
            break;
        }
        tracing::debug!(board = %board_id, "room join requested");
    }
}

fn handle_envelope(app: &App, rooms: &Rooms, pending: &PendingJoins, envelope: &Envelope) {
    if envelope.parent_id.is_some() {
        handle_join_ack(rooms, pending, envelope);
        return;
    }
    if envelope.event != wire::DATA_EVENT {
        return;
    }
    let event = match serde_json::from_value::<BoardEvent>(envelope.data.clone()) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(%error, "unrecognized board event");
            return;
        }
    };
    let Some(action) = translate(&app.tickets, &event) else {
        return;
    };
    if let Err(error) = app.dispatch(&action) {
        tracing::warn!(%error, "socket event dropped");
    }
}

/// Rolls an errored join back out of the room set; the next reconciliation
/// retries it.
fn handle_join_ack(rooms: &Rooms, pending: &PendingJoins, envelope: &Envelope) {
    let Some(board_id) = envelope.parent_id.as_deref().and_then(|parent| {
        pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(parent)
    }) else {
        return;
    };
    if let Some(error) = envelope.error() {
        tracing::warn!(board = %board_id, ?error, "room join refused");
        rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&board_id);
    }
}

/// Maps one inbound event onto an action, or `None` for reserved kinds and
/// duplicate creations.
fn translate(tickets: &TicketStore, event: &BoardEvent) -> Option<Action> {
    match event.kind {
        EventKind::TicketCreate => {
            let id = event.data.get("id").and_then(Value::as_str)?;
            if tickets.ticket(&event.board, id).is_some() {
                // Echo of a creation this client already applied.
                return None;
            }
            Some(Action::request(
                Op::AddTicket,
                serde_json::json!({ "boardID": event.board, "ticket": event.data }),
            ))
        }
        EventKind::TicketEdit => {
            let id = event.data.get("id").and_then(Value::as_str)?;
            let attrs = event
                .data
                .get("newAttributes")
                .cloned()
                .unwrap_or(Value::Null);
            Some(Action::request(
                Op::EditTicket,
                serde_json::json!({
                    "boardID": event.board, "ticketID": id, "ticket": attrs
                }),
            ))
        }
        EventKind::TicketRemove => {
            let id = event.data.get("id").and_then(Value::as_str)?;
            Some(Action::request(
                Op::RemoveTicket,
                serde_json::json!({ "boardID": event.board, "ticketID": id }),
            ))
        }
        // Reserved for board-level sync.
        EventKind::BoardEdit | EventKind::BoardRemove => None,
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
