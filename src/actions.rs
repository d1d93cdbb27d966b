//! Action creators.
//!
//! Each creator pairs a REST call with its optimistic action through the
//! builder: callers get the pending action on the next scheduler turn, the
//! stores get exactly one success/failure once the call settles. Tokens are
//! read from the auth store at call time.

use reqwest::Method;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::action::Op;
use crate::api::{ApiClient, OpError};
use crate::app::App;
use crate::builder::{self, ActionError};
use crate::model::{Color, DIRTY_PREFIX, Position};

/// Logs in with credentials; on success the session (user and token) lands
/// in the auth store.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn login(
    app: &App,
    api: &ApiClient,
    email: &str,
    password: &str,
) -> Result<(), ActionError> {
    let body = json!({ "email": email, "password": password });
    let operation = async move {
        let auth = api.request(Method::POST, "/auth/login", None, Some(body)).await?;
        let token = response_token(&auth)?;
        let user = api.request(Method::GET, "/auth", Some(&token), None).await?;
        Ok(json!({ "user": user, "token": token }))
    };
    builder::build(app, Op::Login, Value::Null, operation).await
}

/// Joins a board as a guest, producing a guest session.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn login_guest(
    app: &App,
    api: &ApiClient,
    board_id: &str,
    username: &str,
) -> Result<(), ActionError> {
    let body = json!({ "boardID": board_id, "username": username });
    let operation = async move {
        let auth = api
            .request(Method::POST, "/auth/login/guest", None, Some(body))
            .await?;
        let token = response_token(&auth)?;
        let user = api.request(Method::GET, "/auth", Some(&token), None).await?;
        Ok(json!({ "user": user, "token": token }))
    };
    builder::build(app, Op::LoginGuest, Value::Null, operation).await
}

/// Refreshes the stored user from the server.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn load_user(app: &App, api: &ApiClient) -> Result<(), ActionError> {
    let token = app.auth.token();
    let operation = async move {
        let token = require(token)?;
        let user = api.request(Method::GET, "/auth", Some(&token), None).await?;
        Ok(json!({ "user": user }))
    };
    builder::build(app, Op::LoadUser, Value::Null, operation).await
}

/// Ends the current session on the server and clears it locally.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn logout(app: &App, api: &ApiClient) -> Result<(), ActionError> {
    let token = app.auth.token();
    let operation = async move {
        let token = require(token)?;
        api.request(Method::POST, "/auth/logout", Some(&token), None).await?;
        Ok(json!({}))
    };
    builder::build(app, Op::Logout, Value::Null, operation).await
}

/// Loads the boards visible to the current session.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn load_boards(app: &App, api: &ApiClient) -> Result<(), ActionError> {
    let token = app.auth.token();
    let operation = async move {
        let token = require(token)?;
        let boards = api.request(Method::GET, "/boards", Some(&token), None).await?;
        Ok(json!({ "boards": boards }))
    };
    builder::build(app, Op::LoadBoards, Value::Null, operation).await
}

/// Creates a board. The optimistic entry carries a dirty id until the
/// server assigns the real one; the success payload maps one onto the
/// other.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn add_board(app: &App, api: &ApiClient, name: &str) -> Result<(), ActionError> {
    let dirty_id = format!("{DIRTY_PREFIX}-{}", Uuid::new_v4());
    let token = app.auth.token();
    let initial = json!({ "board": { "id": dirty_id, "name": name } });
    let body = json!({ "name": name });
    let operation = {
        let dirty_id = dirty_id.clone();
        async move {
            let token = require(token)?;
            let board = api
                .request(Method::POST, "/boards", Some(&token), Some(body))
                .await?;
            Ok(json!({ "boardID": dirty_id, "board": board }))
        }
    };
    builder::build(app, Op::AddBoard, initial, operation).await
}

/// Edits board attributes; `attrs` is a partial JSON object.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn edit_board(
    app: &App,
    api: &ApiClient,
    board_id: &str,
    attrs: Value,
) -> Result<(), ActionError> {
    let token = app.auth.token();
    let initial = json!({ "boardID": board_id, "board": attrs });
    let path = format!("/boards/{board_id}");
    let board_id = board_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        let board = api.request(Method::PUT, &path, Some(&token), Some(attrs)).await?;
        Ok(json!({ "boardID": board_id, "board": board }))
    };
    builder::build(app, Op::EditBoard, initial, operation).await
}

/// Removes a board.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn remove_board(app: &App, api: &ApiClient, board_id: &str) -> Result<(), ActionError> {
    let token = app.auth.token();
    let initial = json!({ "boardID": board_id });
    let path = format!("/boards/{board_id}");
    let board_id = board_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        api.request(Method::DELETE, &path, Some(&token), None).await?;
        Ok(json!({ "boardID": board_id }))
    };
    builder::build(app, Op::RemoveBoard, initial, operation).await
}

/// Loads the tickets of one board.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn load_tickets(app: &App, api: &ApiClient, board_id: &str) -> Result<(), ActionError> {
    let token = app.auth.token();
    let path = format!("/boards/{board_id}/tickets");
    let board_id = board_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        let tickets = api.request(Method::GET, &path, Some(&token), None).await?;
        Ok(json!({ "boardID": board_id, "tickets": tickets }))
    };
    builder::build(app, Op::LoadTickets, Value::Null, operation).await
}

/// Creates a ticket with a client-generated id. The socket echo of this
/// creation is suppressed by the id guard, and the server response lands as
/// an idempotent no-op.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn add_ticket(
    app: &App,
    api: &ApiClient,
    board_id: &str,
    content: &str,
    color: Color,
    position: Position,
) -> Result<(), ActionError> {
    let token = app.auth.token();
    let ticket = json!({
        "id": Uuid::new_v4().to_string(),
        "content": content,
        "color": color,
        "position": position,
    });
    let initial = json!({ "boardID": board_id, "ticket": ticket });
    let path = format!("/boards/{board_id}/tickets");
    let board_id = board_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        let created = api
            .request(Method::POST, &path, Some(&token), Some(ticket))
            .await?;
        Ok(json!({ "boardID": board_id, "ticket": created }))
    };
    builder::build(app, Op::AddTicket, initial, operation).await
}

/// Edits ticket attributes; `attrs` is a partial JSON object merged into
/// the stored ticket.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn edit_ticket(
    app: &App,
    api: &ApiClient,
    board_id: &str,
    ticket_id: &str,
    attrs: Value,
) -> Result<(), ActionError> {
    let token = app.auth.token();
    let initial = json!({ "boardID": board_id, "ticketID": ticket_id, "ticket": attrs });
    let path = format!("/boards/{board_id}/tickets/{ticket_id}");
    let board_id = board_id.to_owned();
    let ticket_id = ticket_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        let ticket = api.request(Method::PUT, &path, Some(&token), Some(attrs)).await?;
        Ok(json!({ "boardID": board_id, "ticketID": ticket_id, "ticket": ticket }))
    };
    builder::build(app, Op::EditTicket, initial, operation).await
}

/// Removes a ticket.
///
/// # Errors
///
/// [`ActionError`] when the operation fails or an action is refused.
pub async fn remove_ticket(
    app: &App,
    api: &ApiClient,
    board_id: &str,
    ticket_id: &str,
) -> Result<(), ActionError> {
    let token = app.auth.token();
    let initial = json!({ "boardID": board_id, "ticketID": ticket_id });
    let path = format!("/boards/{board_id}/tickets/{ticket_id}");
    let board_id = board_id.to_owned();
    let ticket_id = ticket_id.to_owned();
    let operation = async move {
        let token = require(token)?;
        api.request(Method::DELETE, &path, Some(&token), None).await?;
        Ok(json!({ "boardID": board_id, "ticketID": ticket_id }))
    };
    builder::build(app, Op::RemoveTicket, initial, operation).await
}

fn require(token: Option<String>) -> Result<String, OpError> {
    token.ok_or_else(|| OpError::invalid("no session token"))
}

fn response_token(auth: &Value) -> Result<String, OpError> {
    auth.get("token")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| OpError::invalid("login response carried no token"))
}
