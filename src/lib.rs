//! # teamboard-client
//!
//! Client-side core of the teamboard collaborative kanban board: a
//! unidirectional action/store layer, an async action builder bridging the
//! REST API, and a realtime socket client that keeps every viewer's stores
//! in step.
//!
//! Local user actions, asynchronous server responses, and inbound socket
//! events all converge on the same dispatcher, so the stores tolerate any
//! interleaving of optimistic and server-confirmed updates of the same
//! entity. Authentication failures surface as one cross-cutting action no
//! matter which path hit them.

pub mod action;
pub mod actions;
pub mod api;
pub mod app;
pub mod builder;
pub mod dispatcher;
pub mod model;
pub mod socket;
pub mod storage;
pub mod store;
pub mod wire;
