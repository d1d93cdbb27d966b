//! Async action builder.
//!
//! Couples an optimistic action with the eventual outcome of an async
//! operation: the request action is dispatched on the next scheduler turn,
//! then exactly one of the derived success/failure actions — and the
//! success/failure never precedes the request. Unauthorized failures
//! additionally dispatch the cross-cutting authentication-failure action.

use serde_json::Value;

use crate::action::{Action, Op};
use crate::api::OpError;
use crate::app::App;
use crate::dispatcher::DispatchError;

/// Error returned by [`build`].
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The wrapped operation failed. The failure action has already been
    /// dispatched; this is purely a control-flow short-circuit for callers
    /// chaining further async steps.
    #[error("{} failed", .op.name())]
    Failed {
        op: Op,
        #[source]
        source: OpError,
    },
    /// An action could not be dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Runs `operation`, bracketing it with `Request(op)` and then exactly one
/// of `Success(op)` / `Failure(op)`.
///
/// The request dispatch is deferred one scheduler turn so creators may be
/// called from inside a store handler without tripping the dispatcher's
/// re-entrancy guard.
///
/// # Errors
///
/// [`ActionError::Failed`] when the operation failed (after the failure
/// action was dispatched); [`ActionError::Dispatch`] if the dispatcher
/// refused an action.
pub async fn build<F>(
    app: &App,
    op: Op,
    initial_payload: Value,
    operation: F,
) -> Result<(), ActionError>
where
    F: Future<Output = Result<Value, OpError>>,
{
    tokio::task::yield_now().await;
    app.dispatch(&Action::request(op, initial_payload))?;

    match operation.await {
        Ok(payload) => {
            app.dispatch(&Action::success(op, payload))?;
            Ok(())
        }
        Err(error) => {
            if error.is_unauthorized() {
                app.dispatch(&Action::authentication_failure())?;
            }
            app.dispatch(&Action::failure(op, error.payload()))?;
            Err(ActionError::Failed { op, source: error })
        }
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
