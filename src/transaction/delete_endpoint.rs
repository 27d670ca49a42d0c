//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    history::history_month_url,
    transaction::{TransactionId, delete_transaction, get_transaction},
    user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction.
///
/// Deleting an owned transaction redirects to the history page for the month
/// it occurred in. A transaction that does not exist or belongs to another
/// user is left untouched and the client is redirected to the history page.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let transaction = match get_transaction(user_id, transaction_id, &connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Redirect::to(endpoints::HISTORY_VIEW).into_response(),
        Err(error) => return error.into_response(),
    };

    if let Err(error) = delete_transaction(user_id, transaction_id, &connection) {
        tracing::error!("Could not delete transaction {transaction_id}: {error}");
        return error.into_response();
    }

    Redirect::to(&history_month_url(transaction.occurred_at.date())).into_response()
}
