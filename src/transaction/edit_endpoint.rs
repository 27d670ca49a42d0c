//! Defines the endpoint for updating an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::get_all_categories,
    endpoints,
    history::history_month_url,
    transaction::{
        TransactionFormData, TransactionId, edit_page::balance_excluding_transaction,
        edit_page::edit_transaction_page_view, fetch_balance, get_transaction,
        update_transaction, validate_transaction,
    },
    user::UserID,
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a transaction.
///
/// The form runs through the same validation as the create endpoint, except
/// the overdraft check uses the balance with the transaction under edit
/// backed out. On success the client is redirected to the history page for
/// the month the transaction originally occurred in.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionFormData>,
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

    let balance = match fetch_balance(user_id, &connection) {
        Ok(balance) => balance,
        Err(error) => return error.into_response(),
    };
    let reference_balance = balance_excluding_transaction(balance, &transaction);

    let categories = match get_all_categories(user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };

    let validated = match validate_transaction(&form, reference_balance, &categories) {
        Ok(validated) => validated,
        Err(error) => {
            return edit_transaction_page_view(
                transaction_id,
                reference_balance,
                &form,
                &categories,
                Some(error.message()),
            )
            .into_response();
        }
    };

    if let Err(error) = update_transaction(
        user_id,
        transaction_id,
        validated.movement,
        validated.amount,
        validated.category.as_deref(),
        validated.memo.as_deref(),
        &connection,
    ) {
        tracing::error!("An unexpected error occurred while updating a transaction: {error}");
        return error.into_response();
    }

    Redirect::to(&history_month_url(transaction.occurred_at.date())).into_response()
}
