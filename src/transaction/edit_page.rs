//! The page for editing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, base, format_yen},
    navigation::NavBar,
    transaction::{
        Movement, Transaction, TransactionFormData, TransactionId, fetch_balance,
        form::transaction_form_view, get_transaction,
    },
    user::UserID,
};

/// The state needed to render the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The balance the overdraft check compares against when editing: the current
/// balance with the transaction under edit backed out.
pub(crate) fn balance_excluding_transaction(balance: i64, transaction: &Transaction) -> i64 {
    match transaction.movement {
        Movement::Increase => balance - transaction.amount,
        Movement::Decrease => balance + transaction.amount,
    }
}

/// Render the page for editing a transaction.
///
/// A transaction id that does not exist or belongs to another user redirects
/// back to the history page.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
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

    let balance = match fetch_balance(user_id, &connection) {
        Ok(balance) => balance,
        Err(error) => return error.into_response(),
    };

    let categories = match get_all_categories(user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };

    edit_transaction_page_view(
        transaction_id,
        balance_excluding_transaction(balance, &transaction),
        &TransactionFormData::from_transaction(&transaction),
        &categories,
        None,
    )
    .into_response()
}

/// The full page markup, shared with the edit endpoint so a rejected form
/// re-renders with the error and the submitted values.
pub(crate) fn edit_transaction_page_view(
    transaction_id: TransactionId,
    balance_excluding_this: i64,
    form: &TransactionFormData,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::HISTORY_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction_id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction_id);
    let form = transaction_form_view(&edit_url, form, categories, error_message);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE) {
            h1 class="text-xl font-bold mb-4" { "きろくをへんしゅう" }

            p class="mb-4 text-gray-500 dark:text-gray-400" {
                "このきろくをのぞいた残金: "
                span class="font-semibold text-gray-900 dark:text-white" {
                    (format_yen(balance_excluding_this))
                }
            }

            (form)

            form method="post" action=(delete_url) class="mt-4" {
                button type="submit" class=(BUTTON_DELETE_STYLE) { "このきろくをさくじょ" }
            }
        }
    };

    base("へんしゅう", &[], &content)
}
