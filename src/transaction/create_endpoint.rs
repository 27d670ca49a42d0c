//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::get_all_categories,
    endpoints,
    timezone::local_now,
    transaction::{
        Transaction, TransactionFormData, create_transaction, fetch_balance,
        new_transaction_page::new_transaction_page_view, validate_transaction,
    },
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone new transactions are stamped in.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// The form is validated against the user's current balance and category set;
/// a rejected form re-renders the page with the error message and the
/// submitted values, and nothing is written. On success the client is
/// redirected to the home page.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let balance = match fetch_balance(user_id, &connection) {
        Ok(balance) => balance,
        Err(error) => return error.into_response(),
    };

    let categories = match get_all_categories(user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };

    let validated = match validate_transaction(&form, balance, &categories) {
        Ok(validated) => validated,
        Err(error) => {
            return new_transaction_page_view(balance, &form, &categories, Some(error.message()))
                .into_response();
        }
    };

    let occurred_at = match local_now(&state.local_timezone) {
        Some(occurred_at) => occurred_at,
        None => {
            tracing::error!("invalid timezone {}", state.local_timezone);
            return Error::InvalidDateFormat(
                "invalid timezone".to_owned(),
                state.local_timezone.clone(),
            )
            .into_response();
        }
    };

    let builder = Transaction::build(user_id, validated.movement, validated.amount, occurred_at)
        .category(validated.category)
        .memo(validated.memo);

    if let Err(error) = create_transaction(builder, &connection) {
        tracing::error!("An unexpected error occurred while creating a transaction: {error}");
        return error.into_response();
    }

    Redirect::to(endpoints::ROOT).into_response()
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        endpoints,
        test_utils::{assert_body_contains_message, assert_redirect, create_test_user},
        transaction::{
            Movement, Transaction, TransactionFormData, ValidationError, create_transaction,
            fetch_balance,
        },
        user::User,
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_test_state() -> (CreateTransactionState, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_test_user(&connection);

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Asia/Tokyo".to_owned(),
            },
            user,
        )
    }

    fn form(amount: &str, movement: &str, category: Option<&str>) -> TransactionFormData {
        TransactionFormData {
            amount: amount.to_owned(),
            movement: movement.to_owned(),
            category: category.map(str::to_owned),
            memo: String::new(),
        }
    }

    #[tokio::test]
    async fn create_increase_redirects_home_and_updates_balance() {
        let (state, user) = get_test_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("1000", "increase", None)),
        )
        .await;

        assert_redirect(&response, endpoints::ROOT);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(fetch_balance(user.id, &connection), Ok(1000));
    }

    #[tokio::test]
    async fn create_decrease_requires_sufficient_balance() {
        let (state, user) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user.id,
                    Movement::Increase,
                    500,
                    datetime!(2024-06-15 12:00:00),
                ),
                &connection,
            )
            .unwrap();
        }

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("501", "decrease", Some("food"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, ValidationError::InsufficientBalance.message())
            .await;

        // The rejected decrease must not have been written.
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(fetch_balance(user.id, &connection), Ok(500));
    }

    #[tokio::test]
    async fn rejected_form_echoes_submitted_amount() {
        let (state, user) = get_test_state();

        let response = create_transaction_endpoint(
            State(state),
            Extension(user.id),
            Form(form("-5", "decrease", Some("food"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, "value=\"-5\"").await;
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let (state, user) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user.id,
                    Movement::Increase,
                    500,
                    datetime!(2024-06-15 12:00:00),
                ),
                &connection,
            )
            .unwrap();
        }

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("100", "decrease", Some("yachts"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, ValidationError::UnknownCategory.message()).await;
    }
}
