//! Defines the endpoint that dispatches the settings page's form actions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{add_category, delete_category, delete_owned_categories, update_category},
    endpoints,
    transaction::delete_all_transactions,
    user::UserID,
};

/// The state needed to apply settings actions.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data submitted by the settings page's forms.
///
/// `action` selects the operation; the other fields are only meaningful for
/// the category actions.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A route handler for the settings actions.
///
/// - `reset_all` deletes the user's transactions and personal categories in
///   one SQL transaction, then redirects to the home page.
/// - `add_category` appends a personal category, silently ignoring a
///   duplicate id.
/// - `update_category` renames a personal category; shared categories are
///   unaffected.
/// - `delete_category` removes a personal category, reassigning its
///   transactions to "other".
///
/// Every category action (and an unknown or missing action) redirects back to
/// the settings page.
pub async fn settings_endpoint(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match form.action.as_deref() {
        Some("reset_all") => {
            if let Err(error) = reset_all_data(user_id, &connection) {
                tracing::error!("An unexpected error occurred while resetting data: {error}");
                return error.into_response();
            }

            Redirect::to(endpoints::ROOT).into_response()
        }
        Some("add_category") => {
            let category_id = form.category_id.as_deref().unwrap_or("").trim();
            let label = form.label.as_deref().unwrap_or("").trim();

            if !category_id.is_empty() && !label.is_empty() {
                match add_category(user_id, category_id, label, &connection) {
                    // An existing id is silently kept.
                    Ok(_) | Err(Error::DuplicateCategory) => {}
                    Err(error) => {
                        tracing::error!(
                            "An unexpected error occurred while adding a category: {error}"
                        );
                        return error.into_response();
                    }
                }
            }

            Redirect::to(endpoints::SETTINGS_VIEW).into_response()
        }
        Some("update_category") => {
            let category_id = form.category_id.as_deref().unwrap_or("").trim();
            let label = form.label.as_deref().unwrap_or("").trim();

            if !category_id.is_empty() && !label.is_empty() {
                if let Err(error) = update_category(user_id, category_id, label, &connection) {
                    tracing::error!(
                        "An unexpected error occurred while renaming a category: {error}"
                    );
                    return error.into_response();
                }
            }

            Redirect::to(endpoints::SETTINGS_VIEW).into_response()
        }
        Some("delete_category") => {
            let category_id = form.category_id.as_deref().unwrap_or("").trim();

            if !category_id.is_empty() {
                if let Err(error) = delete_category(user_id, category_id, &connection) {
                    tracing::error!(
                        "An unexpected error occurred while deleting a category: {error}"
                    );
                    return error.into_response();
                }
            }

            Redirect::to(endpoints::SETTINGS_VIEW).into_response()
        }
        _ => Redirect::to(endpoints::SETTINGS_VIEW).into_response(),
    }
}

/// Delete the user's transactions and personal categories in one SQL
/// transaction. Shared categories are untouched.
fn reset_all_data(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    delete_all_transactions(user_id, &sql_transaction)?;
    delete_owned_categories(user_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod settings_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        category::{add_category, get_all_categories, get_category},
        db::initialize,
        endpoints,
        test_utils::{assert_redirect, create_test_user},
        transaction::{Movement, Transaction, create_transaction, fetch_balance},
        user::User,
    };

    use super::{SettingsForm, SettingsState, settings_endpoint};

    fn get_test_state() -> (SettingsState, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_test_user(&connection);

        (
            SettingsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    fn form(
        action: Option<&str>,
        category_id: Option<&str>,
        label: Option<&str>,
    ) -> Form<SettingsForm> {
        Form(SettingsForm {
            action: action.map(str::to_owned),
            category_id: category_id.map(str::to_owned),
            label: label.map(str::to_owned),
        })
    }

    #[tokio::test]
    async fn add_category_action_appends_and_redirects() {
        let (state, user) = get_test_state();

        let response = settings_endpoint(
            State(state.clone()),
            Extension(user.id),
            form(Some("add_category"), Some("travel"), Some("旅行")),
        )
        .await;

        assert_redirect(&response, endpoints::SETTINGS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_category(user.id, "travel", &connection).unwrap().label,
            "旅行"
        );
    }

    #[tokio::test]
    async fn duplicate_add_category_is_silently_ignored() {
        let (state, user) = get_test_state();

        settings_endpoint(
            State(state.clone()),
            Extension(user.id),
            form(Some("add_category"), Some("travel"), Some("旅行")),
        )
        .await;
        let response = settings_endpoint(
            State(state.clone()),
            Extension(user.id),
            form(Some("add_category"), Some("travel"), Some("旅")),
        )
        .await;

        assert_redirect(&response, endpoints::SETTINGS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(user.id, &connection).unwrap();
        assert_eq!(categories.len(), 6);
        // The first label wins.
        assert_eq!(
            get_category(user.id, "travel", &connection).unwrap().label,
            "旅行"
        );
    }

    #[tokio::test]
    async fn update_category_action_cannot_rename_shared_category() {
        let (state, user) = get_test_state();

        let response = settings_endpoint(
            State(state.clone()),
            Extension(user.id),
            form(Some("update_category"), Some("food"), Some("ごはん")),
        )
        .await;

        assert_redirect(&response, endpoints::SETTINGS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_category(user.id, "food", &connection).unwrap().label,
            "食べ物"
        );
    }

    #[tokio::test]
    async fn reset_all_action_clears_only_this_users_data() {
        let (state, user_a) = get_test_state();
        let user_b = {
            let connection = state.db_connection.lock().unwrap();
            let user_b = create_test_user(&connection);

            add_category(user_a.id, "travel", "旅行", &connection).unwrap();
            create_transaction(
                Transaction::build(
                    user_a.id,
                    Movement::Increase,
                    1000,
                    datetime!(2024-06-15 12:00:00),
                ),
                &connection,
            )
            .unwrap();
            create_transaction(
                Transaction::build(
                    user_b.id,
                    Movement::Increase,
                    500,
                    datetime!(2024-06-15 12:00:00),
                ),
                &connection,
            )
            .unwrap();

            user_b
        };

        let response = settings_endpoint(
            State(state.clone()),
            Extension(user_a.id),
            form(Some("reset_all"), None, None),
        )
        .await;

        assert_redirect(&response, endpoints::ROOT);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(fetch_balance(user_a.id, &connection), Ok(0));
        assert_eq!(fetch_balance(user_b.id, &connection), Ok(500));

        let categories = get_all_categories(user_a.id, &connection).unwrap();
        assert_eq!(categories.len(), 5, "shared categories must survive");
    }

    #[tokio::test]
    async fn unknown_action_redirects_to_settings() {
        let (state, user) = get_test_state();

        let response = settings_endpoint(
            State(state),
            Extension(user.id),
            form(Some("explode"), None, None),
        )
        .await;

        assert_redirect(&response, endpoints::SETTINGS_VIEW);
    }

    #[tokio::test]
    async fn missing_action_redirects_to_settings() {
        let (state, user) = get_test_state();

        let response = settings_endpoint(State(state), Extension(user.id), form(None, None, None)).await;

        assert_redirect(&response, endpoints::SETTINGS_VIEW);
    }
}
