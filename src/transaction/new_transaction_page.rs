//! The page for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, format_yen},
    navigation::NavBar,
    transaction::{TransactionFormData, fetch_balance, form::transaction_form_view},
    user::UserID,
};

/// The state needed to render the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for recording a new transaction.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserID>,
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

    new_transaction_page_view(balance, &TransactionFormData::default(), &categories, None)
        .into_response()
}

/// The full page markup, shared with the create endpoint so a rejected form
/// re-renders with the error and the submitted values.
pub(crate) fn new_transaction_page_view(
    balance: i64,
    form: &TransactionFormData,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form = transaction_form_view(endpoints::NEW_TRANSACTION_VIEW, form, categories, error_message);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE) {
            p class="mb-4 text-gray-500 dark:text-gray-400" {
                "いまの残金: "
                span class="font-semibold text-gray-900 dark:text-white" { (format_yen(balance)) }
            }

            (form)
        }
    };

    base("きろく", &[], &content)
}

#[cfg(test)]
mod new_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_valid_html, create_test_user,
            must_get_form, parse_html_document,
        },
    };

    use super::{NewTransactionPageState, get_new_transaction_page};

    #[tokio::test]
    async fn render_page_with_category_options() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_test_user(&connection);
        let state = NewTransactionPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_transaction_page(State(state), Extension(user.id)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_eq!(
            form.value().attr("action"),
            Some(endpoints::NEW_TRANSACTION_VIEW)
        );
        assert_form_input(&form, "amount", "number");
        assert_form_submit_button(&form);

        let option_selector = scraper::Selector::parse("select[name=category] option").unwrap();
        let options: Vec<String> = form
            .select(&option_selector)
            .filter_map(|option| option.value().attr("value").map(str::to_owned))
            .collect();
        assert_eq!(options, ["food", "fun", "stationery", "oshikatsu", "other"]);
    }
}
