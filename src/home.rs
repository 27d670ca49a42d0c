//! The home page: the current balance and shortcuts to the other pages.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, PAGE_CONTAINER_STYLE, base, format_yen},
    navigation::NavBar,
    transaction::fetch_balance,
    user::UserID,
};

/// The state needed to render the home page.
#[derive(Debug, Clone)]
pub struct HomePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HomePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the home page with the user's current balance.
pub async fn get_home_page(
    State(state): State<HomePageState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let balance = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match fetch_balance(user_id, &connection) {
            Ok(balance) => balance,
            Err(error) => return error.into_response(),
        }
    };

    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE) {
            section class="w-full max-w-md text-center" {
                h1 class="text-lg font-medium text-gray-500 dark:text-gray-400 mb-2" {
                    "いまの残金"
                }

                p class="text-5xl font-bold mb-8" { (format_yen(balance)) }

                a href=(endpoints::NEW_TRANSACTION_VIEW) {
                    span class=(BUTTON_PRIMARY_STYLE) style="display: inline-block"
                    {
                        "きろくする"
                    }
                }
            }
        }
    };

    base("ホーム", &[], &content).into_response()
}
