//! This file defines the routes for displaying the log-in page and handling
//! log-in requests. The auth module handles the lower level cookie logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        log_in_register,
    },
    user::{User, get_user_by_username},
};

/// Shown when the username or password field is empty.
pub const EMPTY_FIELDS_ERROR_MSG: &str = "ユーザー名とパスワードを入力してください。";

/// Shown when the username is unknown or the password does not match.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "ユーザー名またはパスワードが正しくありません。";

/// The state needed to perform a log in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The username and password are stored as plain strings. There is no need
/// for validation here since they will be compared against the username and
/// password hash in the database.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    #[serde(default)]
    pub username: String,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    log_in_page_view("", None).into_response()
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the home page. Otherwise, the page is returned with an error
/// message explaining the problem and the submitted username echoed back.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() || user_data.password.is_empty() {
        return log_in_page_view(username, Some(EMPTY_FIELDS_ERROR_MSG)).into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user: User = match get_user_by_username(username, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return log_in_page_view(username, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return error.into_response();
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    if !is_password_valid {
        return log_in_page_view(username, Some(INVALID_CREDENTIALS_ERROR_MSG)).into_response();
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration);

    (jar, Redirect::to(endpoints::ROOT)).into_response()
}

fn log_in_page_view(username: &str, error_message: Option<&str>) -> Markup {
    let form = log_in_form_view(username, error_message);
    let content = log_in_register("ログイン", &form);

    base("ログイン", &[], &content)
}

fn log_in_form_view(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::LOG_IN_VIEW) class="space-y-4 md:space-y-6" {
            div {
                label for="username" class=(FORM_LABEL_STYLE) { "ユーザー名" }

                input
                    id="username"
                    type="text"
                    name="username"
                    value=(username)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="password" class=(FORM_LABEL_STYLE) { "パスワード" }

                input
                    id="password"
                    type="password"
                    name="password"
                    placeholder="••••••••"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "ログイン" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "アカウントがない？ "

                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "とうろくする" }
            }
        }
    }
}
