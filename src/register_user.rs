//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        log_in_register,
    },
    log_in::EMPTY_FIELDS_ERROR_MSG,
    user::create_user,
};

/// The minimum number of characters a password must have.
const PASSWORD_MIN_LENGTH: usize = 4;

/// Shown when the two password fields do not match.
pub const PASSWORD_MISMATCH_ERROR_MSG: &str = "パスワードが一致しません。";

/// Shown when the password is shorter than [PASSWORD_MIN_LENGTH].
pub const PASSWORD_TOO_SHORT_ERROR_MSG: &str = "パスワードは4文字以上にしてください。";

/// Shown when the username already belongs to another account.
pub const DUPLICATE_USERNAME_ERROR_MSG: &str = "このユーザー名は既に使用されています。";

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The desired username.
    #[serde(default)]
    pub username: String,
    /// The desired password.
    #[serde(default)]
    pub password: String,
    /// The password typed a second time.
    #[serde(default)]
    pub password_confirm: String,
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    register_page_view("", None).into_response()
}

/// Handler for registration requests via the POST method.
///
/// On success the client is redirected to the log-in page. Any problem with
/// the submitted form re-renders the page with an inline message and the
/// submitted username echoed back.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() || user_data.password.is_empty() {
        return register_page_view(username, Some(EMPTY_FIELDS_ERROR_MSG)).into_response();
    }

    if user_data.password != user_data.password_confirm {
        return register_page_view(username, Some(PASSWORD_MISMATCH_ERROR_MSG)).into_response();
    }

    if user_data.password.chars().count() < PASSWORD_MIN_LENGTH {
        return register_page_view(username, Some(PASSWORD_TOO_SHORT_ERROR_MSG)).into_response();
    }

    let password_hash =
        match PasswordHash::from_raw_password(&user_data.password, PasswordHash::DEFAULT_COST) {
            Ok(hash) => hash,
            Err(error) => {
                tracing::error!("an error occurred while hashing a password: {error}");
                return error.into_response();
            }
        };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_user(username, password_hash, &connection) {
        Ok(_) => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
        Err(Error::DuplicateUsername) => {
            register_page_view(username, Some(DUPLICATE_USERNAME_ERROR_MSG)).into_response()
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            error.into_response()
        }
    }
}

fn register_page_view(username: &str, error_message: Option<&str>) -> Markup {
    let form = register_form_view(username, error_message);
    let content = log_in_register("アカウントとうろく", &form);

    base("とうろく", &[], &content)
}

fn register_form_view(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::REGISTER_VIEW) class="space-y-4 md:space-y-6" {
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
                    minlength=(PASSWORD_MIN_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="password-confirm" class=(FORM_LABEL_STYLE) { "パスワード（かくにん）" }

                input
                    id="password-confirm"
                    type="password"
                    name="password_confirm"
                    placeholder="••••••••"
                    required
                    minlength=(PASSWORD_MIN_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "とうろくする" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "すでにアカウントがある？ "

                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "ログインする" }
            }
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        test_utils::{assert_body_contains_message, assert_redirect},
        user::get_user_by_username,
    };

    use super::{
        DUPLICATE_USERNAME_ERROR_MSG, PASSWORD_MISMATCH_ERROR_MSG, PASSWORD_TOO_SHORT_ERROR_MSG,
        RegisterForm, RegistrationState, register_user,
    };

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        RegistrationState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn post_register_form(
        state: RegistrationState,
        username: &str,
        password: &str,
        password_confirm: &str,
    ) -> axum::response::Response {
        let form = RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
            password_confirm: password_confirm.to_owned(),
        };

        register_user(State(state), Form(form)).await
    }

    #[tokio::test]
    async fn register_creates_user_and_redirects_to_log_in() {
        let state = get_test_state();

        let response = post_register_form(state.clone(), "alice", "1234", "1234").await;

        assert_redirect(&response, endpoints::LOG_IN_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("alice", &connection).expect("User was not created");
        assert!(user.password_hash.verify("1234").unwrap());
    }

    #[tokio::test]
    async fn register_fails_when_passwords_do_not_match() {
        let response = post_register_form(get_test_state(), "alice", "1234", "4321").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, PASSWORD_MISMATCH_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn register_fails_when_password_is_too_short() {
        let response = post_register_form(get_test_state(), "alice", "123", "123").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, PASSWORD_TOO_SHORT_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_username() {
        let state = get_test_state();
        post_register_form(state.clone(), "alice", "1234", "1234").await;

        let response = post_register_form(state, "alice", "5678", "5678").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, DUPLICATE_USERNAME_ERROR_MSG).await;
    }
}
