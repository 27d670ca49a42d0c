//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::auth_guard,
    endpoints,
    history::get_history_page,
    home::get_home_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
    settings::{get_settings_page, settings_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_edit_transaction_page, get_new_transaction_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page).post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(register_user),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page).post(create_transaction_endpoint),
        )
        .route(endpoints::HISTORY_VIEW, get(get_history_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page).post(edit_transaction_endpoint),
        )
        .route(
            endpoints::DELETE_TRANSACTION,
            post(delete_transaction_endpoint),
        )
        .route(
            endpoints::SETTINGS_VIEW,
            get(get_settings_page).post(settings_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, endpoints};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "secret", "Asia/Tokyo")
            .expect("Could not create app state");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_in_page_is_reachable_without_auth() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn register_page_is_reachable_without_auth() {
        let server = get_test_server();

        server.get(endpoints::REGISTER_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_pages_redirect_anonymous_users_to_log_in() {
        let server = get_test_server();

        for route in [
            endpoints::ROOT,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::HISTORY_VIEW,
            endpoints::SETTINGS_VIEW,
        ] {
            let response = server.get(route).await;

            response.assert_status_see_other();
            assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
        }
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = get_test_server();

        server.get("/does-not-exist").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn register_log_in_round_trip_reaches_home() {
        let server = get_test_server();

        let register_form = [
            ("username", "alice"),
            ("password", "1234"),
            ("password_confirm", "1234"),
        ];
        let response = server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form)
            .await;
        response.assert_status_see_other();

        let log_in_form = [("username", "alice"), ("password", "1234")];
        let response = server.post(endpoints::LOG_IN_VIEW).form(&log_in_form).await;
        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);

        let auth_cookie = response.cookie(crate::auth::COOKIE_USER_ID);
        server
            .get(endpoints::ROOT)
            .add_cookie(auth_cookie)
            .await
            .assert_status_ok();
    }
}
