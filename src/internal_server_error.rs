//! The 500 page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Build the 500 response shown when an unexpected error occurs.
pub fn get_internal_server_error_response() -> Response {
    let page = error_view(
        "サーバーエラー",
        "500",
        "サーバーでエラーがおきました",
        "しばらくしてからもういちどためしてね。",
    );

    (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
}
