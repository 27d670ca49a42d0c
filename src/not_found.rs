//! The 404 page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// The fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Build the 404 response directly, for use outside of routing.
pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "みつかりません",
        "404",
        "ページがみつかりません",
        "アドレスをたしかめるか、ホームからやりなおしてね。",
    );

    (StatusCode::NOT_FOUND, page).into_response()
}
