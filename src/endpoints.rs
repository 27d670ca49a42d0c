//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transaction/{transaction_id}/edit',
//! use [format_endpoint].

/// The home page showing the current balance.
pub const ROOT: &str = "/";
/// The page (and form target) for recording a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transaction";
/// The monthly history page. Takes an optional `month=YYYY-MM` query parameter.
pub const HISTORY_VIEW: &str = "/history";
/// The page (and form target) for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transaction/{transaction_id}/edit";
/// The form target for deleting a transaction.
pub const DELETE_TRANSACTION: &str = "/transaction/{transaction_id}/delete";
/// The settings page for categories and the reset action.
pub const SETTINGS_VIEW: &str = "/settings";
/// The route for the log in page and log in form submissions.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for the registration page and registration form submissions.
pub const REGISTER_VIEW: &str = "/register";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
