//! Helpers shared by the crate's tests: database fixtures and HTML/response
//! assertions.

mod html;

pub(crate) use html::{
    assert_body_contains_message, assert_form_input, assert_form_submit_button, assert_redirect,
    assert_valid_html, must_get_form, parse_html_document,
};

use rusqlite::Connection;

use crate::{
    PasswordHash,
    user::{User, create_user},
};

/// Insert a test user with a unique username and return it.
///
/// The stored hash is a placeholder; tests that verify passwords create
/// their own users with a real hash.
pub(crate) fn create_test_user(connection: &Connection) -> User {
    let user_count: i64 = connection
        .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
        .expect("Could not count users");

    let username = format!("test_user_{}", user_count + 1);

    create_user(
        &username,
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
}
