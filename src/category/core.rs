//! Defines the category model and database queries for shared and personal
//! categories.
//!
//! A user's effective category set is the union of the shared rows
//! (`user_id IS NULL`) and the rows they own, ordered by
//! `(display_order, id)`. Shared rows are never matched by the per-user
//! mutation queries, which is what makes them immutable.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

/// The category id that absorbs transactions whose own category is deleted.
pub const FALLBACK_CATEGORY_ID: &str = "other";

/// The shared categories seeded into a fresh database, in display order.
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("food", "食べ物"),
    ("fun", "遊び"),
    ("stationery", "文具"),
    ("oshikatsu", "推し活"),
    ("other", "その他"),
];

/// A spending category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The short identifier used by transactions, e.g. "food".
    pub id: String,
    /// The owner, or `None` for a shared category visible to all users.
    pub user_id: Option<UserID>,
    /// The label shown in forms and on the history page.
    pub label: String,
    /// Position within the user's category list.
    pub display_order: i64,
}

impl Category {
    /// Whether this category is part of the shared default set.
    pub fn is_shared(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Create the category table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id TEXT NOT NULL,
                user_id INTEGER,
                label TEXT NOT NULL,
                display_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE(id, user_id)
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default shared categories if no shared category exists yet.
///
/// Safe to call on every start-up: an already seeded (or otherwise populated)
/// table is left untouched.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn seed_default_categories(connection: &Connection) -> Result<(), Error> {
    let shared_count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM category WHERE user_id IS NULL",
        [],
        |row| row.get(0),
    )?;

    if shared_count > 0 {
        return Ok(());
    }

    for (display_order, (id, label)) in DEFAULT_CATEGORIES.iter().enumerate() {
        connection.execute(
            "INSERT INTO category (id, user_id, label, display_order) VALUES (?1, NULL, ?2, ?3)",
            (id, label, display_order as i64),
        )?;
    }

    Ok(())
}

/// Retrieve the user's effective category set: shared categories plus the
/// categories they own, ordered by `(display_order, id)`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, label, display_order FROM category
             WHERE user_id IS NULL OR user_id = :user_id
             ORDER BY display_order, id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a single category from the user's effective set.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` is neither shared nor owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    user_id: UserID,
    category_id: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, label, display_order FROM category
             WHERE id = ?1 AND (user_id IS NULL OR user_id = ?2)",
        )?
        .query_row((category_id, user_id.as_i64()), map_category_row)
        .map_err(|error| error.into())
}

/// Append a personal category to the end of the user's category list.
///
/// The new category's `display_order` is one greater than the maximum across
/// the user's effective set.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategory] if `category_id` already exists in the user's
///   effective set (callers are expected to ignore this silently),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_category(
    user_id: UserID,
    category_id: &str,
    label: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    if get_category(user_id, category_id, connection).is_ok() {
        return Err(Error::DuplicateCategory);
    }

    let max_order: i64 = connection.query_row(
        "SELECT COALESCE(MAX(display_order), -1) FROM category
         WHERE user_id IS NULL OR user_id = :user_id",
        &[(":user_id", &user_id.as_i64())],
        |row| row.get(0),
    )?;

    let display_order = max_order + 1;

    connection.execute(
        "INSERT INTO category (id, user_id, label, display_order) VALUES (?1, ?2, ?3, ?4)",
        (category_id, user_id.as_i64(), label, display_order),
    )?;

    Ok(Category {
        id: category_id.to_owned(),
        user_id: Some(user_id),
        label: label.to_owned(),
        display_order,
    })
}

/// Rename a category owned by `user_id`.
///
/// Shared categories are never matched by this query, so they cannot be
/// renamed by any user. A category id that is not owned by the user is a
/// silent no-op.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn update_category(
    user_id: UserID,
    category_id: &str,
    new_label: &str,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE category SET label = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_label, category_id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Delete a category owned by `user_id`, reassigning the user's transactions
/// that reference it to [FALLBACK_CATEGORY_ID].
///
/// Both writes happen in one SQL transaction. Shared categories and
/// categories owned by other users are a silent no-op and no transaction is
/// reassigned.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_category(
    user_id: UserID,
    category_id: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let rows_affected = sql_transaction.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        // Not owned by this user: dropping the transaction rolls back.
        return Ok(());
    }

    sql_transaction.execute(
        "UPDATE \"transaction\" SET category = ?1 WHERE user_id = ?2 AND category = ?3",
        (FALLBACK_CATEGORY_ID, user_id.as_i64(), category_id),
    )?;

    sql_transaction.commit()?;

    Ok(())
}

/// Delete every personal category owned by `user_id`, leaving shared
/// categories untouched.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_owned_categories(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM category WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id: Option<i64> = row.get(1)?;
    let label = row.get(2)?;
    let display_order = row.get(3)?;

    Ok(Category {
        id,
        user_id: raw_user_id.map(UserID::new),
        label,
        display_order,
    })
}
