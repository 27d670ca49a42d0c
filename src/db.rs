//! Database schema initialization.

use rusqlite::Connection;

use crate::{
    Error,
    category::{create_category_table, seed_default_categories},
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables if they do not exist and seed the default
/// shared categories if no shared category exists yet.
///
/// Safe to call on every process start and on an already-populated database:
/// defaults are never duplicated and existing data is never destroyed.
///
/// # Errors
/// Returns an error if a table cannot be created or there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    create_user_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;
    create_category_table(&sql_transaction)?;
    seed_default_categories(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
