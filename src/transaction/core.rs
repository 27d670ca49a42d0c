//! Defines the core data model and database queries for transactions.
//!
//! Timestamps are stored as second-precision text
//! (`2024-12-31T23:59:59`) so that month range queries compare
//! lexicographically, and amounts are positive integer yen. The queries trust
//! their caller: validation (including the overdraft check) happens in the
//! request handlers before any write.

use std::collections::HashMap;

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::{
    Date, Month, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    Error,
    category::{FALLBACK_CATEGORY_ID, get_all_categories},
    user::UserID,
};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// The format transactions timestamps are stored in.
pub const DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// The direction money moved: into the allowance or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    /// Money received (allowance income). Never has a category.
    Increase,
    /// Money spent. Always has a category.
    Decrease,
}

impl Movement {
    /// The string stored in the database and submitted by forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::Increase => "increase",
            Movement::Decrease => "decrease",
        }
    }

    /// Parse a form or database value, returning `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "increase" => Some(Movement::Increase),
            "decrease" => Some(Movement::Decrease),
            _ => None,
        }
    }

    /// The sign shown next to amounts on the history page.
    pub fn sign(&self) -> char {
        match self {
            Movement::Increase => '+',
            Movement::Decrease => '-',
        }
    }
}

/// A single entry in a user's allowance ledger.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user this transaction belongs to.
    pub user_id: UserID,
    /// When the transaction happened.
    pub occurred_at: PrimitiveDateTime,
    /// Whether money came in or went out.
    pub movement: Movement,
    /// The amount of money in yen. Always positive; the direction is carried
    /// by `movement`.
    pub amount: i64,
    /// The spending category id. `None` for increases.
    pub category: Option<String>,
    /// An optional free-text note.
    pub memo: Option<String>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        movement: Movement,
        amount: i64,
        occurred_at: PrimitiveDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            movement,
            amount,
            occurred_at,
            category: None,
            memo: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The handlers pass in `occurred_at` as "now" in the configured timezone;
/// tests pass in fixed timestamps.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user the transaction will belong to.
    pub user_id: UserID,
    /// Whether money came in or went out.
    pub movement: Movement,
    /// The amount of money in yen.
    pub amount: i64,
    /// When the transaction happened.
    pub occurred_at: PrimitiveDateTime,
    /// The spending category id, required for decreases.
    pub category: Option<String>,
    /// An optional free-text note.
    pub memo: Option<String>,
}

impl TransactionBuilder {
    /// Set the category id for the transaction.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Set the memo for the transaction.
    pub fn memo(mut self, memo: Option<String>) -> Self {
        self.memo = memo;
        self
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                occurred_at TEXT NOT NULL,
                movement TEXT NOT NULL CHECK(movement IN ('increase', 'decrease')),
                amount INTEGER NOT NULL CHECK(amount > 0),
                category TEXT,
                memo TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Composite index used by the balance and history queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
         ON \"transaction\"(user_id, occurred_at);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDateFormat] if the timestamp cannot be formatted,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let occurred_at = builder
        .occurred_at
        .format(DATE_TIME_FORMAT)
        .map_err(|error| {
            Error::InvalidDateFormat(error.to_string(), builder.occurred_at.to_string())
        })?;

    connection.execute(
        "INSERT INTO \"transaction\" (user_id, occurred_at, movement, amount, category, memo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            builder.user_id.as_i64(),
            &occurred_at,
            builder.movement.as_str(),
            builder.amount,
            &builder.category,
            &builder.memo,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        user_id: builder.user_id,
        occurred_at: builder.occurred_at,
        movement: builder.movement,
        amount: builder.amount,
        category: builder.category,
        memo: builder.memo,
    })
}

/// Retrieve a transaction by its `id`, scoped to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, occurred_at, movement, amount, category, memo
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Overwrite the mutable fields of a transaction, scoped to `user_id`.
///
/// A transaction that does not exist or belongs to another user is a silent
/// no-op.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    movement: Movement,
    amount: i64,
    category: Option<&str>,
    memo: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE \"transaction\" SET movement = ?1, amount = ?2, category = ?3, memo = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            movement.as_str(),
            amount,
            category,
            memo,
            id,
            user_id.as_i64(),
        ),
    )?;

    Ok(())
}

/// Delete a transaction, scoped to `user_id`. Silent no-op if it does not
/// exist or belongs to another user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Delete every transaction belonging to `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_all_transactions(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;

    Ok(())
}

/// The user's current balance: increases minus decreases, `0` with no
/// transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn fetch_balance(user_id: UserID, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(CASE WHEN movement = 'increase' THEN amount ELSE -amount END), 0)
             FROM \"transaction\" WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The half-open timestamp range `[start, end)` covering the calendar month
/// that contains `month` (any day of the month works, the handlers pass the
/// first).
///
/// December rolls over into January of the next year.
pub fn month_bounds(month: Date) -> (String, String) {
    let (end_year, end_month) = match month.month() {
        Month::December => (month.year() + 1, 1),
        current => (month.year(), u8::from(current) + 1),
    };

    (
        format!(
            "{:04}-{:02}-01T00:00:00",
            month.year(),
            u8::from(month.month())
        ),
        format!("{end_year:04}-{end_month:02}-01T00:00:00"),
    )
}

/// All of the user's transactions in the given month, ascending by
/// `occurred_at`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn fetch_transactions_by_month(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (start, end) = month_bounds(month);

    connection
        .prepare(
            "SELECT id, user_id, occurred_at, movement, amount, category, memo
             FROM \"transaction\"
             WHERE user_id = ?1 AND occurred_at >= ?2 AND occurred_at < ?3
             ORDER BY occurred_at ASC",
        )?
        .query_map((user_id.as_i64(), &start, &end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// The user's spending per category for the given month.
///
/// Every category in the user's effective set gets an entry, `0` if unused
/// that month. Decrease rows with a null or unrecognized category id are
/// accumulated into [FALLBACK_CATEGORY_ID].
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn fetch_category_totals(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<HashMap<String, i64>, Error> {
    let mut totals: HashMap<String, i64> = get_all_categories(user_id, connection)?
        .into_iter()
        .map(|category| (category.id, 0))
        .collect();

    let (start, end) = month_bounds(month);

    let rows: Vec<(Option<String>, i64)> = connection
        .prepare(
            "SELECT category, SUM(amount) FROM \"transaction\"
             WHERE user_id = ?1 AND movement = 'decrease'
               AND occurred_at >= ?2 AND occurred_at < ?3
             GROUP BY category",
        )?
        .query_map((user_id.as_i64(), &start, &end), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<_, _>>()?;

    for (category, total) in rows {
        let key = match category {
            Some(id) if totals.contains_key(&id) => id,
            _ => FALLBACK_CATEGORY_ID.to_owned(),
        };

        *totals.entry(key).or_insert(0) += total;
    }

    Ok(totals)
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id: i64 = row.get(1)?;

    let raw_occurred_at: String = row.get(2)?;
    let occurred_at = PrimitiveDateTime::parse(&raw_occurred_at, DATE_TIME_FORMAT)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, error.into()))?;

    let raw_movement: String = row.get(3)?;
    let movement = Movement::parse(&raw_movement).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, raw_movement.into())
    })?;

    Ok(Transaction {
        id,
        user_id: UserID::new(raw_user_id),
        occurred_at,
        movement,
        amount: row.get(4)?,
        category: row.get(5)?,
        memo: row.get(6)?,
    })
}
