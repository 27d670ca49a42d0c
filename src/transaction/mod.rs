//! Transaction management for the allowance ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and aggregating transactions
//! - The shared form validation used by the create and edit endpoints
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod new_transaction_page;

pub use core::{
    DATE_TIME_FORMAT, Movement, Transaction, TransactionBuilder, TransactionId,
    create_transaction, create_transaction_table, delete_all_transactions, delete_transaction,
    fetch_balance, fetch_category_totals, fetch_transactions_by_month, get_transaction,
    month_bounds, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use form::{
    ALLOWANCE_LABEL, TransactionFormData, ValidatedTransaction, ValidationError,
    validate_transaction,
};
pub use new_transaction_page::get_new_transaction_page;
