//! Spending categories: a shared default set plus per-user personal categories.

mod core;

pub use core::{
    Category, DEFAULT_CATEGORIES, FALLBACK_CATEGORY_ID, add_category, create_category_table,
    delete_category, delete_owned_categories, get_all_categories, get_category,
    seed_default_categories, update_category,
};
