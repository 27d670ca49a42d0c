//! The transaction form: raw form data, the validation sequence shared by the
//! create and edit endpoints, and the maud form view both pages render.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    category::Category,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    transaction::{Movement, Transaction},
};

/// The label shown for transactions with no category (allowance income).
pub const ALLOWANCE_LABEL: &str = "おこづかい";

/// The category pre-selected when the form has no meaningful category yet.
const DEFAULT_FORM_CATEGORY: &str = "food";

/// Why a submitted transaction form was rejected.
///
/// These are user-correctable mistakes: the form is re-rendered with the
/// matching message and the submitted values echoed back, and nothing is
/// written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The amount field did not parse as an integer.
    NotANumber,
    /// The amount was zero or negative.
    NonPositiveAmount,
    /// The movement field was neither "increase" nor "decrease".
    InvalidMovement,
    /// A decrease was submitted without a category.
    MissingCategory,
    /// The submitted category is not in the user's category set.
    UnknownCategory,
    /// A decrease larger than the reference balance.
    InsufficientBalance,
}

impl ValidationError {
    /// The message shown inline next to the form.
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::NotANumber => "金額は数字で入力してね。",
            ValidationError::NonPositiveAmount => "金額は1円以上を入力してね。",
            ValidationError::InvalidMovement => "お金の動きを選んでね。",
            ValidationError::MissingCategory => "出金のときはカテゴリを選んでね。",
            ValidationError::UnknownCategory => "カテゴリの選択が正しくありません。",
            ValidationError::InsufficientBalance => "残金より大きい出金はできません。",
        }
    }
}

/// The raw data submitted by the transaction form.
///
/// Everything is kept as submitted so a rejected form can echo the user's
/// input back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFormData {
    /// The amount as typed, not yet parsed.
    #[serde(default)]
    pub amount: String,
    /// The movement radio value as submitted.
    #[serde(default)]
    pub movement: String,
    /// The selected category id, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// The memo as typed.
    #[serde(default)]
    pub memo: String,
}

impl Default for TransactionFormData {
    fn default() -> Self {
        Self {
            amount: String::new(),
            movement: Movement::Increase.as_str().to_owned(),
            category: None,
            memo: String::new(),
        }
    }
}

impl TransactionFormData {
    /// Pre-fill the form with an existing transaction for the edit page.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            amount: transaction.amount.to_string(),
            movement: transaction.movement.as_str().to_owned(),
            category: transaction.category.clone(),
            memo: transaction.memo.clone().unwrap_or_default(),
        }
    }
}

/// A transaction form that passed validation and is safe to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransaction {
    /// Whether money came in or went out.
    pub movement: Movement,
    /// The amount in yen, guaranteed positive.
    pub amount: i64,
    /// The category id. Always `Some` for decreases, always `None` for
    /// increases regardless of what was submitted.
    pub category: Option<String>,
    /// The trimmed memo, `None` when left empty.
    pub memo: Option<String>,
}

/// Run the validation sequence shared by the create and edit endpoints.
///
/// `reference_balance` is the current balance for a new transaction, or the
/// balance excluding the transaction under edit. `categories` must be the
/// user's effective category set, fetched fresh.
///
/// # Errors
/// Returns the first [ValidationError] in the sequence that applies.
pub fn validate_transaction(
    form: &TransactionFormData,
    reference_balance: i64,
    categories: &[Category],
) -> Result<ValidatedTransaction, ValidationError> {
    let amount: i64 = form
        .amount
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber)?;

    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount);
    }

    let movement = Movement::parse(&form.movement).ok_or(ValidationError::InvalidMovement)?;

    let category = match movement {
        // An increase is always unattributed allowance income.
        Movement::Increase => None,
        Movement::Decrease => {
            let category = form
                .category
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or(ValidationError::MissingCategory)?;

            if !categories.iter().any(|known| known.id == category) {
                return Err(ValidationError::UnknownCategory);
            }

            if amount > reference_balance {
                return Err(ValidationError::InsufficientBalance);
            }

            Some(category.to_owned())
        }
    };

    let memo = form.memo.trim();
    let memo = (!memo.is_empty()).then(|| memo.to_owned());

    Ok(ValidatedTransaction {
        movement,
        amount,
        category,
        memo,
    })
}

/// The transaction form shared by the create and edit pages.
///
/// `action` is the URL the form posts back to.
pub(crate) fn transaction_form_view(
    action: &str,
    form: &TransactionFormData,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let selected_category = form
        .category
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_FORM_CATEGORY);

    html! {
        form method="post" action=(action) class="w-full space-y-4 md:space-y-6" {
            div class=(FORM_RADIO_GROUP_STYLE) {
                label class=(FORM_RADIO_LABEL_STYLE) {
                    input
                        type="radio"
                        name="movement"
                        value="increase"
                        checked[form.movement == "increase"]
                        class=(FORM_RADIO_INPUT_STYLE);
                    span class="ml-2" { "もらった（入金）" }
                }

                label class=(FORM_RADIO_LABEL_STYLE) {
                    input
                        type="radio"
                        name="movement"
                        value="decrease"
                        checked[form.movement == "decrease"]
                        class=(FORM_RADIO_INPUT_STYLE);
                    span class="ml-2" { "つかった（出金）" }
                }
            }

            div {
                label for="amount" class=(FORM_LABEL_STYLE) { "金額（円）" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    value=(form.amount)
                    placeholder="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="category" class=(FORM_LABEL_STYLE) { "カテゴリ（出金のとき）" }

                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE) {
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[category.id == selected_category]
                        {
                            (category.label)
                        }
                    }
                }
            }

            div {
                label for="memo" class=(FORM_LABEL_STYLE) { "メモ" }

                input
                    id="memo"
                    type="text"
                    name="memo"
                    value=(form.memo)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "きろくする" }
        }
    }
}

#[cfg(test)]
mod validate_transaction_tests {
    use crate::{
        category::Category,
        transaction::{Movement, TransactionFormData, ValidationError, validate_transaction},
    };

    fn food_category() -> Vec<Category> {
        vec![Category {
            id: "food".to_owned(),
            user_id: None,
            label: "食べ物".to_owned(),
            display_order: 0,
        }]
    }

    fn decrease_form(amount: &str, category: Option<&str>) -> TransactionFormData {
        TransactionFormData {
            amount: amount.to_owned(),
            movement: "decrease".to_owned(),
            category: category.map(str::to_owned),
            memo: String::new(),
        }
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let form = decrease_form("abc", Some("food"));

        let result = validate_transaction(&form, 1000, &food_category());

        assert_eq!(result, Err(ValidationError::NotANumber));
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        for amount in ["0", "-1"] {
            let form = decrease_form(amount, Some("food"));

            let result = validate_transaction(&form, 1000, &food_category());

            assert_eq!(result, Err(ValidationError::NonPositiveAmount));
        }
    }

    #[test]
    fn rejects_unknown_movement() {
        let form = TransactionFormData {
            amount: "100".to_owned(),
            movement: "sideways".to_owned(),
            category: None,
            memo: String::new(),
        };

        let result = validate_transaction(&form, 1000, &food_category());

        assert_eq!(result, Err(ValidationError::InvalidMovement));
    }

    #[test]
    fn rejects_decrease_without_category() {
        for category in [None, Some("")] {
            let form = decrease_form("100", category);

            let result = validate_transaction(&form, 1000, &food_category());

            assert_eq!(result, Err(ValidationError::MissingCategory));
        }
    }

    #[test]
    fn rejects_decrease_with_unknown_category() {
        let form = decrease_form("100", Some("yachts"));

        let result = validate_transaction(&form, 1000, &food_category());

        assert_eq!(result, Err(ValidationError::UnknownCategory));
    }

    #[test]
    fn rejects_decrease_larger_than_reference_balance() {
        let form = decrease_form("1001", Some("food"));

        let result = validate_transaction(&form, 1000, &food_category());

        assert_eq!(result, Err(ValidationError::InsufficientBalance));
    }

    #[test]
    fn accepts_decrease_equal_to_reference_balance() {
        let form = decrease_form("1000", Some("food"));

        let validated = validate_transaction(&form, 1000, &food_category()).unwrap();

        assert_eq!(validated.movement, Movement::Decrease);
        assert_eq!(validated.amount, 1000);
        assert_eq!(validated.category.as_deref(), Some("food"));
    }

    #[test]
    fn increase_ignores_submitted_category_and_balance() {
        let form = TransactionFormData {
            amount: "5000".to_owned(),
            movement: "increase".to_owned(),
            category: Some("food".to_owned()),
            memo: "  おとしだま  ".to_owned(),
        };

        let validated = validate_transaction(&form, 0, &food_category()).unwrap();

        assert_eq!(validated.movement, Movement::Increase);
        assert_eq!(validated.category, None);
        assert_eq!(validated.memo.as_deref(), Some("おとしだま"));
    }

    #[test]
    fn empty_memo_becomes_none() {
        let form = TransactionFormData {
            amount: "100".to_owned(),
            movement: "increase".to_owned(),
            category: None,
            memo: "   ".to_owned(),
        };

        let validated = validate_transaction(&form, 0, &food_category()).unwrap();

        assert_eq!(validated.memo, None);
    }
}
