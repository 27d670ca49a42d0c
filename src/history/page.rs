//! The monthly history page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    category::get_all_categories,
    endpoints::{self, format_endpoint},
    history::chart::{ECHARTS_SCRIPT_URL, category_spending_chart, chart_script, chart_view},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_yen,
    },
    navigation::NavBar,
    timezone::local_now,
    transaction::{
        ALLOWANCE_LABEL, Transaction, fetch_category_totals, fetch_transactions_by_month,
    },
    user::UserID,
};

const DISPLAY_DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[month]/[day]");

/// The state needed to render the history page.
#[derive(Debug, Clone)]
pub struct HistoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for HistoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The optional query parameters of the history page.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// The month to display as `YYYY-MM`.
    #[serde(default)]
    pub month: Option<String>,
}

/// The URL of the history page for the month containing `date`.
pub fn history_month_url(date: Date) -> String {
    format!(
        "{}?month={:04}-{:02}",
        endpoints::HISTORY_VIEW,
        date.year(),
        u8::from(date.month())
    )
}

/// Parse a `YYYY-MM` month string into the first day of that month.
fn parse_month(raw: &str) -> Option<Date> {
    let (raw_year, raw_month) = raw.split_once('-')?;
    let year: i32 = raw_year.parse().ok()?;
    let month = Month::try_from(raw_month.parse::<u8>().ok()?).ok()?;

    Date::from_calendar_date(year, month, 1).ok()
}

/// One row of the history table.
struct HistoryEntry {
    display_date: String,
    sign: char,
    amount: i64,
    category_label: String,
    memo: String,
    edit_url: String,
}

impl HistoryEntry {
    fn new(transaction: Transaction, labels_by_id: &HashMap<&str, &str>) -> Self {
        let category_label = match &transaction.category {
            // An unattributed transaction is allowance income.
            None => ALLOWANCE_LABEL.to_owned(),
            Some(id) => labels_by_id.get(id.as_str()).unwrap_or(&"その他").to_string(),
        };

        Self {
            display_date: transaction
                .occurred_at
                .format(DISPLAY_DATE_FORMAT)
                .unwrap_or_default(),
            sign: transaction.movement.sign(),
            amount: transaction.amount,
            category_label,
            memo: transaction.memo.unwrap_or_default(),
            edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
        }
    }
}

/// Render the history page for the requested month.
///
/// A missing or malformed `month` query parameter falls back to the current
/// month rather than showing an error.
pub async fn get_history_page(
    State(state): State<HistoryPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let current_month = local_now(&state.local_timezone)
        .map(|now| now.date())
        .and_then(|today| today.replace_day(1).ok());

    let selected_month = match query
        .month
        .as_deref()
        .and_then(parse_month)
        .or(current_month)
    {
        Some(month) => month,
        None => {
            tracing::error!("invalid timezone {}", state.local_timezone);
            return Error::InvalidDateFormat(
                "invalid timezone".to_owned(),
                state.local_timezone.clone(),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let transactions = match fetch_transactions_by_month(user_id, selected_month, &connection) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    let categories = match get_all_categories(user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };

    let totals = match fetch_category_totals(user_id, selected_month, &connection) {
        Ok(totals) => totals,
        Err(error) => return error.into_response(),
    };

    let labels_by_id: HashMap<&str, &str> = categories
        .iter()
        .map(|category| (category.id.as_str(), category.label.as_str()))
        .collect();
    let entries: Vec<HistoryEntry> = transactions
        .into_iter()
        .map(|transaction| HistoryEntry::new(transaction, &labels_by_id))
        .collect();

    let chart_labels: Vec<String> = categories
        .iter()
        .map(|category| category.label.clone())
        .collect();
    let chart_values: Vec<i64> = categories
        .iter()
        .map(|category| totals.get(&category.id).copied().unwrap_or(0))
        .collect();
    let chart = category_spending_chart(chart_labels, chart_values);

    history_page_view(selected_month, &entries, &chart).into_response()
}

fn history_page_view(
    selected_month: Date,
    entries: &[HistoryEntry],
    chart: &charming::Chart,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::HISTORY_VIEW).into_html();
    let month_value = format!(
        "{:04}-{:02}",
        selected_month.year(),
        u8::from(selected_month.month())
    );
    let month_heading = format!(
        "{}年{}月",
        selected_month.year(),
        u8::from(selected_month.month())
    );

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE) {
            h1 class="text-xl font-bold mb-4" { (month_heading) "のりれき" }

            form method="get" action=(endpoints::HISTORY_VIEW) class="flex gap-2 items-center mb-6" {
                input
                    type="month"
                    name="month"
                    value=(month_value)
                    class=(FORM_TEXT_INPUT_STYLE);

                button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" {
                    "ひょうじ"
                }
            }

            (chart_view())

            @if entries.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "このつきのきろくはありません。" }
            } @else {
                table class="w-full max-w-2xl text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            th class=(TABLE_CELL_STYLE) { "日づけ" }
                            th class=(TABLE_CELL_STYLE) { "金額" }
                            th class=(TABLE_CELL_STYLE) { "カテゴリ" }
                            th class=(TABLE_CELL_STYLE) { "メモ" }
                            th class=(TABLE_CELL_STYLE) {}
                        }
                    }

                    tbody {
                        @for entry in entries {
                            tr class=(TABLE_ROW_STYLE) {
                                td class=(TABLE_CELL_STYLE) { (entry.display_date) }
                                td class=(TABLE_CELL_STYLE) {
                                    (entry.sign) (format_yen(entry.amount))
                                }
                                td class=(TABLE_CELL_STYLE) { (entry.category_label) }
                                td class=(TABLE_CELL_STYLE) { (entry.memo) }
                                td class=(TABLE_CELL_STYLE) {
                                    a href=(entry.edit_url) class=(LINK_STYLE) { "へんしゅう" }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base(
        "りれき",
        &[
            HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
            chart_script(chart),
        ],
        &content,
    )
}



#[cfg(test)]
mod history_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        test_utils::{assert_body_contains_message, create_test_user},
        transaction::{ALLOWANCE_LABEL, Movement, Transaction, create_transaction},
        user::User,
    };

    use super::{HistoryPageState, HistoryQuery, get_history_page};

    fn get_test_state() -> (HistoryPageState, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_test_user(&connection);

        (
            HistoryPageState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Asia/Tokyo".to_owned(),
            },
            user,
        )
    }

    fn month_query(month: Option<&str>) -> Query<HistoryQuery> {
        Query(HistoryQuery {
            month: month.map(str::to_owned),
        })
    }

    #[tokio::test]
    async fn history_lists_transactions_with_resolved_labels() {
        let (state, user) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user.id,
                    Movement::Increase,
                    1000,
                    datetime!(2024-06-01 10:00:00),
                ),
                &connection,
            )
            .unwrap();
            create_transaction(
                Transaction::build(
                    user.id,
                    Movement::Decrease,
                    300,
                    datetime!(2024-06-02 10:00:00),
                )
                .category(Some("food".to_owned()))
                .memo(Some("おやつ".to_owned())),
                &connection,
            )
            .unwrap();
        }

        let response =
            get_history_page(State(state), Extension(user.id), month_query(Some("2024-06")))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        assert!(text.contains(ALLOWANCE_LABEL), "missing allowance label");
        assert!(text.contains("食べ物"), "missing category label");
        assert!(text.contains("おやつ"), "missing memo");
        assert!(text.contains("06/01"), "missing display date");
    }

    #[tokio::test]
    async fn history_with_malformed_month_falls_back_to_current_month() {
        let (state, user) = get_test_state();

        let response =
            get_history_page(State(state), Extension(user.id), month_query(Some("garbage")))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, "のりれき").await;
    }

    #[tokio::test]
    async fn history_with_no_month_uses_current_month() {
        let (state, user) = get_test_state();

        let response =
            get_history_page(State(state), Extension(user.id), month_query(None)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn history_excludes_other_months() {
        let (state, user) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user.id,
                    Movement::Decrease,
                    300,
                    datetime!(2024-05-31 23:59:59),
                )
                .category(Some("food".to_owned()))
                .memo(Some("5がつのきろく".to_owned())),
                &connection,
            )
            .unwrap();
        }

        let response =
            get_history_page(State(state), Extension(user.id), month_query(Some("2024-06")))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        assert!(
            !text.contains("5がつのきろく"),
            "May transaction should not appear in June"
        );
    }
}
