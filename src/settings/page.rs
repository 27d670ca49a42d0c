//! The settings page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed to render the settings page.
#[derive(Debug, Clone)]
pub struct SettingsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the settings page with the user's category list.
pub async fn get_settings_page(
    State(state): State<SettingsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let categories = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_all_categories(user_id, &connection) {
            Ok(categories) => categories,
            Err(error) => return error.into_response(),
        }
    };

    settings_page_view(&categories).into_response()
}

fn category_row_view(category: &Category) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) {
            td class=(TABLE_CELL_STYLE) { (category.id) }

            @if category.is_shared() {
                td class=(TABLE_CELL_STYLE) { (category.label) }
                td class=(TABLE_CELL_STYLE) {
                    span class="text-xs text-gray-400" { "きほんカテゴリ" }
                }
            } @else {
                td class=(TABLE_CELL_STYLE) {
                    form method="post" action=(endpoints::SETTINGS_VIEW) class="flex gap-2" {
                        input type="hidden" name="action" value="update_category";
                        input type="hidden" name="category_id" value=(category.id);
                        input
                            type="text"
                            name="label"
                            value=(category.label)
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                        button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" {
                            "へんこう"
                        }
                    }
                }
                td class=(TABLE_CELL_STYLE) {
                    form method="post" action=(endpoints::SETTINGS_VIEW) {
                        input type="hidden" name="action" value="delete_category";
                        input type="hidden" name="category_id" value=(category.id);
                        button type="submit" class=(BUTTON_DELETE_STYLE) { "さくじょ" }
                    }
                }
            }
        }
    }
}

fn settings_page_view(categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE) {
            section class="w-full max-w-2xl mb-8" {
                h1 class="text-xl font-bold mb-4" { "カテゴリ" }

                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    tbody {
                        @for category in categories {
                            (category_row_view(category))
                        }
                    }
                }
            }

            section class="w-full max-w-2xl mb-8" {
                h2 class="text-lg font-bold mb-4" { "カテゴリをついか" }

                form method="post" action=(endpoints::SETTINGS_VIEW) class="space-y-4" {
                    input type="hidden" name="action" value="add_category";

                    div {
                        label for="category-id" class=(FORM_LABEL_STYLE) { "ID（えいすうじ）" }
                        input
                            id="category-id"
                            type="text"
                            name="category_id"
                            placeholder="travel"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div {
                        label for="category-label" class=(FORM_LABEL_STYLE) { "なまえ" }
                        input
                            id="category-label"
                            type="text"
                            name="label"
                            placeholder="旅行"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "ついかする" }
                }
            }

            section class="w-full max-w-2xl" {
                h2 class="text-lg font-bold mb-4" { "データのさくじょ" }

                p class="mb-4 text-sm text-gray-500 dark:text-gray-400" {
                    "すべてのきろくとじぶんでついかしたカテゴリをけします。もとにはもどせません。"
                }

                form method="post" action=(endpoints::SETTINGS_VIEW) {
                    input type="hidden" name="action" value="reset_all";
                    button type="submit" class=(BUTTON_DELETE_STYLE) { "ぜんぶさくじょする" }
                }
            }
        }
    };

    base("せってい", &[], &content)
}
