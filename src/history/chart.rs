//! Chart generation and rendering for the history page.
//!
//! The category spending chart is generated as JSON configuration for the
//! ECharts library and rendered with an HTML container and a JavaScript
//! initialization snippet.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisType, Tooltip, Trigger},
    series::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::html::HeadElement;

/// The ECharts library loaded on pages that render a chart.
pub(super) const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@5.5.1/dist/echarts.min.js";

/// The HTML element ID of the category spending chart container.
const CHART_CONTAINER_ID: &str = "category-chart";

/// A bar chart of the month's spending per category.
///
/// `labels` and `values` are parallel: one entry per category in the user's
/// effective set, zero-filled for categories unused that month.
pub(super) fn category_spending_chart(labels: Vec<String>, values: Vec<i64>) -> Chart {
    Chart::new()
        .title(Title::new().text("カテゴリべつ支出"))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Bar::new().name("支出").data(values))
}

/// Renders the HTML container the chart is drawn into.
pub(super) fn chart_view() -> Markup {
    html!(
        div
            id=(CHART_CONTAINER_ID)
            class="w-full max-w-2xl min-h-[380px] rounded dark:bg-gray-100 mb-4"
        {}
    )
}

/// Generates the JavaScript initialization code for the chart.
pub(super) fn chart_script(chart: &Chart) -> HeadElement {
    let options = chart.to_string();
    let script_content = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{CHART_CONTAINER_ID}");
            const chart = echarts.init(chartDom);
            const option = {options};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);
        }});"#
    );

    HeadElement::ScriptSource(PreEscaped(script_content))
}
