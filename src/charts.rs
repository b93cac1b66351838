//! Chart generation for the filtered transactions.
//!
//! Two ECharts visualizations are built from the same filtered set that the
//! transactions page lists:
//! - **Income vs expenses**: a two-bar comparison of the totals.
//! - **By category**: a donut of the amounts grouped by category.
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    datatype::DataPointItem,
    element::{AxisLabel, AxisType, Color, ItemStyle, JsFunction, Label, Tooltip, Trigger},
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    category::Category,
    html::HeadElement,
    transaction::{Totals, Transaction},
};

/// The bar colors for income and expenses, matching the table text colors.
const INCOME_COLOR: &str = "#10b981";
const EXPENSE_COLOR: &str = "#ef4444";

/// The palette for the category donut. Wraps around past twelve categories.
const CATEGORY_PALETTE: [&str; 12] = [
    "#10b981", "#3b82f6", "#8b5cf6", "#f59e0b", "#ef4444", "#06b6d4", "#84cc16", "#f97316",
    "#ec4899", "#6366f1", "#14b8a6", "#eab308",
];

/// The message shown in place of a chart when the filter matches nothing.
pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters";

/// A chart with its HTML container ID and ECharts configuration.
pub struct ChartPanel {
    /// The HTML element ID to use for the chart (kebab-case).
    pub id: &'static str,
    /// The ECharts configuration as a JSON string.
    pub options: String,
}

/// One category's share of the displayed transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySlice {
    /// The name of the category.
    pub name: String,
    /// The summed amount for the category.
    pub total: f64,
    /// The category's share of the overall total, from 0 to 100.
    pub percent: f64,
}

/// The per-category totals of the displayed transactions.
///
/// Slices follow the category ID order so their colors stay stable as the
/// filter changes. Categories with no matching transactions are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    /// The slices, one per category with at least one transaction.
    pub slices: Vec<CategorySlice>,
}

impl CategoryBreakdown {
    /// Sum the amounts of `transactions` by category.
    ///
    /// `categories` must be ordered by ID, as [get_all_categories] returns
    /// them.
    ///
    /// [get_all_categories]: crate::category::get_all_categories
    pub fn from_transactions(transactions: &[Transaction], categories: &[Category]) -> Self {
        let mut slices: Vec<CategorySlice> = categories
            .iter()
            .filter_map(|category| {
                let total: f64 = transactions
                    .iter()
                    .filter(|transaction| transaction.category_id == category.id)
                    .map(|transaction| transaction.amount)
                    .sum();

                (total > 0.0).then(|| CategorySlice {
                    name: category.name.to_string(),
                    total,
                    percent: 0.0,
                })
            })
            .collect();

        let overall: f64 = slices.iter().map(|slice| slice.total).sum();
        for slice in &mut slices {
            slice.percent = slice.total / overall * 100.0;
        }

        Self { slices }
    }

    /// Whether no category has any matching transactions.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// The income vs expenses bar chart.
///
/// Zero totals render as zero-height bars rather than a placeholder, so the
/// axes stay visible while the user adjusts the filter.
pub fn income_expense_chart(totals: &Totals) -> Chart {
    Chart::new()
        .title(Title::new().text("Income vs expenses"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(vec!["Income", "Expenses"]),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().data(vec![
            DataPointItem::new(totals.income).item_style(ItemStyle::new().color(INCOME_COLOR)),
            DataPointItem::new(totals.expense).item_style(ItemStyle::new().color(EXPENSE_COLOR)),
        ]))
}

/// The donut chart of the displayed transactions grouped by category.
///
/// When no category has any transactions the chart is replaced by a
/// placeholder message.
pub fn category_donut_chart(breakdown: &CategoryBreakdown) -> Chart {
    if breakdown.is_empty() {
        return no_data_chart();
    }

    let palette = CATEGORY_PALETTE
        .iter()
        .map(|color| Color::from(*color))
        .collect();

    Chart::new()
        .title(Title::new().text("By category"))
        .color(palette)
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .series(
            Pie::new()
                .name("By category")
                .radius(vec!["45%", "70%"])
                .label(Label::new().formatter("{b}: {d}%"))
                .data(
                    breakdown
                        .slices
                        .iter()
                        .map(|slice| (slice.total, slice.name.as_str()))
                        .collect::<Vec<_>>(),
                ),
        )
}

/// A chart containing only the no-data placeholder message.
fn no_data_chart() -> Chart {
    Chart::new().title(
        Title::new()
            .text(NO_DATA_MESSAGE)
            .left("center")
            .top("middle"),
    )
}

/// Renders the HTML containers for the charts.
pub fn charts_view(charts: &[ChartPanel]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the JavaScript that initializes the charts after the page loads.
pub fn charts_init_script(charts: &[ChartPanel]) -> String {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )
}

/// The chart initialization script as a head element for full page loads.
pub fn charts_script(charts: &[ChartPanel]) -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(charts_init_script(charts)))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
}

#[cfg(test)]
mod breakdown_tests {
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName},
        transaction::{Transaction, TransactionType},
        user::UserId,
    };

    use super::{CategoryBreakdown, CategorySlice};

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: CategoryName::new_unchecked("Groceries"),
            },
            Category {
                id: 2,
                name: CategoryName::new_unchecked("Rent"),
            },
            Category {
                id: 3,
                name: CategoryName::new_unchecked("Salary"),
            },
        ]
    }

    fn transaction(category_id: i64, amount: f64) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserId::new(1),
            category_id,
            amount,
            date: date!(2024 - 01 - 10),
            kind: TransactionType::Expense,
        }
    }

    #[test]
    fn sums_amounts_per_category_in_id_order() {
        let transactions = [
            transaction(2, 200.0),
            transaction(1, 30.0),
            transaction(1, 20.0),
        ];

        let breakdown = CategoryBreakdown::from_transactions(&transactions, &categories());

        assert_eq!(
            breakdown.slices,
            vec![
                CategorySlice {
                    name: "Groceries".to_owned(),
                    total: 50.0,
                    percent: 20.0,
                },
                CategorySlice {
                    name: "Rent".to_owned(),
                    total: 200.0,
                    percent: 80.0,
                },
            ]
        );
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let transactions = [
            transaction(1, 25.0),
            transaction(2, 25.0),
            transaction(3, 50.0),
        ];

        let breakdown = CategoryBreakdown::from_transactions(&transactions, &categories());

        let percent_sum: f64 = breakdown.slices.iter().map(|slice| slice.percent).sum();
        assert!((percent_sum - 100.0).abs() < 1e-9);
        assert_eq!(breakdown.slices[2].percent, 50.0);
    }

    #[test]
    fn no_transactions_means_empty_breakdown() {
        let breakdown = CategoryBreakdown::from_transactions(&[], &categories());

        assert!(breakdown.is_empty());
    }
}

#[cfg(test)]
mod chart_tests {
    use crate::transaction::Totals;

    use super::{
        CategoryBreakdown, CategorySlice, ChartPanel, EXPENSE_COLOR, INCOME_COLOR,
        NO_DATA_MESSAGE, category_donut_chart, charts_init_script, income_expense_chart,
    };

    #[test]
    fn bar_chart_colors_income_and_expense_bars() {
        let totals = Totals {
            income: 1000.0,
            expense: 250.0,
        };

        let options = income_expense_chart(&totals).to_string();

        assert!(options.contains(INCOME_COLOR));
        assert!(options.contains(EXPENSE_COLOR));
        assert!(options.contains("1000"));
        assert!(options.contains("250"));
    }

    #[test]
    fn empty_totals_render_zero_height_bars() {
        let options = income_expense_chart(&Totals::default()).to_string();

        assert!(!options.contains(NO_DATA_MESSAGE));
        assert!(options.contains("Income"));
        assert!(options.contains("Expenses"));
    }

    #[test]
    fn empty_breakdown_renders_the_placeholder() {
        let options = category_donut_chart(&CategoryBreakdown::default()).to_string();

        assert!(options.contains(NO_DATA_MESSAGE));
    }

    #[test]
    fn donut_chart_includes_every_slice() {
        let breakdown = CategoryBreakdown {
            slices: vec![
                CategorySlice {
                    name: "Groceries".to_owned(),
                    total: 50.0,
                    percent: 20.0,
                },
                CategorySlice {
                    name: "Rent".to_owned(),
                    total: 200.0,
                    percent: 80.0,
                },
            ],
        };

        let options = category_donut_chart(&breakdown).to_string();

        assert!(options.contains("Groceries"));
        assert!(options.contains("Rent"));
        assert!(options.contains("45%"));
        assert!(options.contains("70%"));
    }

    #[test]
    fn donut_chart_labels_each_slice_with_its_percentage() {
        let breakdown = CategoryBreakdown {
            slices: vec![CategorySlice {
                name: "Groceries".to_owned(),
                total: 50.0,
                percent: 100.0,
            }],
        };

        let options = category_donut_chart(&breakdown).to_string();

        assert!(options.contains("{d}%"));
    }

    #[test]
    fn init_script_targets_each_chart_container() {
        let charts = [
            ChartPanel {
                id: "income-expense-chart",
                options: "{}".to_owned(),
            },
            ChartPanel {
                id: "category-chart",
                options: "{}".to_owned(),
            },
        ];

        let script = charts_init_script(&charts);

        assert!(script.contains("income-expense-chart"));
        assert!(script.contains("category-chart"));
    }
}
