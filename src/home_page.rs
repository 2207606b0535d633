//! Defines the route handler for the home page, which shows the ledger and a
//! form for adding transactions.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, endpoints,
    html::{
        CARD_STYLE, CATEGORY_BADGE_STYLE, EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, format_currency,
    },
    stores::TransactionStore,
    transaction::{LIST_LIMIT, Summary, Transaction, TransactionType, transaction_form},
};

/// The element the form asks to refresh after adding a transaction.
const LEDGER_ID: &str = "ledger";

const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

/// Render the home page.
///
/// HTMX requests, i.e. the ledger refreshing itself, only get the ledger.
pub async fn get_home_page<T>(
    State(state): State<AppState<T>>,
    HxRequest(is_htmx_request): HxRequest,
) -> Response
where
    T: TransactionStore,
{
    let transactions = match state.transaction_store.list(LIST_LIMIT).await {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    let summary = Summary::from_transactions(&transactions);
    let ledger = ledger_view(&summary, &transactions);

    if is_htmx_request {
        return ledger.into_response();
    }

    home_page_view(&ledger).into_response()
}

fn home_page_view(ledger: &Markup) -> Markup {
    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                header
                {
                    h1 class="text-2xl font-bold" { "Finance Tracker" }
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "Keep track of where your money comes from and where it goes."
                    }
                }

                section class=(CARD_STYLE)
                {
                    h2 class="text-xl font-semibold mb-4" { "Add Transaction" }

                    (transaction_form())
                }

                (ledger)
            }
        }
    };

    base("Home", &[dollar_input_styles()], &content)
}

fn ledger_view(summary: &Summary, transactions: &[Transaction]) -> Markup {
    let balance_style = if summary.balance < 0.0 {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };

    html! {
        section
            id=(LEDGER_ID)
            hx-get=(endpoints::ROOT)
            hx-trigger="refresh"
            hx-swap="outerHTML"
            class="w-full space-y-6"
        {
            div class="grid grid-cols-2 lg:grid-cols-4 gap-4"
            {
                (summary_card("Income", "income", &format_currency(summary.income), INCOME_TEXT_STYLE))
                (summary_card("Expenses", "expenses", &format_currency(summary.expenses), EXPENSE_TEXT_STYLE))
                (summary_card("Balance", "balance", &format_currency(summary.balance), balance_style))
                (summary_card("Transactions", "count", &summary.count.to_string(), ""))
            }

            div class="relative overflow-x-auto shadow-md rounded-lg"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            (transaction_row_view(transaction))
                        }

                        @if transactions.is_empty() {
                            tr
                            {
                                td
                                    colspan="4"
                                    data-empty-state="true"
                                    class="px-6 py-4 text-center"
                                {
                                    "No transactions recorded."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn summary_card(label: &str, key: &str, value: &str, value_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary=(key)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class={ "text-2xl font-bold " (value_style) } data-summary-value { (value) }
        }
    }
}

fn transaction_row_view(transaction: &Transaction) -> Markup {
    let (amount_prefix, amount_style) = match transaction.kind {
        TransactionType::Income => ("+", INCOME_TEXT_STYLE),
        TransactionType::Expense => ("", EXPENSE_TEXT_STYLE),
    };
    let amount = format_currency(transaction.kind.signed(transaction.amount));
    let date = format_date(transaction.date.date());

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { time datetime=(date) { (date) } }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
            }
            td class={ "px-6 py-4 text-right " (amount_style) } { (amount_prefix) (amount) }
        }
    }
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}
