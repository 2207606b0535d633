//! The form for adding a transaction from the home page.

use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
};

/// The categories offered in the form, the first one is selected by default.
pub const SUGGESTED_CATEGORIES: [&str; 6] =
    ["General", "Food", "Rent", "Salary", "Utilities", "Entertainment"];

/// The element that shows why the last submission was rejected.
const FORM_ERROR_ID: &str = "form-error";

// Runs after every submission. The API answers with `{"error": ...}` on
// failure, which is shown under the form.
const AFTER_REQUEST_SCRIPT: &str = "\
const formError = document.getElementById('form-error');
if (event.detail.successful) {
    this.reset();
    formError.textContent = '';
    htmx.trigger('#ledger', 'refresh');
} else {
    let message = 'Failed to create transaction';
    try {
        message = JSON.parse(event.detail.xhr.responseText).error || message;
    } catch (_) {}
    formError.textContent = message;
}";

/// The form for adding a transaction.
///
/// The form is submitted to the transactions API as JSON.
pub fn transaction_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-ext="json-enc"
            hx-swap="none"
            hx-disabled-elt="find button"
            hx-on::after-request=(AFTER_REQUEST_SCRIPT)
            class="w-full space-y-4 md:space-y-6"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    div class="flex items-center gap-3"
                    {
                        input
                            name="type"
                            id="transaction-type-expense"
                            type="radio"
                            value="expense"
                            checked
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label
                            for="transaction-type-expense"
                            class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Expense"
                        }
                    }

                    div class="flex items-center gap-3"
                    {
                        input
                            name="type"
                            id="transaction-type-income"
                            type="radio"
                            value="income"
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label
                            for="transaction-type-income"
                            class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Income"
                        }
                    }
                }
            }

            div
            {
                label
                    for="amount"
                    class=(FORM_LABEL_STYLE)
                {
                    "Amount"
                }

                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        placeholder="0.01"
                        min="0.01"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label
                    for="description"
                    class=(FORM_LABEL_STYLE)
                {
                    "Description"
                }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Description"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label
                    for="category"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category"
                }

                select
                    name="category"
                    id="category"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in SUGGESTED_CATEGORIES {
                        option value=(category) { (category) }
                    }
                }
            }

            p id=(FORM_ERROR_ID) class="text-red-500 text-base" role="alert" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Transaction" }
        }
    }
}
