//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validated `NewTransaction`
//! - The JSON payload for creating transactions and its validation rules
//! - The list/create API endpoint and the form that posts to it
//! - The income, expense and balance summary shown on the home page

pub(crate) mod core;
mod endpoint;
mod form;
mod payload;
mod summary;

pub use core::{LIST_LIMIT, NewTransaction, Transaction, TransactionId, TransactionType};
pub use endpoint::{
    create_transaction_endpoint, list_transactions_endpoint, transactions_method_not_allowed,
};
pub use form::transaction_form;
pub use payload::{CreateTransactionPayload, ValidationError};
pub use summary::Summary;
