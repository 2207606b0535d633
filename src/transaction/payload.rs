//! The request body for creating a transaction and its validation rules.

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::transaction::core::{NewTransaction, TransactionType};

/// A create request is malformed. The message is safe to show to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The description is missing, not a string, or blank.
    #[error("Description is required and must be a non-empty string")]
    InvalidDescription,

    /// The amount is missing, not a number, or not greater than zero.
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// The category is missing, not a string, or empty.
    #[error("Category is required")]
    MissingCategory,

    /// The type is something other than "income" or "expense".
    #[error("Type must be \"income\" or \"expense\"")]
    InvalidType,
}

/// The JSON body of a create request, as sent by the client.
///
/// Fields are kept as raw JSON values because clients send amounts both as
/// numbers and as strings (HTML forms only produce strings). Use
/// [CreateTransactionPayload::validate] to turn the payload into a
/// [NewTransaction].
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateTransactionPayload {
    /// Text detailing the transaction.
    pub description: Value,
    /// The value of the transaction in dollars, a number or numeric string.
    pub amount: Value,
    /// The category, e.g. "Food".
    pub category: Value,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Value,
}

impl CreateTransactionPayload {
    /// Check the payload and build a transaction timestamped with `now`.
    ///
    /// The checks run in field order (description, amount, category, type)
    /// and the first failure is returned.
    ///
    /// # Errors
    /// Returns the [ValidationError] for the first invalid field.
    pub fn validate(self, now: OffsetDateTime) -> Result<NewTransaction, ValidationError> {
        let description = match &self.description {
            Value::String(text) if !text.trim().is_empty() => text.trim().to_owned(),
            _ => return Err(ValidationError::InvalidDescription),
        };

        let amount = parse_amount(&self.amount).ok_or(ValidationError::InvalidAmount)?;

        let category = match &self.category {
            Value::String(text) if !text.is_empty() => text.trim().to_owned(),
            _ => return Err(ValidationError::MissingCategory),
        };

        let kind = match &self.kind {
            Value::String(text) => text
                .parse::<TransactionType>()
                .map_err(|_| ValidationError::InvalidType)?,
            _ => return Err(ValidationError::InvalidType),
        };

        Ok(NewTransaction {
            description,
            amount,
            category,
            kind,
            date: now,
            created_at: now,
        })
    }
}

/// A finite amount greater than zero, from a JSON number or numeric string.
fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (amount.is_finite() && amount > 0.0).then_some(amount)
}
