//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use mongodb::bson::oid::ObjectId;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The maximum number of transactions returned by a single list request.
pub const LIST_LIMIT: u32 = 500;

// ============================================================================
// MODELS
// ============================================================================

/// The opaque, store-assigned identifier of a transaction.
///
/// Identifiers are 24 character hex strings in the MongoDB `ObjectId` format
/// regardless of which store created them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a new, unique identifier.
    pub fn generate() -> Self {
        Self(ObjectId::new().to_hex())
    }

    /// The identifier as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ObjectId> for TransactionId {
    fn from(id: ObjectId) -> Self {
        Self(id.to_hex())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Self)
    }
}

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, adds to the balance.
    Income,
    /// Money spent, subtracts from the balance.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The effect of `amount` on the balance for this type of transaction.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(()),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|_| FromSqlError::Other(format!("invalid transaction type {text:?}").into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Transactions are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    #[serde(rename = "_id")]
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// A free-form category, e.g. "Food" or "Rent".
    pub category: String,
    /// Whether the amount was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When the transaction was recorded.
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated transaction that has not been stored yet.
///
/// Build one from a request with
/// [CreateTransactionPayload::validate](crate::transaction::CreateTransactionPayload::validate).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub(crate) description: String,
    pub(crate) amount: f64,
    pub(crate) category: String,
    pub(crate) kind: TransactionType,
    pub(crate) date: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
}

impl NewTransaction {
    /// Attach the identifier assigned by the store.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            category: self.category,
            kind: self.kind,
            date: self.date,
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// TIME HELPERS
// ============================================================================

/// The current UTC time truncated to whole milliseconds.
///
/// Timestamps are stored with millisecond precision, so truncating up front
/// means a created transaction compares equal to the one read back later.
pub fn now_utc_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}

/// The number of milliseconds between the Unix epoch and `date_time`.
pub fn to_unix_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// The UTC date-time `millis` milliseconds after the Unix epoch.
///
/// # Errors
/// Returns [Error::InvalidDocument] if `millis` is out of range.
pub fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .map_err(|error| Error::InvalidDocument(format!("invalid timestamp {millis}: {error}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::{
        Transaction, TransactionId, TransactionType, from_unix_millis, now_utc_millis,
        to_unix_millis,
    };

    #[test]
    fn serializes_with_api_field_names() {
        let transaction = Transaction {
            id: TransactionId("65f1c0ffee0000000000beef".to_owned()),
            description: "Coffee".to_owned(),
            amount: 4.5,
            category: "Food".to_owned(),
            kind: TransactionType::Expense,
            date: datetime!(2025-03-14 09:26:53.589 UTC),
            created_at: datetime!(2025-03-14 09:26:53.589 UTC),
        };

        let value = serde_json::to_value(&transaction).unwrap();

        assert_eq!(
            value,
            json!({
                "_id": "65f1c0ffee0000000000beef",
                "description": "Coffee",
                "amount": 4.5,
                "category": "Food",
                "type": "expense",
                "date": "2025-03-14T09:26:53.589Z",
                "createdAt": "2025-03-14T09:26:53.589Z",
            })
        );
    }

    #[test]
    fn type_sign_follows_kind() {
        assert_eq!(TransactionType::Income.signed(12.5), 12.5);
        assert_eq!(TransactionType::Expense.signed(12.5), -12.5);
    }

    #[test]
    fn parses_only_known_types() {
        assert_eq!("income".parse::<TransactionType>(), Ok(TransactionType::Income));
        assert_eq!("expense".parse::<TransactionType>(), Ok(TransactionType::Expense));
        assert_eq!("transfer".parse::<TransactionType>(), Err(()));
        assert_eq!("Income".parse::<TransactionType>(), Err(()));
    }

    #[test]
    fn generated_ids_are_unique_hex() {
        let first = TransactionId::generate();
        let second = TransactionId::generate();

        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 24);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn unix_millis_round_trip_is_lossless_for_truncated_times() {
        let now = now_utc_millis();

        assert_eq!(now.nanosecond() % 1_000_000, 0);
        assert_eq!(from_unix_millis(to_unix_millis(now)).unwrap(), now);
    }
}
