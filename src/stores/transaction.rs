//! Defines the transaction store trait.

use std::future::Future;

use crate::{
    Error,
    transaction::{NewTransaction, Transaction},
};

/// Handles the creation and retrieval of transactions.
///
/// Stores are cheap to clone and clones share the same underlying connection.
pub trait TransactionStore: Clone + Send + Sync + 'static {
    /// Retrieve up to `limit` transactions, newest first.
    ///
    /// Transactions are ordered by date, descending. Transactions with the
    /// same date are ordered with the most recently inserted first.
    fn list(&self, limit: u32) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Insert `transaction` and return it with its newly assigned ID.
    fn create(
        &self,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;
}
