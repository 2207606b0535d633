//! Implements a struct that holds the state of the REST server.

use crate::stores::TransactionStore;

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<T>
where
    T: TransactionStore,
{
    /// The store for managing [transactions](crate::Transaction).
    pub transaction_store: T,
}

impl<T> AppState<T>
where
    T: TransactionStore,
{
    /// Create a new [AppState] that serves transactions from `transaction_store`.
    pub fn new(transaction_store: T) -> Self {
        Self { transaction_store }
    }
}
