//! Contains the trait and implementations for objects that store
//! [transactions](crate::transaction::Transaction).

mod mongo;
mod sqlite;
mod transaction;

pub use mongo::{MongoConnector, MongoTransactionStore, TRANSACTIONS_COLLECTION};
pub use sqlite::{SQLiteConnector, SQLiteTransactionStore};
pub use transaction::TransactionStore;
