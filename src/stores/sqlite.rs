//! Implements a SQLite backed transaction store.
//!
//! Used for local development without a MongoDB server and in tests, where
//! an in-memory database gives each test a fresh store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    connection::{ConnectionError, ConnectionProvider, Connector},
    stores::TransactionStore,
    transaction::{
        NewTransaction, Transaction, TransactionId,
        core::{from_unix_millis, to_unix_millis},
    },
};

/// The path SQLite uses for a private, in-memory database.
const IN_MEMORY_PATH: &str = ":memory:";

/// Opens a SQLite database and creates the transaction table.
#[derive(Debug, Clone)]
pub struct SQLiteConnector {
    path: String,
}

impl SQLiteConnector {
    /// Create a connector for the database file at `path`.
    ///
    /// The file is created if it does not exist. Use `":memory:"` for an
    /// in-memory database.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
        }
    }
}

impl Connector for SQLiteConnector {
    type Handle = Arc<Mutex<Connection>>;

    async fn connect(&self) -> Result<Self::Handle, ConnectionError> {
        let connection = if self.path == IN_MEMORY_PATH {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        }
        .map_err(ConnectionError::new)?;

        create_transaction_table(&connection).map_err(ConnectionError::new)?;

        tracing::info!("Opened SQLite database {}", self.path);

        Ok(Arc::new(Mutex::new(connection)))
    }
}

/// Stores transactions in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    provider: ConnectionProvider<SQLiteConnector>,
}

impl SQLiteTransactionStore {
    /// Create a store for the database file at `path`.
    ///
    /// The database is opened on first use.
    pub fn new(path: &str) -> Self {
        Self {
            provider: ConnectionProvider::new(SQLiteConnector::new(path)),
        }
    }

    /// Create a store backed by a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    async fn connection(&self) -> Result<Arc<Mutex<Connection>>, Error> {
        Ok(self.provider.get().await?)
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Retrieve up to `limit` transactions, newest first.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Connection] if the database could not be opened,
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    async fn list(&self, limit: u32) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection().await?;
        let connection = connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(limit, &connection)
    }

    /// Insert a transaction and assign it a new ID.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Connection] if the database could not be opened,
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let connection = self.connection().await?;
        let connection = connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        insert_transaction(transaction, &connection)
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                date INTEGER NOT NULL,
                created_at INTEGER NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date DESC)",
        (),
    )?;

    Ok(())
}

fn list_transactions(limit: u32, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, description, amount, category, type, date, created_at
             FROM \"transaction\"
             ORDER BY date DESC, rowid DESC
             LIMIT ?1",
        )?
        .query_map([limit], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

fn insert_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (id, description, amount, category, type, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, description, amount, category, type, date, created_at",
        )?
        .query_row(
            (
                TransactionId::generate(),
                transaction.description,
                transaction.amount,
                transaction.category,
                transaction.kind,
                to_unix_millis(transaction.date),
                to_unix_millis(transaction.created_at),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Map a database row to a [Transaction].
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let timestamp = |index: usize| -> Result<_, rusqlite::Error> {
        let millis: i64 = row.get(index)?;

        from_unix_millis(millis).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
        })
    };

    Ok(Transaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        kind: row.get(4)?,
        date: timestamp(5)?,
        created_at: timestamp(6)?,
    })
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use super::SQLiteTransactionStore;
    use crate::{
        Error,
        stores::TransactionStore,
        transaction::{NewTransaction, TransactionType},
    };

    fn new_transaction(description: &str, date: time::OffsetDateTime) -> NewTransaction {
        NewTransaction {
            description: description.to_owned(),
            amount: 12.3,
            category: "General".to_owned(),
            kind: TransactionType::Expense,
            date,
            created_at: date,
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let store = SQLiteTransactionStore::in_memory();
        let want = new_transaction("test transaction", datetime!(2025-01-15 10:30:00.125 UTC));

        let created = store.create(want.clone()).await.unwrap();

        assert_eq!(created.description, want.description);
        assert_eq!(created.amount, want.amount);
        assert_eq!(created.category, want.category);
        assert_eq!(created.kind, want.kind);
        assert_eq!(created.date, want.date);
        assert_eq!(created.created_at, want.created_at);
        assert_eq!(created.id.as_str().len(), 24);
    }

    #[tokio::test]
    async fn created_transactions_get_distinct_ids() {
        let store = SQLiteTransactionStore::in_memory();
        let transaction = new_transaction("same", datetime!(2025-01-15 10:30 UTC));

        let first = store.create(transaction.clone()).await.unwrap();
        let second = store.create(transaction).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.list(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = SQLiteTransactionStore::in_memory();
        let start = datetime!(2025-01-01 00:00 UTC);

        for offset in [3, 1, 4, 0, 2] {
            store
                .create(new_transaction(
                    &format!("day {offset}"),
                    start + Duration::days(offset),
                ))
                .await
                .unwrap();
        }

        let transactions = store.list(10).await.unwrap();

        let descriptions: Vec<_> = transactions
            .iter()
            .map(|transaction| transaction.description.as_str())
            .collect();
        assert_eq!(descriptions, ["day 4", "day 3", "day 2", "day 1", "day 0"]);
    }

    #[tokio::test]
    async fn list_breaks_date_ties_by_insertion_order() {
        let store = SQLiteTransactionStore::in_memory();
        let date = datetime!(2025-01-01 00:00 UTC);

        store.create(new_transaction("first", date)).await.unwrap();
        store.create(new_transaction("second", date)).await.unwrap();

        let transactions = store.list(10).await.unwrap();

        assert_eq!(transactions[0].description, "second");
        assert_eq!(transactions[1].description, "first");
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let store = SQLiteTransactionStore::in_memory();
        let start = datetime!(2025-01-01 00:00 UTC);

        for offset in 0..5 {
            store
                .create(new_transaction("t", start + Duration::minutes(offset)))
                .await
                .unwrap();
        }

        let transactions = store.list(3).await.unwrap();

        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0].date, start + Duration::minutes(4));
    }

    #[tokio::test]
    async fn list_empty_store() {
        let store = SQLiteTransactionStore::in_memory();

        assert!(store.list(500).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_database() {
        let store = SQLiteTransactionStore::in_memory();
        let clone = store.clone();

        store
            .create(new_transaction("shared", datetime!(2025-01-01 00:00 UTC)))
            .await
            .unwrap();

        assert_eq!(clone.list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_database_is_connection_error() {
        let store = SQLiteTransactionStore::new("/nonexistent/directory/finance.db");

        let result = store.list(10).await;

        assert!(
            matches!(result, Err(Error::Connection(_))),
            "want connection error, got {result:?}"
        );
    }
}
