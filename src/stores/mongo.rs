//! Implements a MongoDB backed transaction store.

use mongodb::{
    Client, Collection, Database,
    bson::{self, doc, oid::ObjectId},
    options::ClientOptions,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    config::ConnectionSettings,
    connection::{ConnectionError, ConnectionProvider, Connector},
    stores::TransactionStore,
    transaction::{
        NewTransaction, Transaction, TransactionType,
        core::{from_unix_millis, to_unix_millis},
    },
};

/// The name of the collection that holds transaction documents.
pub const TRANSACTIONS_COLLECTION: &str = "transactions";

/// The name reported to the server, shows up in MongoDB's logs.
const APP_NAME: &str = "finance-tracker";

/// Connects to a MongoDB deployment and checks that it responds.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    uri: String,
    database_name: String,
    settings: ConnectionSettings,
}

impl MongoConnector {
    /// Create a connector for the database `database_name` of the
    /// deployment at `uri`.
    pub fn new(uri: &str, database_name: &str, settings: ConnectionSettings) -> Self {
        Self {
            uri: uri.to_owned(),
            database_name: database_name.to_owned(),
            settings,
        }
    }

    async fn client_options(&self) -> Result<ClientOptions, mongodb::error::Error> {
        let mut options = ClientOptions::parse(&self.uri).await?;

        options.app_name = Some(APP_NAME.to_owned());
        options.connect_timeout = Some(self.settings.connect_timeout);
        options.server_selection_timeout = Some(self.settings.server_selection_timeout);
        options.max_idle_time = Some(self.settings.socket_idle_timeout);
        options.max_pool_size = Some(self.settings.max_pool_size);
        options.min_pool_size = Some(self.settings.min_pool_size);

        Ok(options)
    }
}

impl Connector for MongoConnector {
    type Handle = Database;

    async fn connect(&self) -> Result<Database, ConnectionError> {
        let options = self.client_options().await.map_err(ConnectionError::new)?;
        let client = Client::with_options(options).map_err(ConnectionError::new)?;
        let database = client.database(&self.database_name);

        // The driver connects lazily, so ping to find out whether the server
        // is actually reachable.
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(ConnectionError::new)?;

        tracing::info!("Connected to MongoDB database \"{}\"", self.database_name);

        Ok(database)
    }
}

/// Stores transactions in the `transactions` collection of a MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoTransactionStore {
    provider: ConnectionProvider<MongoConnector>,
}

impl MongoTransactionStore {
    /// Create a store that connects with `connector` on first use.
    pub fn new(connector: MongoConnector) -> Self {
        Self {
            provider: ConnectionProvider::new(connector),
        }
    }

    async fn collection(&self) -> Result<Collection<TransactionDocument>, Error> {
        let database = self.provider.get().await?;

        Ok(database.collection(TRANSACTIONS_COLLECTION))
    }
}

impl TransactionStore for MongoTransactionStore {
    /// Retrieve up to `limit` transactions, newest first.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Connection] if the server cannot be reached,
    /// - [Error::InvalidDocument] if a stored document has an invalid date,
    /// - or [Error::MongoError] if the query fails.
    async fn list(&self, limit: u32) -> Result<Vec<Transaction>, Error> {
        let collection = self.collection().await?;

        let mut cursor = collection
            .find(doc! {})
            .sort(doc! { "date": -1, "_id": -1 })
            .limit(i64::from(limit))
            .await?;

        let mut transactions = Vec::new();
        while cursor.advance().await? {
            let document = cursor.deserialize_current()?;
            transactions.push(document.into_transaction()?);
        }

        Ok(transactions)
    }

    /// Insert a transaction, MongoDB assigns its ID.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Connection] if the server cannot be reached,
    /// - [Error::InvalidDocument] if the server did not return an `ObjectId`,
    /// - or [Error::MongoError] if the insert fails.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let collection = self.collection().await?;

        let result = collection
            .insert_one(TransactionDocument::from(&transaction))
            .await?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            Error::InvalidDocument(format!(
                "expected an ObjectId for the inserted transaction, got {}",
                result.inserted_id
            ))
        })?;

        Ok(transaction.into_transaction(id.into()))
    }
}

/// A transaction as it is laid out in the `transactions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TransactionDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    description: String,
    amount: f64,
    category: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    date: bson::DateTime,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl From<&NewTransaction> for TransactionDocument {
    fn from(transaction: &NewTransaction) -> Self {
        Self {
            id: None,
            description: transaction.description.clone(),
            amount: transaction.amount,
            category: transaction.category.clone(),
            kind: transaction.kind,
            date: bson::DateTime::from_millis(to_unix_millis(transaction.date)),
            created_at: bson::DateTime::from_millis(to_unix_millis(transaction.created_at)),
        }
    }
}

impl TransactionDocument {
    fn into_transaction(self) -> Result<Transaction, Error> {
        let id = self
            .id
            .ok_or_else(|| Error::InvalidDocument("transaction document has no _id".to_owned()))?;

        Ok(Transaction {
            id: id.into(),
            description: self.description,
            amount: self.amount,
            category: self.category,
            kind: self.kind,
            date: from_unix_millis(self.date.timestamp_millis())?,
            created_at: from_unix_millis(self.created_at.timestamp_millis())?,
        })
    }
}
