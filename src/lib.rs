//! A web app for keeping track of personal income and expenses.
//!
//! This library provides a small JSON API for listing and creating
//! transactions, backed by MongoDB, and an HTML page that uses the API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod config;
mod connection;
mod endpoints;
mod home_page;
mod html;
mod internal_server_error;
mod logging;
mod not_found;
mod routing;
pub mod stores;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{Config, ConnectionSettings, DEFAULT_DATABASE_NAME, StoreUri};
pub use connection::{ConnectionError, ConnectionProvider, Connector};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    CreateTransactionPayload, LIST_LIMIT, NewTransaction, Summary, Transaction, TransactionId,
    TransactionType, ValidationError,
};

use crate::internal_server_error::InternalServerError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The message sent to clients when the store cannot be reached.
const CONNECTION_UNAVAILABLE_MESSAGE: &str = "Database connection unavailable";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request to create a transaction was malformed.
    ///
    /// The message is meant for the client.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request body could not be read as a JSON object.
    #[error("could not parse the request body as JSON: {0}")]
    InvalidJson(String),

    /// The document store could not be reached.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The store connection URI has a scheme that is not supported.
    ///
    /// Any password in the URI is redacted.
    #[error("unsupported store URI \"{0}\", expected mongodb://, mongodb+srv:// or sqlite://")]
    InvalidStoreUri(String),

    /// A stored transaction could not be read back.
    #[error("invalid transaction document: {0}")]
    InvalidDocument(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An unhandled/unexpected MongoDB error.
    #[error("an unexpected MongoDB error occurred: {0}")]
    MongoError(mongodb::error::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(value: mongodb::error::Error) -> Self {
        match *value.kind {
            // The deployment went away after the initial connection succeeded.
            mongodb::error::ErrorKind::ServerSelection { .. } => {
                tracing::error!("Lost connection to MongoDB: {value}");
                Error::Connection(ConnectionError::new(value))
            }
            _ => {
                tracing::error!("an unhandled MongoDB error occurred: {}", value);
                Error::MongoError(value)
            }
        }
    }
}

/// The JSON body of every error response from the API.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub error: &'a str,
}

/// Respond with `status` and a JSON body `{"error": message}`.
pub(crate) fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            // Connection failures are logged where they happen.
            Error::Connection(_) => InternalServerError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                description: CONNECTION_UNAVAILABLE_MESSAGE,
                fix: "Check that the database server is running and try again.",
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into a JSON API response.
    ///
    /// Errors caused by the client get a specific message. Any other error is
    /// logged and the client gets the generic `fallback_message`.
    pub(crate) fn into_json_response(self, fallback_message: &str) -> Response {
        match self {
            Error::Validation(error) => json_error(StatusCode::BAD_REQUEST, &error.to_string()),
            Error::InvalidJson(detail) => {
                tracing::debug!("Rejected request body: {detail}");
                json_error(StatusCode::BAD_REQUEST, "Request body must be a JSON object")
            }
            Error::Connection(_) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, CONNECTION_UNAVAILABLE_MESSAGE)
            }
            error => {
                tracing::error!("{fallback_message}: {error}");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, fallback_message)
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{ConnectionError, Error, ValidationError};

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not get response body");

        serde_json::from_slice(&body).expect("Could not parse response body as JSON")
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_with_message() {
        let response = Error::Validation(ValidationError::InvalidAmount)
            .into_json_response("Failed to create transaction");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Amount must be a positive number" })
        );
    }

    #[tokio::test]
    async fn connection_error_is_service_unavailable_without_detail() {
        let response = Error::Connection(ConnectionError("connection refused".to_owned()))
            .into_json_response("Failed to fetch transactions");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Database connection unavailable" })
        );
    }

    #[tokio::test]
    async fn unexpected_error_uses_fallback_message() {
        let response = Error::InvalidDocument("date out of range".to_owned())
            .into_json_response("Failed to fetch transactions");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to fetch transactions" })
        );
    }
}
