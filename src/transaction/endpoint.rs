//! Defines the endpoint for listing and creating transactions.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error, ErrorBody,
    stores::TransactionStore,
    transaction::{CreateTransactionPayload, LIST_LIMIT, core::now_utc_millis},
};

/// The methods supported by the transactions endpoint.
pub const ALLOWED_METHODS: &str = "GET, POST";

/// A route handler that responds with the newest transactions as a JSON array.
///
/// At most [LIST_LIMIT] transactions are returned.
pub async fn list_transactions_endpoint<T>(State(state): State<AppState<T>>) -> Response
where
    T: TransactionStore,
{
    match state.transaction_store.list(LIST_LIMIT).await {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_json_response("Failed to fetch transactions"),
    }
}

/// A route handler for creating a new transaction, responds with the created
/// transaction and the status code 201 on success.
pub async fn create_transaction_endpoint<T>(
    State(state): State<AppState<T>>,
    payload: Result<Json<CreateTransactionPayload>, JsonRejection>,
) -> Response
where
    T: TransactionStore,
{
    const FAILURE_MESSAGE: &str = "Failed to create transaction";

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return Error::InvalidJson(rejection.body_text()).into_json_response(FAILURE_MESSAGE);
        }
    };

    let transaction = match payload.validate(now_utc_millis()) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::debug!("Rejected new transaction: {error}");
            return Error::from(error).into_json_response(FAILURE_MESSAGE);
        }
    };

    match state.transaction_store.create(transaction).await {
        Ok(transaction) => {
            tracing::info!("Created transaction {}", transaction.id);
            (StatusCode::CREATED, Json(transaction)).into_response()
        }
        Err(error) => error.into_json_response(FAILURE_MESSAGE),
    }
}

/// A route handler for any method the transactions endpoint does not support.
pub async fn transactions_method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        Json(ErrorBody {
            error: &format!("Method {method} Not Allowed"),
        }),
    )
        .into_response()
}
