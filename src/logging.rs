//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of characters of a request or response body logged at the
/// `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Bodies are passed on byte for byte. Request bodies over axum's default
/// body limit are rejected with 413 Payload Too Large.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_bytes) = match extract_parts_and_body_from_request(request).await {
        Ok(parts_and_body) => parts_and_body,
        Err(rejection) => return rejection,
    };

    log_request(&parts, &String::from_utf8_lossy(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body_bytes) = match extract_parts_and_body_from_response(response).await {
        Ok(parts_and_body) => parts_and_body,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// Buffer the request body, subject to axum's default body limit.
async fn extract_parts_and_body_from_request(
    request: Request,
) -> Result<(request::Parts, Bytes), Response> {
    let (parts, body) = request.into_parts();

    match Bytes::from_request(Request::new(body), &()).await {
        Ok(body_bytes) => Ok((parts, body_bytes)),
        Err(rejection) => {
            tracing::error!(
                "Could not read request body for {} {}: {rejection}",
                parts.method,
                parts.uri
            );
            Err(rejection.into_response())
        }
    }
}

async fn extract_parts_and_body_from_response(
    response: Response,
) -> Result<(response::Parts, Bytes), axum::Error> {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((parts, body_bytes))
}

/// Returns the first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None`
/// if `body` is short enough to log in full.
fn truncate_body(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate_body(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate_body(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}
