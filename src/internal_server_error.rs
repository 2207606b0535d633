//! Defines the page to display when a request cannot be completed.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct InternalServerError<'a> {
    pub status: StatusCode,
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl InternalServerError<'_> {
    pub fn into_html(self) -> Html<String> {
        let title = self.status.canonical_reason().unwrap_or("Internal Server Error");

        Html(error_view(title, self.status.as_str(), self.description, self.fix).into_string())
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (self.status, self.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::InternalServerError;
    use crate::test_utils::parse_html_document;

    #[tokio::test]
    async fn default_is_500() {
        let response = InternalServerError::default().into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_document(response).await;
        let title = html
            .select(&scraper::Selector::parse("title").unwrap())
            .next()
            .map(|title| title.inner_html());
        assert_eq!(title.as_deref(), Some("Internal Server Error - Finance Tracker"));
    }

    #[tokio::test]
    async fn uses_given_status() {
        let response = InternalServerError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            description: "Database connection unavailable",
            fix: "Try again later.",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let text = parse_html_document(response).await.html();
        assert!(text.contains("503"));
        assert!(text.contains("Database connection unavailable"));
    }
}
