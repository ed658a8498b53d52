use crate::services::{
    StoreError, image_resolver::ResolveError, query_parser::ParseError,
    validator::ValidationErrors,
};
use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

const SERVER_ERROR: &str = "Server error";

/// An HTTP-facing error: a status plus the `{message, errors?}` body.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Per-attribute messages, present only for validation failures.
    pub errors: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, String>>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            errors: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Generic 500. The cause is logged here and never sent to the client.
    pub fn internal(cause: impl fmt::Display) -> Self {
        tracing::error!("request failed: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
    }

    pub fn validation_failed(errors: &ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".into(),
            errors: Some(errors.to_messages()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: &self.message,
            errors: self.errors.as_ref(),
        });

        (self.status, body).into_response()
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ClientNotFound(id) => {
                tracing::debug!("client {} not found", id);
                AppError::not_found("Not Found")
            }
            other => AppError::internal(other),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ImageNotFound(id) => {
                tracing::debug!("image {} not found", id);
                AppError::not_found("Image not found")
            }
            other => AppError::internal(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::{Attribute, ClientAttributes};
    use crate::services::validator::validate;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn parse_errors_are_bad_requests() {
        let (status, body) = body_json(ParseError::InvalidPage("0".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid page value: 0. Use a number >= 1");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn validation_failures_carry_every_error() {
        let mut attrs = ClientAttributes::new();
        attrs.insert(Attribute::Email, "bad".into());
        let (status, body) = body_json(AppError::validation_failed(&validate(&attrs))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["title"], "Title is required");
        assert_eq!(body["errors"]["email"], "Invalid email");
    }

    #[tokio::test]
    async fn store_failures_hide_their_cause() {
        let err = StoreError::Io(std::io::Error::other("disk on fire at /var/lib/x"));
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
    }

    #[tokio::test]
    async fn missing_records_map_to_not_found() {
        let (status, body) = body_json(StoreError::ClientNotFound("x".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not Found");

        let (status, body) = body_json(ResolveError::ImageNotFound("x".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Image not found");
    }
}
