//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use platforms::{StorefrontError, SupplierError};
use sync::SyncError;

use crate::webhook::WebhookError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong credentials.
    Unauthorized(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Sync engine error.
    Sync(SyncError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Sync(err) => sync_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn sync_error_to_response(err: SyncError) -> (StatusCode, String) {
    match &err {
        SyncError::LinkageNotFound(_)
        | SyncError::Storefront(StorefrontError::OrderNotFound(_))
        | SyncError::Supplier(SupplierError::OrderNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        SyncError::Storefront(_)
        | SyncError::Supplier(_)
        | SyncError::TransientSupplier { .. }
        | SyncError::TerminalSupplier { .. } => {
            tracing::warn!(error = %err, "upstream platform error");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "sync error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::SignatureInvalid => ApiError::Unauthorized(err.to_string()),
            WebhookError::MalformedBody(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StorefrontOrderId;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(WebhookError::SignatureInvalid), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::from(SyncError::Storefront(StorefrontError::OrderNotFound(
                    StorefrontOrderId::new(1),
                ))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(SyncError::Supplier(SupplierError::Api {
                    status: 500,
                    message: "down".into(),
                })),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::from(SyncError::SchedulerClosed), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
