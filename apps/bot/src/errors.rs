use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::bot::JobKind;

/// Errors surfaced by the HTTP trigger endpoints.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Shutting down")]
    ShuttingDown,

    #[error("Delivery of {0:?} failed")]
    Delivery(JobKind),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHUTTING_DOWN",
                "The bot is shutting down".to_string(),
            ),
            AppError::Delivery(kind) => {
                tracing::error!("Delivery error: {self}");
                (
                    StatusCode::BAD_GATEWAY,
                    "DELIVERY_ERROR",
                    format!("The chat channel rejected the {kind:?} message"),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ShuttingDown.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Delivery(JobKind::Meal).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
