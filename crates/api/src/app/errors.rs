use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockward_core::StockError;

/// Map a domain error to a structured JSON failure.
pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    match &err {
        StockError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string()),
        StockError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StockError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", err.to_string())
        }
        StockError::InvalidTransition { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", err.to_string())
        }
        StockError::Concurrency(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        StockError::Integrity(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "integrity_error", err.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
