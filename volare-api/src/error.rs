use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use volare_core::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Lifecycle(err) => match err {
                LifecycleError::Validation(violations) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "validation failed", "violations": violations }),
                ),
                LifecycleError::Authentication => (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "authentication required" }),
                ),
                // Generic denials: never reveal whether the entity exists
                // for a different owner.
                LifecycleError::Authorization => {
                    (StatusCode::FORBIDDEN, json!({ "error": "not permitted" }))
                }
                LifecycleError::NotFound => {
                    (StatusCode::NOT_FOUND, json!({ "error": "not found" }))
                }
                LifecycleError::InvalidState(reason) => {
                    (StatusCode::CONFLICT, json!({ "error": reason }))
                }
                LifecycleError::AmountMismatch { expected, received } => {
                    tracing::error!(
                        "Amount mismatch flagged for reconciliation: expected {} received {}",
                        expected,
                        received
                    );
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        json!({ "error": "settled amount does not match booking total" }),
                    )
                }
                LifecycleError::PaymentGateway(detail) => {
                    tracing::error!("Payment gateway failure: {}", detail);
                    (
                        StatusCode::BAD_GATEWAY,
                        json!({ "error": "payment gateway unavailable, please retry" }),
                    )
                }
                LifecycleError::Persistence(detail) => {
                    tracing::error!("Persistence failure: {}", detail);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        json!({ "error": "temporary failure, please retry" }),
                    )
                }
            },
            AppError::InternalServerError(detail) => {
                tracing::error!("Internal Server Error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
