use axum::{
    extract::{FromRequest, Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use volare_core::identity::Identity;
use volare_core::payment::PaymentOutcome;
use volare_core::LifecycleError;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: CheckoutObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutObject {
    pub transaction_id: Uuid,
    pub amount_cents: Option<i64>,
}

pub fn verify_signature(req: &Request, secret: &str) -> bool {
    req.headers()
        .get("X-Webhook-Secret")
        .and_then(|h| h.to_str().ok())
        .map(|provided| provided == secret)
        .unwrap_or(false)
}

/// POST /v1/webhooks/payments
/// Receive asynchronous settlement outcomes from the checkout gateway.
/// Redeliveries are expected and resolve as no-ops.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    req: Request,
) -> Result<StatusCode, AppError> {
    let actor = Identity::require(
        verify_signature(&req, &state.webhook_secret).then(Identity::gateway),
    )
    .map_err(AppError::from)?;

    let payload: PaymentWebhook = {
        let Json(payload) = Json::<PaymentWebhook>::from_request(req, &state)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Malformed webhook: {}", e)))?;
        payload
    };

    tracing::info!(
        "Received webhook {} ({}) for transaction {}",
        payload.id,
        payload.type_,
        payload.data.object.transaction_id
    );

    let outcome = match payload.type_.as_str() {
        // A succeeded event without the settled amount is malformed, not a
        // zero-cent settlement.
        "payment.succeeded" => match payload.data.object.amount_cents {
            Some(amount_cents) => PaymentOutcome::Succeeded { amount_cents },
            None => {
                return Err(LifecycleError::Validation(vec![
                    "amount_cents is required for payment.succeeded".to_string(),
                ])
                .into())
            }
        },
        "payment.failed" => PaymentOutcome::Failed,
        other => {
            tracing::info!("Ignoring webhook type {}", other);
            return Ok(StatusCode::OK);
        }
    };

    state
        .lifecycle
        .confirm_payment(&actor, payload.data.object.transaction_id, outcome)
        .await?;

    Ok(StatusCode::OK)
}
