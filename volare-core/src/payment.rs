use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentTxStatus {
    NotStarted,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentTxStatus {
    /// Terminal statuses absorb redelivered gateway confirmations.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentTxStatus::Succeeded | PaymentTxStatus::Failed | PaymentTxStatus::Refunded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTxStatus::NotStarted => "NOT_STARTED",
            PaymentTxStatus::Processing => "PROCESSING",
            PaymentTxStatus::Succeeded => "SUCCEEDED",
            PaymentTxStatus::Failed => "FAILED",
            PaymentTxStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(PaymentTxStatus::NotStarted),
            "PROCESSING" => Some(PaymentTxStatus::Processing),
            "SUCCEEDED" => Some(PaymentTxStatus::Succeeded),
            "FAILED" => Some(PaymentTxStatus::Failed),
            "REFUNDED" => Some(PaymentTxStatus::Refunded),
            _ => None,
        }
    }
}

/// A record of an attempt to settle a booking's total. Status is updated
/// solely by the gateway's asynchronous confirmation, never optimistically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub quote_id: Uuid,
    pub customer_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentTxStatus,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// Confirmation outcome delivered by the gateway. Succeeded carries the
/// amount the gateway actually settled, which must match the booking total
/// exactly before the booking may be marked paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded { amount_cents: i64 },
    Failed,
}

// Namespace for deterministic checkout idempotency keys.
const CHECKOUT_NAMESPACE: Uuid = Uuid::from_u128(0x8f2d1c4a_6b3e_4f5a_9d07_21c8e5b0a4d6);

/// Deterministic idempotency key for a (customer, quote) settlement intent.
/// The same inputs always yield the same key regardless of which process
/// computes it, so duplicate initiation attempts converge on one
/// transaction.
pub fn idempotency_key(customer_id: &str, quote_id: Uuid) -> String {
    Uuid::new_v5(
        &CHECKOUT_NAMESPACE,
        format!("{}:{}", customer_id, quote_id).as_bytes(),
    )
    .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub transaction_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub redirect_url: String,
}

#[derive(Debug, thiserror::Error)]
#[error("checkout gateway error: {0}")]
pub struct GatewayError(pub String);

/// Payment Gateway seam: creates a redirect-based checkout session bound to
/// a transaction. Confirmation arrives asynchronously via webhook.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}

pub struct MockCheckoutGateway {
    pub fail: bool,
}

impl MockCheckoutGateway {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockCheckoutGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail {
            return Err(GatewayError("simulated gateway failure".to_string()));
        }
        tracing::info!(
            "Mock checkout session for transaction {} ({} {})",
            request.transaction_id,
            request.amount_cents,
            request.currency
        );
        Ok(CheckoutSession {
            redirect_url: format!(
                "https://checkout.example.com/session/{}",
                request.transaction_id.simple()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_is_deterministic() {
        let quote_id = Uuid::new_v4();
        let a = idempotency_key("customer-1", quote_id);
        let b = idempotency_key("customer-1", quote_id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_idempotency_key_varies_by_input() {
        let quote_id = Uuid::new_v4();
        assert_ne!(
            idempotency_key("customer-1", quote_id),
            idempotency_key("customer-2", quote_id)
        );
        assert_ne!(
            idempotency_key("customer-1", quote_id),
            idempotency_key("customer-1", Uuid::new_v4())
        );
    }
}
