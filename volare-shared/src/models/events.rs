use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InquirySubmittedEvent {
    pub inquiry_id: Uuid,
    pub customer_id: String,
    pub origin: String,
    pub destination: String,
    pub passengers: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteIssuedEvent {
    pub quote_id: Uuid,
    pub inquiry_id: Uuid,
    pub total_cents: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteAcceptedEvent {
    pub quote_id: Uuid,
    pub inquiry_id: Uuid,
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CheckoutStartedEvent {
    pub transaction_id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentSettledEvent {
    pub transaction_id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReconciliationFlaggedEvent {
    pub transaction_id: Uuid,
    pub booking_id: Uuid,
    pub expected_cents: i64,
    pub received_cents: i64,
    pub timestamp: i64,
}
