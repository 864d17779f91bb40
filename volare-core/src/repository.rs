use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;
use crate::inquiry::{Inquiry, InquiryStatus};
use crate::payment::{PaymentTransaction, PaymentTxStatus};
use crate::quote::Quote;
use crate::PersistenceError;

pub type RepoResult<T> = Result<T, PersistenceError>;

/// Repository trait for inquiry access
#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> RepoResult<()>;

    async fn get_inquiry(&self, id: Uuid) -> RepoResult<Option<Inquiry>>;

    async fn list_inquiries(&self, customer_id: &str) -> RepoResult<Vec<Inquiry>>;

    /// Advance status; implementations must not regress (the caller checks
    /// `InquiryStatus::can_advance_to` before issuing the write).
    async fn update_inquiry_status(&self, id: Uuid, status: InquiryStatus) -> RepoResult<()>;
}

/// Everything the acceptance transaction mutates, applied as one atomic
/// unit. The target quote's PENDING status is re-checked inside the
/// transaction (compare-and-swap); a failed check surfaces as
/// `PersistenceError::Conflict` and rolls back every other write.
#[derive(Debug, Clone)]
pub struct QuoteAcceptance {
    pub quote_id: Uuid,
    pub inquiry_id: Uuid,
    pub booking: Booking,
}

/// Repository trait for quote access
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn insert_quote(&self, quote: &Quote) -> RepoResult<()>;

    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>>;

    async fn list_quotes_for_inquiry(&self, inquiry_id: Uuid) -> RepoResult<Vec<Quote>>;

    /// Atomic acceptance group: accept the target quote, reject its
    /// pending siblings, mark the inquiry booked, insert the booking.
    /// Retrying after a transient failure is safe: once a prior attempt
    /// committed, the CAS fails with `Conflict`.
    async fn commit_acceptance(&self, acceptance: &QuoteAcceptance) -> RepoResult<()>;
}

/// Repository trait for booking access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    async fn list_bookings(&self, customer_id: &str) -> RepoResult<Vec<Booking>>;
}

/// Repository trait for payment transaction access
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_transaction(&self, tx: &PaymentTransaction) -> RepoResult<()>;

    async fn get_transaction(&self, id: Uuid) -> RepoResult<Option<PaymentTransaction>>;

    /// Find the in-flight (non-terminal) transaction for the key, if any.
    /// Terminal rows sharing the key are never returned.
    async fn find_by_idempotency_key(&self, key: &str)
        -> RepoResult<Option<PaymentTransaction>>;

    async fn update_transaction_status(&self, id: Uuid, status: PaymentTxStatus)
        -> RepoResult<()>;

    /// Atomic settlement: transaction -> SUCCEEDED and booking -> PAID in
    /// one unit, so a booking is never marked paid without a succeeded
    /// transaction backing it.
    async fn settle(&self, transaction_id: Uuid, booking_id: Uuid) -> RepoResult<()>;
}

/// One row of the mutation audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub actor: String,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        actor: &str,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            actor: actor.to_string(),
            detail,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditRecord) -> RepoResult<()>;
}
