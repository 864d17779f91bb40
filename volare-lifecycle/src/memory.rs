use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use volare_core::booking::{Booking, PaymentState};
use volare_core::inquiry::{Inquiry, InquiryStatus};
use volare_core::payment::{PaymentTransaction, PaymentTxStatus};
use volare_core::quote::{Quote, QuoteStatus};
use volare_core::repository::{
    AuditLog, AuditRecord, BookingRepository, InquiryRepository, PaymentRepository,
    QuoteAcceptance, QuoteRepository, RepoResult,
};
use volare_core::PersistenceError;

#[derive(Default)]
struct Inner {
    inquiries: HashMap<Uuid, Inquiry>,
    quotes: HashMap<Uuid, Quote>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, PaymentTransaction>,
    audit: Vec<AuditRecord>,
}

/// In-memory Persistence Gateway. Backs the test suite and local
/// development; the single mutex gives the same serializability the
/// Postgres transaction provides in production.
#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a quote directly, bypassing the lifecycle. Quote
    /// issuance is a back-office concern, so tests use this to arrange
    /// state.
    pub fn put_quote(&self, quote: Quote) {
        self.inner.lock().unwrap().quotes.insert(quote.id, quote);
    }

    pub fn put_inquiry(&self, inquiry: Inquiry) {
        self.inner
            .lock()
            .unwrap()
            .inquiries
            .insert(inquiry.id, inquiry);
    }

    pub fn audit_entries(&self) -> Vec<AuditRecord> {
        self.inner.lock().unwrap().audit.clone()
    }
}

#[async_trait]
impl InquiryRepository for MemoryGateway {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> RepoResult<()> {
        self.inner
            .lock()
            .unwrap()
            .inquiries
            .insert(inquiry.id, inquiry.clone());
        Ok(())
    }

    async fn get_inquiry(&self, id: Uuid) -> RepoResult<Option<Inquiry>> {
        Ok(self.inner.lock().unwrap().inquiries.get(&id).cloned())
    }

    async fn list_inquiries(&self, customer_id: &str) -> RepoResult<Vec<Inquiry>> {
        let inner = self.inner.lock().unwrap();
        let mut inquiries: Vec<Inquiry> = inner
            .inquiries
            .values()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect();
        inquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(inquiries)
    }

    async fn update_inquiry_status(&self, id: Uuid, status: InquiryStatus) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let inquiry = inner
            .inquiries
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::Conflict(format!("inquiry {} missing", id)))?;
        inquiry.status = status;
        Ok(())
    }
}

#[async_trait]
impl QuoteRepository for MemoryGateway {
    async fn insert_quote(&self, quote: &Quote) -> RepoResult<()> {
        self.inner
            .lock()
            .unwrap()
            .quotes
            .insert(quote.id, quote.clone());
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>> {
        Ok(self.inner.lock().unwrap().quotes.get(&id).cloned())
    }

    async fn list_quotes_for_inquiry(&self, inquiry_id: Uuid) -> RepoResult<Vec<Quote>> {
        let inner = self.inner.lock().unwrap();
        let mut quotes: Vec<Quote> = inner
            .quotes
            .values()
            .filter(|q| q.inquiry_id == inquiry_id)
            .cloned()
            .collect();
        quotes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(quotes)
    }

    async fn commit_acceptance(&self, acceptance: &QuoteAcceptance) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();

        // CAS: re-check PENDING inside the critical section, not just
        // before it. A concurrent acceptance that won loses us here.
        match inner.quotes.get(&acceptance.quote_id) {
            Some(quote) if quote.status == QuoteStatus::Pending => {}
            Some(_) => {
                return Err(PersistenceError::Conflict(format!(
                    "quote {} is no longer pending",
                    acceptance.quote_id
                )))
            }
            None => {
                return Err(PersistenceError::Conflict(format!(
                    "quote {} missing",
                    acceptance.quote_id
                )))
            }
        }

        if let Some(quote) = inner.quotes.get_mut(&acceptance.quote_id) {
            quote.status = QuoteStatus::Accepted;
        }
        for quote in inner.quotes.values_mut() {
            if quote.inquiry_id == acceptance.inquiry_id
                && quote.id != acceptance.quote_id
                && quote.status == QuoteStatus::Pending
            {
                quote.status = QuoteStatus::Rejected;
            }
        }
        if let Some(inquiry) = inner.inquiries.get_mut(&acceptance.inquiry_id) {
            inquiry.status = InquiryStatus::Booked;
        }
        inner
            .bookings
            .insert(acceptance.booking.id, acceptance.booking.clone());
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryGateway {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.inner.lock().unwrap().bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, customer_id: &str) -> RepoResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl PaymentRepository for MemoryGateway {
    async fn insert_transaction(&self, tx: &PaymentTransaction) -> RepoResult<()> {
        self.inner.lock().unwrap().payments.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> RepoResult<Option<PaymentTransaction>> {
        Ok(self.inner.lock().unwrap().payments.get(&id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> RepoResult<Option<PaymentTransaction>> {
        // Terminal rows under the same key are history, not reusable
        // intents; only a live transaction may be returned.
        Ok(self
            .inner
            .lock()
            .unwrap()
            .payments
            .values()
            .filter(|tx| tx.idempotency_key == key)
            .find(|tx| !tx.status.is_terminal())
            .cloned())
    }

    async fn update_transaction_status(
        &self,
        id: Uuid,
        status: PaymentTxStatus,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let tx = inner
            .payments
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::Conflict(format!("transaction {} missing", id)))?;
        tx.status = status;
        Ok(())
    }

    async fn settle(&self, transaction_id: Uuid, booking_id: Uuid) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let tx = inner.payments.get_mut(&transaction_id).ok_or_else(|| {
            PersistenceError::Conflict(format!("transaction {} missing", transaction_id))
        })?;
        tx.status = PaymentTxStatus::Succeeded;
        let booking = inner
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| PersistenceError::Conflict(format!("booking {} missing", booking_id)))?;
        booking.payment_state = PaymentState::Paid;
        Ok(())
    }
}

#[async_trait]
impl AuditLog for MemoryGateway {
    async fn record(&self, entry: &AuditRecord) -> RepoResult<()> {
        self.inner.lock().unwrap().audit.push(entry.clone());
        Ok(())
    }
}
