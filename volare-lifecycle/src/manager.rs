use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use volare_core::booking::{Booking, PaymentState};
use volare_core::identity::Identity;
use volare_core::inquiry::{Inquiry, InquiryDraft, InquiryStatus};
use volare_core::payment::{
    self, CheckoutGateway, CheckoutRequest, PaymentOutcome, PaymentTransaction, PaymentTxStatus,
};
use volare_core::quote::{Quote, QuoteStatus};
use volare_core::repository::{
    AuditLog, AuditRecord, BookingRepository, InquiryRepository, PaymentRepository,
    QuoteAcceptance, QuoteRepository,
};
use volare_core::{LifecycleError, LifecycleResult, PersistenceError};
use volare_shared::models::events::{
    CheckoutStartedEvent, InquirySubmittedEvent, PaymentSettledEvent, QuoteAcceptedEvent,
    QuoteIssuedEvent, ReconciliationFlaggedEvent,
};

use crate::intake;
use crate::reference;

/// Redirect targets handed to the checkout gateway.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Result of initiating a checkout: where to send the browser, and which
/// transaction the session is bound to.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutInit {
    pub redirect_url: String,
    pub transaction_id: Uuid,
}

/// Owns the Inquiry -> Quote -> Booking -> Payment progression and the
/// consistency rules between the four entities. All cross-entity writes go
/// through atomic repository operations; this manager never holds a lock
/// across an await.
pub struct CharterLifecycle {
    inquiries: Arc<dyn InquiryRepository>,
    quotes: Arc<dyn QuoteRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    audit: Arc<dyn AuditLog>,
    checkout: Arc<dyn CheckoutGateway>,
    urls: CheckoutUrls,
}

impl CharterLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inquiries: Arc<dyn InquiryRepository>,
        quotes: Arc<dyn QuoteRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        audit: Arc<dyn AuditLog>,
        checkout: Arc<dyn CheckoutGateway>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            inquiries,
            quotes,
            bookings,
            payments,
            audit,
            checkout,
            urls,
        }
    }

    /// Audit writes are best-effort: the durable mutation has already
    /// committed by the time the trail is written, so a trail failure must
    /// not report the operation as failed (the caller would retry and
    /// duplicate it).
    async fn record_audit(&self, record: AuditRecord) {
        if let Err(err) = self.audit.record(&record).await {
            tracing::warn!(
                "Audit write failed for {} {} ({}): {}",
                record.entity_type,
                record.entity_id,
                record.action,
                err
            );
        }
    }

    /// Create a NEW inquiry for the acting customer. Validation is
    /// exhaustive: every violated rule is reported, not just the first.
    /// Never retried automatically; resubmission is an explicit user
    /// action.
    pub async fn submit_inquiry(
        &self,
        actor: &Identity,
        draft: InquiryDraft,
    ) -> LifecycleResult<Inquiry> {
        let violations = intake::validate(&draft, Utc::now());
        if !violations.is_empty() {
            return Err(LifecycleError::Validation(violations));
        }

        let inquiry = Inquiry::new(actor.id.clone(), draft);
        self.inquiries.insert_inquiry(&inquiry).await?;

        let event = InquirySubmittedEvent {
            inquiry_id: inquiry.id,
            customer_id: inquiry.customer_id.clone(),
            origin: inquiry.origin.clone(),
            destination: inquiry.destination.clone(),
            passengers: inquiry.passengers,
            timestamp: Utc::now().timestamp(),
        };
        self.record_audit(AuditRecord::new(
            "inquiry",
            inquiry.id,
            "SUBMITTED",
            &actor.id,
            serde_json::to_value(&event).unwrap_or_default(),
        ))
        .await;

        tracing::info!("Inquiry {} submitted by {}", inquiry.id, actor.id);
        Ok(inquiry)
    }

    /// Issue a PENDING quote against an inquiry (back-office action) and
    /// advance the inquiry to QUOTED.
    pub async fn issue_quote(&self, actor: &Identity, quote: Quote) -> LifecycleResult<Quote> {
        let inquiry = self
            .inquiries
            .get_inquiry(quote.inquiry_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if !inquiry.status.can_advance_to(InquiryStatus::Quoted)
            && inquiry.status != InquiryStatus::Quoted
        {
            return Err(LifecycleError::InvalidState(format!(
                "inquiry is {:?} and can no longer be quoted",
                inquiry.status
            )));
        }

        self.quotes.insert_quote(&quote).await?;
        if inquiry.status != InquiryStatus::Quoted {
            self.inquiries
                .update_inquiry_status(inquiry.id, InquiryStatus::Quoted)
                .await?;
        }

        let event = QuoteIssuedEvent {
            quote_id: quote.id,
            inquiry_id: quote.inquiry_id,
            total_cents: quote.total_cents,
            currency: quote.currency.clone(),
            timestamp: Utc::now().timestamp(),
        };
        self.record_audit(AuditRecord::new(
            "quote",
            quote.id,
            "ISSUED",
            &actor.id,
            serde_json::to_value(&event).unwrap_or_default(),
        ))
        .await;

        Ok(quote)
    }

    /// Close an inquiry. Allowed from any non-BOOKED state.
    pub async fn close_inquiry(&self, actor: &Identity, inquiry_id: Uuid) -> LifecycleResult<()> {
        let inquiry = self
            .inquiries
            .get_inquiry(inquiry_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if !inquiry.status.can_advance_to(InquiryStatus::Closed) {
            return Err(LifecycleError::InvalidState(format!(
                "inquiry is {:?} and cannot be closed",
                inquiry.status
            )));
        }

        self.inquiries
            .update_inquiry_status(inquiry_id, InquiryStatus::Closed)
            .await?;
        self.record_audit(AuditRecord::new(
            "inquiry",
            inquiry_id,
            "CLOSED",
            &actor.id,
            serde_json::Value::Null,
        ))
        .await;
        Ok(())
    }

    /// The core transition: accept a quote and create the booking.
    ///
    /// Precondition checks run in a fixed order (missing -> not owned ->
    /// expired -> not pending) and are never retried. The mutation itself
    /// is one atomic group behind `QuoteRepository::commit_acceptance`; the
    /// repository re-checks PENDING inside its transaction, so a retry
    /// after a transient failure cannot double-book.
    pub async fn accept_quote(
        &self,
        actor: &Identity,
        quote_id: Uuid,
    ) -> LifecycleResult<Booking> {
        let quote = self
            .quotes
            .get_quote(quote_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        let inquiry = self
            .inquiries
            .get_inquiry(quote.inquiry_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if inquiry.customer_id != actor.id {
            return Err(LifecycleError::Authorization);
        }

        if quote.is_expired(Utc::now()) {
            return Err(LifecycleError::InvalidState("quote expired".to_string()));
        }
        if quote.status != QuoteStatus::Pending {
            return Err(LifecycleError::InvalidState(
                "quote not pending".to_string(),
            ));
        }

        // Price is frozen here: the booking copies the quote total at this
        // instant and later quote edits never reach it.
        let booking = Booking::from_acceptance(&quote, &inquiry, reference::booking_reference());
        let acceptance = QuoteAcceptance {
            quote_id: quote.id,
            inquiry_id: inquiry.id,
            booking: booking.clone(),
        };

        match self.quotes.commit_acceptance(&acceptance).await {
            Ok(()) => {}
            // A concurrent acceptance won the CAS.
            Err(PersistenceError::Conflict(_)) => {
                return Err(LifecycleError::InvalidState(
                    "quote not pending".to_string(),
                ))
            }
            Err(err) => return Err(err.into()),
        }

        let event = QuoteAcceptedEvent {
            quote_id: quote.id,
            inquiry_id: inquiry.id,
            booking_id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            customer_id: actor.id.clone(),
            total_cents: booking.total_cents,
            timestamp: Utc::now().timestamp(),
        };
        self.record_audit(AuditRecord::new(
            "booking",
            booking.id,
            "QUOTE_ACCEPTED",
            &actor.id,
            serde_json::to_value(&event).unwrap_or_default(),
        ))
        .await;

        tracing::info!(
            "Quote {} accepted; booking {} ({})",
            quote.id,
            booking.id,
            booking.booking_reference
        );
        Ok(booking)
    }

    /// Start (or resume) checkout for a booking. Re-invocations for the
    /// same unsettled intent converge on one transaction via the
    /// deterministic idempotency key.
    pub async fn initiate_payment(
        &self,
        actor: &Identity,
        booking_id: Uuid,
    ) -> LifecycleResult<CheckoutInit> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if booking.customer_id != actor.id {
            return Err(LifecycleError::Authorization);
        }
        if booking.payment_state == PaymentState::Paid {
            return Err(LifecycleError::InvalidState(
                "booking already paid".to_string(),
            ));
        }

        let key = payment::idempotency_key(&actor.id, booking.quote_id);

        let tx = match self.payments.find_by_idempotency_key(&key).await? {
            Some(existing) if existing.status == PaymentTxStatus::Processing => existing,
            _ => {
                let tx = PaymentTransaction {
                    id: Uuid::new_v4(),
                    booking_id: booking.id,
                    quote_id: booking.quote_id,
                    customer_id: actor.id.clone(),
                    amount_cents: booking.total_cents,
                    currency: booking.currency.clone(),
                    status: PaymentTxStatus::Processing,
                    idempotency_key: key,
                    created_at: Utc::now(),
                };
                self.payments.insert_transaction(&tx).await?;
                tx
            }
        };

        let request = CheckoutRequest {
            transaction_id: tx.id,
            amount_cents: tx.amount_cents,
            currency: tx.currency.clone(),
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
        };

        let session = match self.checkout.create_checkout_session(&request).await {
            Ok(session) => session,
            Err(err) => {
                // Never leave a transaction stuck in PROCESSING for a
                // session that was never created.
                self.payments
                    .update_transaction_status(tx.id, PaymentTxStatus::Failed)
                    .await?;
                return Err(LifecycleError::PaymentGateway(err.to_string()));
            }
        };

        let event = CheckoutStartedEvent {
            transaction_id: tx.id,
            booking_id: booking.id,
            customer_id: actor.id.clone(),
            amount_cents: tx.amount_cents,
            currency: tx.currency.clone(),
            timestamp: Utc::now().timestamp(),
        };
        self.record_audit(AuditRecord::new(
            "payment_transaction",
            tx.id,
            "CHECKOUT_STARTED",
            &actor.id,
            serde_json::to_value(&event).unwrap_or_default(),
        ))
        .await;

        Ok(CheckoutInit {
            redirect_url: session.redirect_url,
            transaction_id: tx.id,
        })
    }

    /// Apply an asynchronous gateway confirmation. Idempotent: a
    /// transaction already in a terminal state absorbs redeliveries as a
    /// no-op.
    pub async fn confirm_payment(
        &self,
        actor: &Identity,
        transaction_id: Uuid,
        outcome: PaymentOutcome,
    ) -> LifecycleResult<()> {
        let tx = self
            .payments
            .get_transaction(transaction_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if tx.status.is_terminal() {
            tracing::info!(
                "Confirmation redelivered for transaction {} ({:?}); ignoring",
                tx.id,
                tx.status
            );
            return Ok(());
        }

        match outcome {
            PaymentOutcome::Failed => {
                // Booking stays UNPAID so the customer can retry checkout.
                self.payments
                    .update_transaction_status(tx.id, PaymentTxStatus::Failed)
                    .await?;
                self.record_audit(AuditRecord::new(
                    "payment_transaction",
                    tx.id,
                    "PAYMENT_FAILED",
                    &actor.id,
                    serde_json::Value::Null,
                ))
                .await;
                Ok(())
            }
            PaymentOutcome::Succeeded { amount_cents } => {
                let booking = self
                    .bookings
                    .get_booking(tx.booking_id)
                    .await?
                    .ok_or(LifecycleError::NotFound)?;

                if amount_cents != booking.total_cents {
                    // Leave the transaction in PROCESSING, flagged for
                    // manual reconciliation; the booking must not close on
                    // a partial or mismatched settlement.
                    let event = ReconciliationFlaggedEvent {
                        transaction_id: tx.id,
                        booking_id: booking.id,
                        expected_cents: booking.total_cents,
                        received_cents: amount_cents,
                        timestamp: Utc::now().timestamp(),
                    };
                    self.record_audit(AuditRecord::new(
                        "payment_transaction",
                        tx.id,
                        "RECONCILIATION_REQUIRED",
                        &actor.id,
                        serde_json::to_value(&event).unwrap_or_default(),
                    ))
                    .await;
                    return Err(LifecycleError::AmountMismatch {
                        expected: booking.total_cents,
                        received: amount_cents,
                    });
                }

                self.payments.settle(tx.id, booking.id).await?;

                let event = PaymentSettledEvent {
                    transaction_id: tx.id,
                    booking_id: booking.id,
                    amount_cents,
                    currency: tx.currency.clone(),
                    timestamp: Utc::now().timestamp(),
                };
                self.record_audit(AuditRecord::new(
                    "booking",
                    booking.id,
                    "PAID",
                    &actor.id,
                    serde_json::to_value(&event).unwrap_or_default(),
                ))
                .await;

                tracing::info!("Booking {} marked PAID via transaction {}", booking.id, tx.id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;
    use chrono::Duration;
    use volare_core::booking::BookingStatus;
    use volare_core::inquiry::RouteType;
    use volare_core::payment::MockCheckoutGateway;

    fn lifecycle_with(gateway: Arc<MemoryGateway>, checkout: MockCheckoutGateway) -> CharterLifecycle {
        CharterLifecycle::new(
            gateway.clone(),
            gateway.clone(),
            gateway.clone(),
            gateway.clone(),
            gateway,
            Arc::new(checkout),
            CheckoutUrls {
                success_url: "https://app.example.com/payments/success".to_string(),
                cancel_url: "https://app.example.com/payments/cancel".to_string(),
            },
        )
    }

    fn draft() -> InquiryDraft {
        InquiryDraft {
            route_type: RouteType::OneWay,
            origin: "New York".to_string(),
            destination: "London".to_string(),
            departure_at: Utc::now() + Duration::days(14),
            return_at: None,
            passengers: 1,
            purpose: "Business".to_string(),
            notes: None,
        }
    }

    fn pending_quote(inquiry_id: Uuid, total_cents: i64) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            inquiry_id,
            aircraft: "Gulfstream G650".to_string(),
            operator: "NorthStar Aviation".to_string(),
            base_cents: total_cents - 500_000,
            taxes_cents: 300_000,
            fees_cents: 200_000,
            total_cents,
            currency: "USD".to_string(),
            valid_until: Utc::now() + Duration::days(3),
            status: QuoteStatus::Pending,
            created_at: Utc::now(),
        }
    }

    async fn seeded(
        gateway: &Arc<MemoryGateway>,
        lifecycle: &CharterLifecycle,
        total_cents: i64,
    ) -> (Inquiry, Quote) {
        let customer = Identity::customer("customer-1");
        let inquiry = lifecycle.submit_inquiry(&customer, draft()).await.unwrap();
        let quote = pending_quote(inquiry.id, total_cents);
        gateway.put_quote(quote.clone());
        (inquiry, quote)
    }

    #[tokio::test]
    async fn test_happy_path_inquiry_to_paid_booking() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (inquiry, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        assert_eq!(inquiry.status, InquiryStatus::New);

        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        assert_eq!(booking.total_cents, 5_000_000);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_state, PaymentState::Unpaid);

        let stored_quote = gateway.get_quote(quote.id).await.unwrap().unwrap();
        assert_eq!(stored_quote.status, QuoteStatus::Accepted);
        let stored_inquiry = gateway.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(stored_inquiry.status, InquiryStatus::Booked);

        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        assert!(init.redirect_url.contains("checkout.example.com"));

        lifecycle
            .confirm_payment(
                &Identity::gateway(),
                init.transaction_id,
                PaymentOutcome::Succeeded {
                    amount_cents: 5_000_000,
                },
            )
            .await
            .unwrap();

        let paid = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_state, PaymentState::Paid);
        let tx = gateway
            .get_transaction(init.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, PaymentTxStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_submit_inquiry_reports_every_violation() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway, MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let bad = InquiryDraft {
            route_type: RouteType::RoundTrip,
            origin: "".to_string(),
            destination: "".to_string(),
            departure_at: Utc::now() - Duration::hours(1),
            return_at: None,
            passengers: 0,
            purpose: "Leisure".to_string(),
            notes: None,
        };

        match lifecycle.submit_inquiry(&customer, bad).await {
            Err(LifecycleError::Validation(violations)) => assert!(violations.len() >= 4),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_quote_cannot_be_accepted() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (inquiry, mut quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        quote.valid_until = Utc::now() - Duration::minutes(5);
        gateway.put_quote(quote.clone());

        match lifecycle.accept_quote(&customer, quote.id).await {
            Err(LifecycleError::InvalidState(reason)) => assert_eq!(reason, "quote expired"),
            other => panic!("expected InvalidState, got {:?}", other),
        }

        // No booking, inquiry untouched.
        assert!(gateway.list_bookings("customer-1").await.unwrap().is_empty());
        let stored = gateway.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InquiryStatus::New);
    }

    #[tokio::test]
    async fn test_acceptance_is_not_idempotent_twice() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        match lifecycle.accept_quote(&customer, quote.id).await {
            Err(LifecycleError::InvalidState(reason)) => assert_eq!(reason, "quote not pending"),
            other => panic!("expected InvalidState, got {:?}", other),
        }

        // Exactly one booking.
        assert_eq!(gateway.list_bookings("customer-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_competing_quotes_mutual_exclusion() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (inquiry, quote_a) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let quote_b = pending_quote(inquiry.id, 4_200_000);
        gateway.put_quote(quote_b.clone());

        lifecycle.accept_quote(&customer, quote_a.id).await.unwrap();

        // B was auto-rejected by A's acceptance.
        let stored_b = gateway.get_quote(quote_b.id).await.unwrap().unwrap();
        assert_eq!(stored_b.status, QuoteStatus::Rejected);

        match lifecycle.accept_quote(&customer, quote_b.id).await {
            Err(LifecycleError::InvalidState(reason)) => assert_eq!(reason, "quote not pending"),
            other => panic!("expected InvalidState, got {:?}", other),
        }

        // Exactly one won quote among siblings.
        let siblings = gateway.list_quotes_for_inquiry(inquiry.id).await.unwrap();
        let won = siblings
            .iter()
            .filter(|q| matches!(q.status, QuoteStatus::Accepted | QuoteStatus::Booked))
            .count();
        assert_eq!(won, 1);
        assert!(siblings
            .iter()
            .filter(|q| q.id != quote_a.id)
            .all(|q| q.status == QuoteStatus::Rejected));
    }

    #[tokio::test]
    async fn test_price_frozen_at_acceptance() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        // A later price edit to the quote must not reach the booking.
        let mut edited = gateway.get_quote(quote.id).await.unwrap().unwrap();
        edited.total_cents = 9_999_999;
        gateway.put_quote(edited);

        let stored = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 5_000_000);
    }

    #[tokio::test]
    async fn test_foreign_quote_is_denied() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let stranger = Identity::customer("customer-2");

        match lifecycle.accept_quote(&stranger, quote.id).await {
            Err(LifecycleError::Authorization) => {}
            other => panic!("expected Authorization, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_quote_is_not_found() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway, MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        match lifecycle.accept_quote(&customer, Uuid::new_v4()).await {
            Err(LifecycleError::NotFound) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initiate_payment_is_idempotent_while_processing() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        let first = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        let second = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();

        assert_eq!(first.transaction_id, second.transaction_id);
    }

    #[tokio::test]
    async fn test_paid_booking_rejects_checkout() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        lifecycle
            .confirm_payment(
                &Identity::gateway(),
                init.transaction_id,
                PaymentOutcome::Succeeded {
                    amount_cents: 5_000_000,
                },
            )
            .await
            .unwrap();

        match lifecycle.initiate_payment(&customer, booking.id).await {
            Err(LifecycleError::InvalidState(reason)) => {
                assert_eq!(reason, "booking already paid")
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gateway_failure_marks_transaction_failed() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::failing());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        match lifecycle.initiate_payment(&customer, booking.id).await {
            Err(LifecycleError::PaymentGateway(_)) => {}
            other => panic!("expected PaymentGateway, got {:?}", other),
        }

        // No orphaned PROCESSING record for this failure path.
        let key = payment::idempotency_key("customer-1", booking.quote_id);
        let tx = gateway.find_by_idempotency_key(&key).await.unwrap().unwrap();
        assert_eq!(tx.status, PaymentTxStatus::Failed);
    }

    #[tokio::test]
    async fn test_confirmation_is_idempotent() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();

        let outcome = PaymentOutcome::Succeeded {
            amount_cents: 5_000_000,
        };
        lifecycle
            .confirm_payment(&Identity::gateway(), init.transaction_id, outcome)
            .await
            .unwrap();
        // Redelivery is a no-op.
        lifecycle
            .confirm_payment(&Identity::gateway(), init.transaction_id, outcome)
            .await
            .unwrap();

        let tx = gateway
            .get_transaction(init.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, PaymentTxStatus::Succeeded);
        let paid = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_state, PaymentState::Paid);
    }

    #[tokio::test]
    async fn test_amount_mismatch_leaves_booking_unpaid() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();

        match lifecycle
            .confirm_payment(
                &Identity::gateway(),
                init.transaction_id,
                PaymentOutcome::Succeeded {
                    amount_cents: 4_000_000,
                },
            )
            .await
        {
            Err(LifecycleError::AmountMismatch { expected, received }) => {
                assert_eq!(expected, 5_000_000);
                assert_eq!(received, 4_000_000);
            }
            other => panic!("expected AmountMismatch, got {:?}", other),
        }

        let stored = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_state, PaymentState::Unpaid);
        // Flagged for manual reconciliation in the audit trail.
        assert!(gateway
            .audit_entries()
            .iter()
            .any(|e| e.action == "RECONCILIATION_REQUIRED"));
    }

    #[tokio::test]
    async fn test_failed_confirmation_allows_retry() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let first = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();

        lifecycle
            .confirm_payment(&Identity::gateway(), first.transaction_id, PaymentOutcome::Failed)
            .await
            .unwrap();

        let stored = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_state, PaymentState::Unpaid);

        // A fresh checkout creates a new transaction (the old one is
        // terminal).
        let second = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[tokio::test]
    async fn test_issue_quote_advances_inquiry() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");
        let admin = Identity::admin("ops-1");

        let inquiry = lifecycle.submit_inquiry(&customer, draft()).await.unwrap();
        let quote = pending_quote(inquiry.id, 3_000_000);
        lifecycle.issue_quote(&admin, quote).await.unwrap();

        let stored = gateway.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InquiryStatus::Quoted);

        // A second quote against the same inquiry keeps it QUOTED.
        let another = pending_quote(inquiry.id, 2_500_000);
        lifecycle.issue_quote(&admin, another).await.unwrap();
        let stored = gateway.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InquiryStatus::Quoted);
    }

    #[tokio::test]
    async fn test_close_inquiry_refuses_booked() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");
        let admin = Identity::admin("ops-1");

        let (inquiry, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        match lifecycle.close_inquiry(&admin, inquiry.id).await {
            Err(LifecycleError::InvalidState(_)) => {}
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_audit_trail_covers_the_lifecycle() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        lifecycle
            .confirm_payment(
                &Identity::gateway(),
                init.transaction_id,
                PaymentOutcome::Succeeded {
                    amount_cents: 5_000_000,
                },
            )
            .await
            .unwrap();

        let actions: Vec<String> = gateway
            .audit_entries()
            .iter()
            .map(|e| e.action.clone())
            .collect();
        for expected in ["SUBMITTED", "QUOTE_ACCEPTED", "CHECKOUT_STARTED", "PAID"] {
            assert!(actions.iter().any(|a| a == expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_reinitiation_converges_after_failed_attempt() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = lifecycle_with(gateway.clone(), MockCheckoutGateway::new());
        let customer = Identity::customer("customer-1");

        let (_, quote) = seeded(&gateway, &lifecycle, 5_000_000).await;
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();

        let first = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        lifecycle
            .confirm_payment(
                &Identity::gateway(),
                first.transaction_id,
                PaymentOutcome::Failed,
            )
            .await
            .unwrap();

        // The FAILED row now shares the idempotency key with the fresh
        // attempt; every re-initiation must converge on the live
        // transaction, never mint a competitor.
        let second = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        assert_ne!(first.transaction_id, second.transaction_id);

        for round in 0..20 {
            let again = lifecycle
                .initiate_payment(&customer, booking.id)
                .await
                .unwrap();
            assert_eq!(
                again.transaction_id, second.transaction_id,
                "round {}: re-initiation returned a different transaction",
                round
            );
        }
    }

    struct FailingAudit;

    #[async_trait::async_trait]
    impl AuditLog for FailingAudit {
        async fn record(&self, _entry: &AuditRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("audit store down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_audit_outage_does_not_fail_committed_writes() {
        let gateway = Arc::new(MemoryGateway::new());
        let lifecycle = CharterLifecycle::new(
            gateway.clone(),
            gateway.clone(),
            gateway.clone(),
            gateway.clone(),
            Arc::new(FailingAudit),
            Arc::new(MockCheckoutGateway::new()),
            CheckoutUrls {
                success_url: "https://app.example.com/payments/success".to_string(),
                cancel_url: "https://app.example.com/payments/cancel".to_string(),
            },
        );
        let customer = Identity::customer("customer-1");

        let inquiry = lifecycle.submit_inquiry(&customer, draft()).await.unwrap();
        let quote = pending_quote(inquiry.id, 5_000_000);
        gateway.put_quote(quote.clone());

        // Each mutation commits before its trail entry; the outage must
        // not surface as an error the caller would retry.
        let booking = lifecycle.accept_quote(&customer, quote.id).await.unwrap();
        let stored = gateway.get_quote(quote.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuoteStatus::Accepted);

        let init = lifecycle
            .initiate_payment(&customer, booking.id)
            .await
            .unwrap();
        lifecycle
            .confirm_payment(
                &Identity::gateway(),
                init.transaction_id,
                PaymentOutcome::Succeeded {
                    amount_cents: 5_000_000,
                },
            )
            .await
            .unwrap();
        let paid = gateway.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_state, PaymentState::Paid);
    }
}
