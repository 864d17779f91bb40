use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use volare_core::quote::{Quote, QuoteStatus};
use volare_core::repository::{QuoteAcceptance, QuoteRepository, RepoResult};
use volare_core::PersistenceError;

use crate::database::persistence_error;

pub struct PgQuoteRepository {
    pool: PgPool,
}

impl PgQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    inquiry_id: Uuid,
    aircraft: String,
    operator: String,
    base_cents: i64,
    taxes_cents: i64,
    fees_cents: i64,
    total_cents: i64,
    currency: String,
    valid_until: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

impl QuoteRow {
    fn into_quote(self) -> Result<Quote, PersistenceError> {
        let status = QuoteStatus::parse(&self.status).ok_or_else(|| {
            PersistenceError::Unavailable(format!("unrecognized quote status {}", self.status))
        })?;
        Ok(Quote {
            id: self.id,
            inquiry_id: self.inquiry_id,
            aircraft: self.aircraft,
            operator: self.operator,
            base_cents: self.base_cents,
            taxes_cents: self.taxes_cents,
            fees_cents: self.fees_cents,
            total_cents: self.total_cents,
            currency: self.currency,
            valid_until: self.valid_until,
            status,
            created_at: self.created_at,
        })
    }
}

const QUOTE_COLUMNS: &str = "id, inquiry_id, aircraft, operator, base_cents, taxes_cents, fees_cents, total_cents, currency, valid_until, status, created_at";

#[async_trait]
impl QuoteRepository for PgQuoteRepository {
    async fn insert_quote(&self, quote: &Quote) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quotes (id, inquiry_id, aircraft, operator, base_cents, taxes_cents, fees_cents, total_cents, currency, valid_until, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(quote.id)
        .bind(quote.inquiry_id)
        .bind(&quote.aircraft)
        .bind(&quote.operator)
        .bind(quote.base_cents)
        .bind(quote.taxes_cents)
        .bind(quote.fees_cents)
        .bind(quote.total_cents)
        .bind(&quote.currency)
        .bind(quote.valid_until)
        .bind(quote.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>> {
        let row: Option<QuoteRow> =
            sqlx::query_as(&format!("SELECT {} FROM quotes WHERE id = $1", QUOTE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence_error)?;

        row.map(QuoteRow::into_quote).transpose()
    }

    async fn list_quotes_for_inquiry(&self, inquiry_id: Uuid) -> RepoResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotes WHERE inquiry_id = $1 ORDER BY created_at ASC",
            QUOTE_COLUMNS
        ))
        .bind(inquiry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        rows.into_iter().map(QuoteRow::into_quote).collect()
    }

    async fn commit_acceptance(&self, acceptance: &QuoteAcceptance) -> RepoResult<()> {
        let mut txn = self.pool.begin().await.map_err(persistence_error)?;

        // CAS: the status predicate re-checks PENDING inside the
        // transaction. Zero rows affected means a concurrent acceptance
        // won; the whole group rolls back on drop.
        let updated = sqlx::query(
            "UPDATE quotes SET status = 'ACCEPTED', updated_at = NOW() WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(acceptance.quote_id)
        .execute(&mut *txn)
        .await
        .map_err(persistence_error)?;

        if updated.rows_affected() == 0 {
            return Err(PersistenceError::Conflict(format!(
                "quote {} is no longer pending",
                acceptance.quote_id
            )));
        }

        sqlx::query(
            "UPDATE quotes SET status = 'REJECTED', updated_at = NOW() WHERE inquiry_id = $1 AND id <> $2 AND status = 'PENDING'",
        )
        .bind(acceptance.inquiry_id)
        .bind(acceptance.quote_id)
        .execute(&mut *txn)
        .await
        .map_err(persistence_error)?;

        sqlx::query("UPDATE inquiries SET status = 'BOOKED', updated_at = NOW() WHERE id = $1")
            .bind(acceptance.inquiry_id)
            .execute(&mut *txn)
            .await
            .map_err(persistence_error)?;

        let booking = &acceptance.booking;
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_reference, quote_id, customer_id, total_cents, currency, status, payment_state, origin, destination, departure_at, return_at, aircraft, operator)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_reference)
        .bind(booking.quote_id)
        .bind(&booking.customer_id)
        .bind(booking.total_cents)
        .bind(&booking.currency)
        .bind(booking.status.as_str())
        .bind(booking.payment_state.as_str())
        .bind(&booking.flight.origin)
        .bind(&booking.flight.destination)
        .bind(booking.flight.departure_at)
        .bind(booking.flight.return_at)
        .bind(&booking.flight.aircraft)
        .bind(&booking.flight.operator)
        .execute(&mut *txn)
        .await
        .map_err(persistence_error)?;

        txn.commit().await.map_err(persistence_error)?;
        Ok(())
    }
}
