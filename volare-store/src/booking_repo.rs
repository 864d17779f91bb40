use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use volare_core::booking::{Booking, BookingStatus, FlightDetails, PaymentState};
use volare_core::repository::{BookingRepository, RepoResult};
use volare_core::PersistenceError;

use crate::database::persistence_error;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_reference: String,
    quote_id: Uuid,
    customer_id: String,
    total_cents: i64,
    currency: String,
    status: String,
    payment_state: String,
    origin: String,
    destination: String,
    departure_at: DateTime<Utc>,
    return_at: Option<DateTime<Utc>>,
    aircraft: String,
    operator: String,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, PersistenceError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            PersistenceError::Unavailable(format!("unrecognized booking status {}", self.status))
        })?;
        let payment_state = PaymentState::parse(&self.payment_state).ok_or_else(|| {
            PersistenceError::Unavailable(format!(
                "unrecognized payment state {}",
                self.payment_state
            ))
        })?;
        Ok(Booking {
            id: self.id,
            booking_reference: self.booking_reference,
            quote_id: self.quote_id,
            customer_id: self.customer_id,
            total_cents: self.total_cents,
            currency: self.currency,
            status,
            payment_state,
            flight: FlightDetails {
                origin: self.origin,
                destination: self.destination,
                departure_at: self.departure_at,
                return_at: self.return_at,
                aircraft: self.aircraft,
                operator: self.operator,
            },
            created_at: self.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, booking_reference, quote_id, customer_id, total_cents, currency, status, payment_state, origin, destination, departure_at, return_at, aircraft, operator, created_at";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_bookings(&self, customer_id: &str) -> RepoResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE customer_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}
