use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use volare_core::inquiry::{Inquiry, InquiryStatus, RouteType};
use volare_core::repository::{InquiryRepository, RepoResult};
use volare_core::PersistenceError;

use crate::database::persistence_error;

pub struct PgInquiryRepository {
    pool: PgPool,
}

impl PgInquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InquiryRow {
    id: Uuid,
    customer_id: String,
    route_type: String,
    origin: String,
    destination: String,
    departure_at: DateTime<Utc>,
    return_at: Option<DateTime<Utc>>,
    passengers: i32,
    purpose: String,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl InquiryRow {
    /// Rows are mapped to the typed entity at the boundary; a status the
    /// code does not know is treated as corruption, not passed through.
    fn into_inquiry(self) -> Result<Inquiry, PersistenceError> {
        let status = InquiryStatus::parse(&self.status).ok_or_else(|| {
            PersistenceError::Unavailable(format!("unrecognized inquiry status {}", self.status))
        })?;
        let route_type = RouteType::parse(&self.route_type).ok_or_else(|| {
            PersistenceError::Unavailable(format!("unrecognized route type {}", self.route_type))
        })?;
        Ok(Inquiry {
            id: self.id,
            customer_id: self.customer_id,
            route_type,
            origin: self.origin,
            destination: self.destination,
            departure_at: self.departure_at,
            return_at: self.return_at,
            passengers: self.passengers.max(0) as u32,
            purpose: self.purpose,
            notes: self.notes,
            status,
            created_at: self.created_at,
        })
    }
}

const INQUIRY_COLUMNS: &str = "id, customer_id, route_type, origin, destination, departure_at, return_at, passengers, purpose, notes, status, created_at";

#[async_trait]
impl InquiryRepository for PgInquiryRepository {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inquiries (id, customer_id, route_type, origin, destination, departure_at, return_at, passengers, purpose, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(inquiry.id)
        .bind(&inquiry.customer_id)
        .bind(inquiry.route_type.as_str())
        .bind(&inquiry.origin)
        .bind(&inquiry.destination)
        .bind(inquiry.departure_at)
        .bind(inquiry.return_at)
        .bind(inquiry.passengers as i32)
        .bind(&inquiry.purpose)
        .bind(&inquiry.notes)
        .bind(inquiry.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(())
    }

    async fn get_inquiry(&self, id: Uuid) -> RepoResult<Option<Inquiry>> {
        let row: Option<InquiryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM inquiries WHERE id = $1",
            INQUIRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;

        row.map(InquiryRow::into_inquiry).transpose()
    }

    async fn list_inquiries(&self, customer_id: &str) -> RepoResult<Vec<Inquiry>> {
        let rows: Vec<InquiryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM inquiries WHERE customer_id = $1 ORDER BY created_at DESC",
            INQUIRY_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        rows.into_iter().map(InquiryRow::into_inquiry).collect()
    }

    async fn update_inquiry_status(&self, id: Uuid, status: InquiryStatus) -> RepoResult<()> {
        sqlx::query("UPDATE inquiries SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(())
    }
}
