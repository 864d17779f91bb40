use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use volare_core::payment::{PaymentTransaction, PaymentTxStatus};
use volare_core::repository::{PaymentRepository, RepoResult};
use volare_core::PersistenceError;

use crate::database::persistence_error;

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    quote_id: Uuid,
    customer_id: String,
    amount_cents: i64,
    currency: String,
    status: String,
    idempotency_key: String,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_transaction(self) -> Result<PaymentTransaction, PersistenceError> {
        let status = PaymentTxStatus::parse(&self.status).ok_or_else(|| {
            PersistenceError::Unavailable(format!(
                "unrecognized payment status {}",
                self.status
            ))
        })?;
        Ok(PaymentTransaction {
            id: self.id,
            booking_id: self.booking_id,
            quote_id: self.quote_id,
            customer_id: self.customer_id,
            amount_cents: self.amount_cents,
            currency: self.currency,
            status,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, booking_id, quote_id, customer_id, amount_cents, currency, status, idempotency_key, created_at";

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert_transaction(&self, tx: &PaymentTransaction) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (id, booking_id, quote_id, customer_id, amount_cents, currency, status, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(tx.id)
        .bind(tx.booking_id)
        .bind(tx.quote_id)
        .bind(&tx.customer_id)
        .bind(tx.amount_cents)
        .bind(&tx.currency)
        .bind(tx.status.as_str())
        .bind(&tx.idempotency_key)
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> RepoResult<Option<PaymentTransaction>> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_transactions WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;

        row.map(PaymentRow::into_transaction).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> RepoResult<Option<PaymentTransaction>> {
        // A key can accumulate terminal rows from failed attempts; only the
        // live transaction is a reusable intent.
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_transactions WHERE idempotency_key = $1 AND status = 'PROCESSING' ORDER BY created_at DESC LIMIT 1",
            PAYMENT_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;

        row.map(PaymentRow::into_transaction).transpose()
    }

    async fn update_transaction_status(
        &self,
        id: Uuid,
        status: PaymentTxStatus,
    ) -> RepoResult<()> {
        sqlx::query(
            "UPDATE payment_transactions SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(())
    }

    async fn settle(&self, transaction_id: Uuid, booking_id: Uuid) -> RepoResult<()> {
        let mut txn = self.pool.begin().await.map_err(persistence_error)?;

        // Both writes or neither: the booking can only read PAID if a
        // SUCCEEDED transaction committed with it.
        let updated = sqlx::query(
            "UPDATE payment_transactions SET status = 'SUCCEEDED', updated_at = NOW() WHERE id = $1 AND status = 'PROCESSING'",
        )
        .bind(transaction_id)
        .execute(&mut *txn)
        .await
        .map_err(persistence_error)?;

        if updated.rows_affected() == 0 {
            return Err(PersistenceError::Conflict(format!(
                "transaction {} is not processing",
                transaction_id
            )));
        }

        sqlx::query(
            "UPDATE bookings SET payment_state = 'PAID', updated_at = NOW() WHERE id = $1",
        )
        .bind(booking_id)
        .execute(&mut *txn)
        .await
        .map_err(persistence_error)?;

        txn.commit().await.map_err(persistence_error)?;
        Ok(())
    }
}
