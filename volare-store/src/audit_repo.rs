use async_trait::async_trait;
use sqlx::PgPool;

use volare_core::repository::{AuditLog, AuditRecord, RepoResult};

use crate::database::persistence_error;

pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn record(&self, entry: &AuditRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (id, entity_type, entity_id, action, actor, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.action)
        .bind(&entry.actor)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(())
    }
}
