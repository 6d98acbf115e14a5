use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::error::StoreError;
use crate::models::audit_log::AuditLogEntry;
use crate::types::AuditLogId;

/// Append-only sink for audit entries: no update or delete path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogId, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for PgAuditLogRepository {
    async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogId, StoreError> {
        let id = AuditLogId::new();
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, occurred_at, user_id, action, details, ip_address, user_agent, request_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(entry.timestamp)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(Json(&entry.details))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.request_id)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}
