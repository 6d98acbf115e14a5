//! Tab session persistence.
//!
//! Every status transition is a single conditional statement so concurrent
//! requests for the same token cannot move a terminal row back to `active`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::StoreError;
use crate::models::tab_session::{TabSession, TabSessionRow, TabSessionStatus};
use crate::types::UserId;

const TABLE_NAME: &str = "tab_sessions";
const SELECT_COLUMNS: &str =
    "id, user_id, created_at, last_activity_at, expires_at, status, terminated_at";

/// Result of an unconditional invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationOutcome {
    pub previous_status: TabSessionStatus,
    pub user_id: UserId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabSessionStore: Send + Sync {
    async fn insert(&self, session: &TabSession) -> Result<(), StoreError>;

    async fn find(&self, id: &str) -> Result<Option<TabSession>, StoreError>;

    /// Sets `last_activity_at = now` (and `expires_at` when given) only if the row
    /// is `active` and `expires_at >= now`. Returns whether a row changed.
    async fn touch_if_live(
        &self,
        id: &str,
        now: DateTime<Utc>,
        new_expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    /// Moves an `active` row whose `expires_at < now` to `expired`.
    /// Returns whether this call performed the transition.
    async fn expire_if_lapsed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Sets `invalidated` regardless of the current status.
    /// Returns `None` when no row exists.
    async fn invalidate(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InvalidationOutcome>, StoreError>;

    /// Deletes terminal rows whose `terminated_at` is older than `cutoff`, plus
    /// never-refreshed rows that lapsed before `cutoff`.
    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgTabSessionRepository {
    pool: PgPool,
}

impl PgTabSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvalidationRow {
    previous_status: String,
    user_id: UserId,
}

#[async_trait]
impl TabSessionStore for PgTabSessionRepository {
    async fn insert(&self, session: &TabSession) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query(&query)
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.created_at)
            .bind(session.last_activity_at)
            .bind(session.expires_at)
            .bind(session.status.as_str())
            .bind(session.terminated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<TabSession>, StoreError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let row = sqlx::query_as::<_, TabSessionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TabSession::try_from)
            .transpose()
            .map_err(StoreError::InvalidRecord)
    }

    async fn touch_if_live(
        &self,
        id: &str,
        now: DateTime<Utc>,
        new_expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tab_sessions
            SET last_activity_at = $2,
                expires_at = COALESCE($3, expires_at)
            WHERE id = $1
              AND status = 'active'
              AND expires_at >= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(new_expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_if_lapsed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tab_sessions
            SET status = 'expired',
                terminated_at = COALESCE(terminated_at, $2)
            WHERE id = $1
              AND status = 'active'
              AND expires_at < $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn invalidate(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InvalidationOutcome>, StoreError> {
        // The CTE locks the row so the returned status is the one this update replaced.
        let row = sqlx::query_as::<_, InvalidationRow>(
            r#"
            WITH previous AS (
                SELECT id, status FROM tab_sessions WHERE id = $1 FOR UPDATE
            )
            UPDATE tab_sessions AS t
            SET status = 'invalidated',
                terminated_at = COALESCE(t.terminated_at, $2)
            FROM previous
            WHERE t.id = previous.id
            RETURNING previous.status AS previous_status, t.user_id
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(InvalidationOutcome {
                previous_status: row
                    .previous_status
                    .parse()
                    .map_err(StoreError::InvalidRecord)?,
                user_id: row.user_id,
            })
        })
        .transpose()
    }

    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tab_sessions
            WHERE (status <> 'active' AND terminated_at < $1)
               OR (status = 'active' AND expires_at < $1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
