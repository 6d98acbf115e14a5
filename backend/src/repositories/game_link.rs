//! Game link lookups.
//!
//! Codes are matched on `lower(code)`; a unique index on that expression keeps
//! one link per code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::game_link::{GameLink, GameLinkRow};
use crate::types::{GameLinkId, UserId};

const TABLE_NAME: &str = "game_links";
const SELECT_COLUMNS: &str = "id, code, owner_user_id, name, vocabulary_list_id, enabled_games, \
     is_active, expires_at, mode_configs, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameLinkStore: Send + Sync {
    /// `code` must already be normalized (trimmed, lowercase).
    async fn find_by_code(&self, code: &str) -> Result<Option<GameLink>, StoreError>;

    async fn find_by_id(&self, id: GameLinkId) -> Result<Option<GameLink>, StoreError>;

    /// Flips the kill switch for a link owned by `owner`. Returns the updated link,
    /// or `None` if no link with that id and owner exists.
    async fn set_active(
        &self,
        id: GameLinkId,
        owner: UserId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<GameLink>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgGameLinkRepository {
    pool: PgPool,
}

impl PgGameLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn base_select_query() -> String {
        format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME)
    }
}

fn into_link(row: Option<GameLinkRow>) -> Result<Option<GameLink>, StoreError> {
    row.map(GameLink::try_from)
        .transpose()
        .map_err(StoreError::InvalidRecord)
}

#[async_trait]
impl GameLinkStore for PgGameLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<GameLink>, StoreError> {
        let query = format!("{} WHERE lower(code) = $1", Self::base_select_query());
        let row = sqlx::query_as::<_, GameLinkRow>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        into_link(row)
    }

    async fn find_by_id(&self, id: GameLinkId) -> Result<Option<GameLink>, StoreError> {
        let query = format!("{} WHERE id = $1", Self::base_select_query());
        let row = sqlx::query_as::<_, GameLinkRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        into_link(row)
    }

    async fn set_active(
        &self,
        id: GameLinkId,
        owner: UserId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<GameLink>, StoreError> {
        let query = format!(
            "UPDATE {} SET is_active = $3, updated_at = $4 \
             WHERE id = $1 AND owner_user_id = $2 \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, GameLinkRow>(&query)
            .bind(id)
            .bind(owner)
            .bind(is_active)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        into_link(row)
    }
}
