//! Tab session lifecycle: mint, refresh, invalidate, validity checks.
//!
//! Status only ever moves `active -> expired` or `* -> invalidated`. Every
//! transition goes through a conditional store update, so a stale read here
//! can never resurrect a terminal record.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    config::RenewalStrategy,
    error::StoreError,
    models::{
        audit_log::AuditAction,
        tab_session::{TabSession, TabSessionStatus},
    },
    repositories::TabSessionStore,
    services::audit_log::{AuditContext, AuditLogger},
    types::UserId,
    utils::Clock,
};

const TAB_SESSION_TOKEN_BYTES: usize = 32;
const TOKEN_PREFIX_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum TabSessionError {
    #[error("Tab session not found")]
    NotFound,
    #[error("Tab session expired")]
    Expired,
    #[error("Tab session invalidated")]
    Invalidated,
    #[error("Tab session timestamp out of range")]
    OutOfRange,
    #[error("Tab session storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}

pub struct TabSessionManager {
    store: Arc<dyn TabSessionStore>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    renewal: RenewalStrategy,
}

impl TabSessionManager {
    pub fn new(
        store: Arc<dyn TabSessionStore>,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        renewal: RenewalStrategy,
    ) -> Self {
        Self {
            store,
            audit,
            clock,
            ttl,
            renewal,
        }
    }

    pub async fn create(&self, user_id: UserId) -> Result<TabSession, TabSessionError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(TabSessionError::OutOfRange)?;
        let session = TabSession {
            id: generate_tab_session_id(),
            user_id,
            created_at: now,
            last_activity_at: now,
            expires_at,
            status: TabSessionStatus::Active,
            terminated_at: None,
        };
        self.store.insert(&session).await?;
        tracing::debug!(
            user_id = %user_id,
            tab_session = %token_prefix(&session.id),
            expires_at = %session.expires_at,
            "Created tab session"
        );
        Ok(session)
    }

    /// Extends a live session. A lapsed session is moved to `expired` and
    /// reported as such; a terminal session is never touched.
    pub async fn refresh(&self, id: &str) -> Result<(), TabSessionError> {
        // Two attempts cover a concurrent sliding refresh landing between
        // the conditional touch and the follow-up read.
        for _ in 0..2 {
            let now = self.clock.now();
            if self
                .store
                .touch_if_live(id, now, self.renewed_expiry(now))
                .await?
            {
                return Ok(());
            }

            let session = self.store.find(id).await?.ok_or(TabSessionError::NotFound)?;
            match session.status {
                TabSessionStatus::Invalidated => return Err(TabSessionError::Invalidated),
                TabSessionStatus::Expired => return Err(TabSessionError::Expired),
                TabSessionStatus::Active if session.is_live_at(now) => continue,
                TabSessionStatus::Active => {
                    if self.store.expire_if_lapsed(id, now).await? {
                        tracing::info!(
                            user_id = %session.user_id,
                            tab_session = %token_prefix(id),
                            "Tab session expired"
                        );
                        let mut entry = AuditContext::system()
                            .entry(
                                AuditAction::SessionExpired,
                                json!({
                                    "tabSession": token_prefix(id),
                                    "expiresAt": session.expires_at,
                                }),
                            )
                            .at(now);
                        entry.user_id = Some(session.user_id);
                        self.audit.record_detached(entry);
                    }
                    return Err(TabSessionError::Expired);
                }
            }
        }
        Err(TabSessionError::Expired)
    }

    /// Terminates a session regardless of its current status. Idempotent:
    /// a second call succeeds without emitting another audit event.
    pub async fn invalidate(&self, id: &str, ctx: &AuditContext) -> Result<(), TabSessionError> {
        let now = self.clock.now();
        let outcome = self
            .store
            .invalidate(id, now)
            .await?
            .ok_or(TabSessionError::NotFound)?;

        if outcome.previous_status != TabSessionStatus::Invalidated {
            tracing::info!(
                user_id = %outcome.user_id,
                tab_session = %token_prefix(id),
                previous_status = %outcome.previous_status,
                "Tab session invalidated"
            );
            let mut entry = ctx
                .entry(
                    AuditAction::SessionInvalidated,
                    json!({
                        "tabSession": token_prefix(id),
                        "previousStatus": outcome.previous_status.as_str(),
                        "sessionUserId": outcome.user_id.to_string(),
                    }),
                )
                .at(now);
            if entry.user_id.is_none() {
                entry.user_id = Some(outcome.user_id);
            }
            self.audit.record_detached(entry);
        }
        Ok(())
    }

    /// Read-only validity check: `active` and not lapsed.
    pub async fn is_active(&self, id: &str) -> Result<bool, TabSessionError> {
        let now = self.clock.now();
        Ok(self
            .store
            .find(id)
            .await?
            .map(|session| session.is_live_at(now))
            .unwrap_or(false))
    }

    /// Like [`is_active`](Self::is_active), but a live session owned by another
    /// user also counts as inactive.
    pub async fn is_active_for(
        &self,
        id: &str,
        user_id: UserId,
    ) -> Result<bool, TabSessionError> {
        let now = self.clock.now();
        Ok(self
            .store
            .find(id)
            .await?
            .map(|session| session.user_id == user_id && session.is_live_at(now))
            .unwrap_or(false))
    }

    /// Best-effort activity bump for a session that was just validated.
    pub async fn touch(&self, id: &str) -> Result<bool, TabSessionError> {
        let now = self.clock.now();
        Ok(self
            .store
            .touch_if_live(id, now, self.renewed_expiry(now))
            .await?)
    }

    /// Deletes terminal records older than `retention`.
    pub async fn purge_expired(&self, retention: Duration) -> Result<u64, TabSessionError> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(retention)
            .ok_or(TabSessionError::OutOfRange)?;
        let deleted = self.store.purge_terminated_before(cutoff).await?;
        tracing::info!(deleted, cutoff = %cutoff, "Purged tab sessions");
        Ok(deleted)
    }

    fn renewed_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.renewal {
            RenewalStrategy::Fixed => None,
            RenewalStrategy::Sliding => now.checked_add_signed(self.ttl),
        }
    }
}

fn generate_tab_session_id() -> String {
    let mut bytes = [0u8; TAB_SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Tokens are bearer credentials; logs only ever carry a prefix.
fn token_prefix(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(TOKEN_PREFIX_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(id.len());
    &id[..end]
}
