//! Per-browser-tab session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TabSessionStatus {
    Active,
    Expired,
    Invalidated,
}

impl TabSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabSessionStatus::Active => "active",
            TabSessionStatus::Expired => "expired",
            TabSessionStatus::Invalidated => "invalidated",
        }
    }
}

impl fmt::Display for TabSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabSessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TabSessionStatus::Active),
            "expired" => Ok(TabSessionStatus::Expired),
            "invalidated" => Ok(TabSessionStatus::Invalidated),
            other => Err(format!("unknown tab session status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TabSession {
    /// Opaque random token; also the value of the `x-tab-session` header.
    pub id: String,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: TabSessionStatus,
    /// First moment the record became terminal; retention is measured from here.
    pub terminated_at: Option<DateTime<Utc>>,
}

impl TabSession {
    /// True when the record may still be used: `active` and not lapsed at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TabSessionStatus::Active && now <= self.expires_at
    }
}

/// Raw row shape of the `tab_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct TabSessionRow {
    pub id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
    pub terminated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TabSessionRow> for TabSession {
    type Error = String;

    fn try_from(row: TabSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
            terminated_at: row.terminated_at,
        })
    }
}

/// Body returned when a tab session is minted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TabSessionCreated {
    pub tab_session_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&TabSession> for TabSessionCreated {
    fn from(session: &TabSession) -> Self {
        Self {
            tab_session_id: session.id.clone(),
            expires_at: session.expires_at,
        }
    }
}
