use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::{types::UserId, utils::RequestMeta};

/// Closed vocabulary of security-relevant actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LoginSuccess,
    LoginFailed,
    Logout,
    SessionExpired,
    SessionInvalidated,
    PasswordChanged,
    UserCreated,
    UserUpdated,
    UserDeleted,
    GameLinkCreated,
    GameLinkUpdated,
    GameLinkDeleted,
    VocabularyListCreated,
    VocabularyListUpdated,
    VocabularyListDeleted,
    UnauthorizedAccessAttempt,
}

impl AuditAction {
    pub const ALL: [AuditAction; 16] = [
        AuditAction::LoginSuccess,
        AuditAction::LoginFailed,
        AuditAction::Logout,
        AuditAction::SessionExpired,
        AuditAction::SessionInvalidated,
        AuditAction::PasswordChanged,
        AuditAction::UserCreated,
        AuditAction::UserUpdated,
        AuditAction::UserDeleted,
        AuditAction::GameLinkCreated,
        AuditAction::GameLinkUpdated,
        AuditAction::GameLinkDeleted,
        AuditAction::VocabularyListCreated,
        AuditAction::VocabularyListUpdated,
        AuditAction::VocabularyListDeleted,
        AuditAction::UnauthorizedAccessAttempt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSuccess => "login_success",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::SessionExpired => "session_expired",
            AuditAction::SessionInvalidated => "session_invalidated",
            AuditAction::PasswordChanged => "password_changed",
            AuditAction::UserCreated => "user_created",
            AuditAction::UserUpdated => "user_updated",
            AuditAction::UserDeleted => "user_deleted",
            AuditAction::GameLinkCreated => "game_link_created",
            AuditAction::GameLinkUpdated => "game_link_updated",
            AuditAction::GameLinkDeleted => "game_link_deleted",
            AuditAction::VocabularyListCreated => "vocabulary_list_created",
            AuditAction::VocabularyListUpdated => "vocabulary_list_updated",
            AuditAction::VocabularyListDeleted => "vocabulary_list_deleted",
            AuditAction::UnauthorizedAccessAttempt => "unauthorized_access_attempt",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown audit action: {}", s))
    }
}

/// One security event as handed to the audit logger.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub details: Value,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: Option<String>,
}

impl AuditLogEntry {
    pub fn new(action: AuditAction, user_id: Option<UserId>, meta: &RequestMeta) -> Self {
        Self {
            user_id,
            action,
            details: Value::Object(Default::default()),
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
            timestamp: Utc::now(),
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
