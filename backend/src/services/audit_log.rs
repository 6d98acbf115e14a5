use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::StoreError,
    models::audit_log::{AuditAction, AuditLogEntry},
    repositories::AuditLogStore,
    types::UserId,
    utils::RequestMeta,
};

/// Who triggered an event and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub user_id: Option<UserId>,
    pub meta: RequestMeta,
    pub request_id: Option<String>,
}

impl AuditContext {
    pub fn new(user_id: Option<UserId>, meta: RequestMeta, request_id: Option<String>) -> Self {
        Self {
            user_id,
            meta,
            request_id,
        }
    }

    /// Context for background jobs with no request behind them.
    pub fn system() -> Self {
        Self::new(None, RequestMeta::unknown(), None)
    }

    pub fn entry(&self, action: AuditAction, details: Value) -> AuditLogEntry {
        AuditLogEntry::new(action, self.user_id, &self.meta)
            .with_details(details)
            .with_request_id(self.request_id.clone())
    }
}

/// Records security events. A failed write never fails the operation being described.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditLogStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Writes the entry and waits for the store. The error is already logged;
    /// callers may discard it.
    pub async fn record(&self, entry: AuditLogEntry) -> Result<(), StoreError> {
        write_entry(self.store.as_ref(), &entry).await
    }

    /// Fire-and-forget variant used on request paths.
    pub fn record_detached(&self, entry: AuditLogEntry) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let _ = write_entry(store.as_ref(), &entry).await;
        });
    }
}

async fn write_entry(store: &dyn AuditLogStore, entry: &AuditLogEntry) -> Result<(), StoreError> {
    match store.append(entry).await {
        Ok(id) => {
            tracing::debug!(
                audit_log_id = %id,
                action = %entry.action,
                "Recorded audit log"
            );
            Ok(())
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                action = %entry.action,
                user_id = ?entry.user_id,
                "Failed to record audit log"
            );
            Err(err)
        }
    }
}
