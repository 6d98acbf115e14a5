pub mod audit_log;
pub mod game_link;
pub mod tab_session;

pub use audit_log::{AuditLogStore, PgAuditLogRepository};
pub use game_link::{GameLinkStore, PgGameLinkRepository};
pub use tab_session::{InvalidationOutcome, PgTabSessionRepository, TabSessionStore};
