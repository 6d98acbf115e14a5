pub mod audit_log;
pub mod game_access;
pub mod identity;
pub mod tab_session;

pub use audit_log::{AuditContext, AuditLogger};
pub use game_access::{AccessResult, DenialReason, GameAccessValidator};
pub use identity::{AuthenticatedUser, IdentityError, IdentityProvider, JwtIdentityProvider};
pub use tab_session::{TabSessionError, TabSessionManager};
