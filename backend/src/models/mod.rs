//! Data models shared across database access and API handlers.

pub mod audit_log;
pub mod game_link;
pub mod tab_session;
