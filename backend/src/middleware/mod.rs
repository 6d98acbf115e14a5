pub mod auth;
pub mod csrf;
pub mod logging;
pub mod rate_limit;
pub mod request_id;
pub mod tab_session;

pub use auth::require_user;
pub use csrf::csrf_protect;
pub use logging::log_error_responses;
pub use rate_limit::create_game_access_rate_limiter;
pub use request_id::{request_id, RequestId};
pub use tab_session::{require_tab_session, TAB_SESSION_HEADER};
