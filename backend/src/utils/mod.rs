pub mod cookies;
pub mod csrf;
pub mod jwt;
pub mod request_meta;
pub mod time;

pub use request_meta::RequestMeta;
pub use time::{Clock, ManualClock, SystemClock};
