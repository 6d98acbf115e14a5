use axum::http::{header::USER_AGENT, HeaderMap};

pub const UNKNOWN: &str = "unknown";

/// Client address and user agent as seen by the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestMeta {
    /// Never fails: missing or unreadable headers become the `unknown` sentinel.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip(headers).unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: extract_user_agent(headers).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    pub fn unknown() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }
}

fn extract_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        return value
            .split(',')
            .next()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|agent| agent.trim().to_string())
        .filter(|agent| !agent.is_empty())
}
