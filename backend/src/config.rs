use anyhow::anyhow;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr, str::FromStr};

use crate::utils::cookies::{CookieOptions, SameSite};

const DEFAULT_TAB_SESSION_TTL_MINUTES: i64 = 120;
const DEFAULT_TAB_SESSION_RETENTION_DAYS: i64 = 30;
const MAX_TAB_SESSION_TTL_MINUTES: i64 = 30 * 24 * 60;
const MAX_TAB_SESSION_RETENTION_DAYS: i64 = 3650;
const DEFAULT_RATE_LIMIT_IP_MAX_REQUESTS: u32 = 30;
const DEFAULT_RATE_LIMIT_IP_WINDOW_SECONDS: u64 = 60;

/// How a successful refresh treats `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenewalStrategy {
    /// `expires_at` never moves after creation.
    Fixed,
    /// Each successful refresh pushes `expires_at` to `now + ttl`.
    Sliding,
}

impl FromStr for RenewalStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(RenewalStrategy::Fixed),
            "sliding" => Ok(RenewalStrategy::Sliding),
            other => Err(anyhow!("Invalid TAB_SESSION_RENEWAL value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub tab_session_ttl_minutes: i64,
    pub tab_session_renewal: RenewalStrategy,
    pub tab_session_retention_days: i64,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub cors_allow_origins: Vec<String>,
    pub rate_limit_ip_max_requests: u32,
    pub rate_limit_ip_window_seconds: u64,
    /// Key the rate limiter on `x-forwarded-for` / `x-real-ip` instead of the
    /// peer address. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/vocabplay".to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .unwrap_or_else(|| "your-secret-key-change-this-in-production".to_string());

        let tab_session_ttl_minutes = parse_bounded(
            lookup("TAB_SESSION_TTL_MINUTES"),
            DEFAULT_TAB_SESSION_TTL_MINUTES,
            MAX_TAB_SESSION_TTL_MINUTES,
        );

        let tab_session_renewal = match lookup("TAB_SESSION_RENEWAL") {
            Some(raw) => raw.parse()?,
            None => RenewalStrategy::Fixed,
        };

        let tab_session_retention_days = parse_bounded(
            lookup("TAB_SESSION_RETENTION_DAYS"),
            DEFAULT_TAB_SESSION_RETENTION_DAYS,
            MAX_TAB_SESSION_RETENTION_DAYS,
        );

        let cookie_secure = parse_bool(lookup("COOKIE_SECURE"));

        let cookie_same_site = match lookup("COOKIE_SAME_SITE") {
            Some(raw) => raw.parse()?,
            None => SameSite::Lax,
        };

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let rate_limit_ip_max_requests = lookup("RATE_LIMIT_IP_MAX_REQUESTS")
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_IP_MAX_REQUESTS);

        let rate_limit_ip_window_seconds = lookup("RATE_LIMIT_IP_WINDOW_SECONDS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_IP_WINDOW_SECONDS);

        let trust_proxy_headers = parse_bool(lookup("TRUST_PROXY_HEADERS"));

        let bind_addr_raw = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr: SocketAddr = bind_addr_raw
            .parse()
            .map_err(|_| anyhow!("Invalid BIND_ADDR value: {}", bind_addr_raw))?;

        Ok(Config {
            database_url,
            jwt_secret,
            tab_session_ttl_minutes,
            tab_session_renewal,
            tab_session_retention_days,
            cookie_secure,
            cookie_same_site,
            cors_allow_origins,
            rate_limit_ip_max_requests,
            rate_limit_ip_window_seconds,
            trust_proxy_headers,
            bind_addr,
        })
    }

    pub fn tab_session_ttl(&self) -> Duration {
        Duration::minutes(self.tab_session_ttl_minutes)
    }

    pub fn tab_session_retention(&self) -> Duration {
        Duration::days(self.tab_session_retention_days)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
        }
    }
}

/// Values outside `1..=max` fall back to `default`.
fn parse_bounded(raw: Option<String>, default: i64, max: i64) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| (1..=max).contains(value))
        .unwrap_or(default)
}

fn parse_bool(raw: Option<String>) -> bool {
    raw.map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
    .unwrap_or(false)
}
