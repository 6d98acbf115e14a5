#![allow(dead_code)]
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::{ConnectInfo, MockConnectInfo},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration as StdDuration,
};
use tower::ServiceExt;
use vocabplay_backend::{
    build_router,
    config::Config,
    error::StoreError,
    models::{
        audit_log::{AuditAction, AuditLogEntry},
        game_link::{GameLink, GameMode, HangmanConfig, MemoryConfig, ModeConfig},
        tab_session::{TabSession, TabSessionStatus},
    },
    repositories::{AuditLogStore, GameLinkStore, InvalidationOutcome, TabSessionStore},
    services::JwtIdentityProvider,
    state::{AppState, Stores},
    types::{AuditLogId, GameLinkId, UserId, VocabularyListId},
    utils::{jwt::create_access_token, ManualClock},
};

pub const JWT_SECRET: &str = "test-jwt-secret-32-chars-minimum!";
pub const CSRF_TOKEN: &str = "0f0e0d0c0b0a09080706050403020100f0e0d0c0b0a09080706050403020100f";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None).expect("default config");
    config.jwt_secret = JWT_SECRET.to_string();
    config
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("store offline".into())
}

#[derive(Default)]
pub struct InMemoryTabSessionStore {
    sessions: Mutex<HashMap<String, TabSession>>,
    offline: AtomicBool,
}

impl InMemoryTabSessionStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<TabSession> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    pub fn put(&self, session: TabSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TabSessionStore for InMemoryTabSessionStore {
    async fn insert(&self, session: &TabSession) -> Result<(), StoreError> {
        self.check()?;
        self.put(session.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<TabSession>, StoreError> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn touch_if_live(
        &self,
        id: &str,
        now: DateTime<Utc>,
        new_expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(id) {
            Some(session)
                if session.status == TabSessionStatus::Active && session.expires_at >= now =>
            {
                session.last_activity_at = now;
                if let Some(expires_at) = new_expires_at {
                    session.expires_at = expires_at;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_if_lapsed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(id) {
            Some(session)
                if session.status == TabSessionStatus::Active && session.expires_at < now =>
            {
                session.status = TabSessionStatus::Expired;
                session.terminated_at.get_or_insert(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InvalidationOutcome>, StoreError> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        Ok(sessions.get_mut(id).map(|session| {
            let previous_status = session.status;
            session.status = TabSessionStatus::Invalidated;
            session.terminated_at.get_or_insert(now);
            InvalidationOutcome {
                previous_status,
                user_id: session.user_id,
            }
        }))
    }

    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| match session.status {
            TabSessionStatus::Active => session.expires_at >= cutoff,
            _ => session.terminated_at.map_or(true, |at| at >= cutoff),
        });
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryGameLinkStore {
    links: Mutex<Vec<GameLink>>,
    offline: AtomicBool,
}

impl InMemoryGameLinkStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn put(&self, link: GameLink) {
        let mut links = self.links.lock().unwrap();
        links.retain(|existing| existing.id != link.id);
        links.push(link);
    }

    pub fn get(&self, id: GameLinkId) -> Option<GameLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|link| link.id == id)
            .cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GameLinkStore for InMemoryGameLinkStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<GameLink>, StoreError> {
        self.check()?;
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|link| link.code.to_lowercase() == code)
            .cloned())
    }

    async fn find_by_id(&self, id: GameLinkId) -> Result<Option<GameLink>, StoreError> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn set_active(
        &self,
        id: GameLinkId,
        owner: UserId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<GameLink>, StoreError> {
        self.check()?;
        let mut links = self.links.lock().unwrap();
        Ok(links
            .iter_mut()
            .find(|link| link.id == id && link.owner_user_id == owner)
            .map(|link| {
                link.is_active = is_active;
                link.updated_at = now;
                link.clone()
            }))
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogStore {
    entries: Mutex<Vec<AuditLogEntry>>,
    offline: AtomicBool,
}

impl InMemoryAuditLogStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn entries_for(&self, action: AuditAction) -> Vec<AuditLogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.action == action)
            .collect()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogId, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(AuditLogId::new())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    pub tab_sessions: Arc<InMemoryTabSessionStore>,
    pub game_links: Arc<InMemoryGameLinkStore>,
    pub audit_logs: Arc<InMemoryAuditLogStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = ManualClock::new(start_time());
        let tab_sessions = Arc::new(InMemoryTabSessionStore::default());
        let game_links = Arc::new(InMemoryGameLinkStore::default());
        let audit_logs = Arc::new(InMemoryAuditLogStore::default());
        let stores = Stores {
            tab_sessions: tab_sessions.clone(),
            game_links: game_links.clone(),
            audit_logs: audit_logs.clone(),
        };
        let identity = Arc::new(JwtIdentityProvider::new(config.jwt_secret.clone()));
        let state = AppState::new(config, stores, identity, Arc::new(clock.clone()));
        let router = build_router(state.clone())
            .expect("router")
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
            .layer(axum::Extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000)))));
        Self {
            router,
            state,
            clock,
            tab_sessions,
            game_links,
            audit_logs,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Detached audit writes land on another task; poll briefly for them.
    pub async fn wait_for_audit(&self, action: AuditAction, count: usize) -> Vec<AuditLogEntry> {
        for _ in 0..100 {
            let entries = self.audit_logs.entries_for(action);
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        self.audit_logs.entries_for(action)
    }

    /// Gives detached tasks a chance to run before asserting on absence.
    pub async fn settle(&self) {
        tokio::time::sleep(StdDuration::from_millis(50)).await;
    }

    pub fn seed_session(
        &self,
        user_id: UserId,
        status: TabSessionStatus,
        expires_in: Duration,
    ) -> TabSession {
        let now = self.clock_now();
        let session = TabSession {
            id: format!("seeded-{}", uuid::Uuid::new_v4().simple()),
            user_id,
            created_at: now,
            last_activity_at: now,
            expires_at: now + expires_in,
            status,
            terminated_at: (status != TabSessionStatus::Active).then_some(now),
        };
        self.tab_sessions.put(session.clone());
        session
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use vocabplay_backend::utils::Clock;
        self.clock.now()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

pub fn bearer(user_id: UserId) -> String {
    let token =
        create_access_token(user_id.to_string(), None, JWT_SECRET, 60).expect("access token");
    format!("Bearer {}", token)
}

pub fn csrf_cookie() -> String {
    format!("csrf_token={}", CSRF_TOKEN)
}

pub fn mode(raw: &str) -> GameMode {
    raw.parse().expect("game mode")
}

pub fn game_link(owner: UserId, code: &str) -> GameLink {
    let mut mode_configs = BTreeMap::new();
    mode_configs.insert(mode("hangman"), ModeConfig::Hangman(HangmanConfig::default()));
    mode_configs.insert(mode("memory"), ModeConfig::Memory(MemoryConfig::default()));
    GameLink {
        id: GameLinkId::new(),
        code: code.to_string(),
        owner_user_id: owner,
        name: "Unit 4 verbs".to_string(),
        vocabulary_list_id: VocabularyListId::new(),
        enabled_games: vec![mode("hangman"), mode("memory")],
        is_active: true,
        expires_at: None,
        mode_configs,
        created_at: start_time() - Duration::days(2),
        updated_at: start_time() - Duration::days(2),
    }
}
