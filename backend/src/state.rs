use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        AuditLogStore, GameLinkStore, PgAuditLogRepository, PgGameLinkRepository,
        PgTabSessionRepository, TabSessionStore,
    },
    services::{
        AuditLogger, GameAccessValidator, IdentityProvider, JwtIdentityProvider,
        TabSessionManager,
    },
    utils::{Clock, SystemClock},
};

/// Persistence backends behind the services.
#[derive(Clone)]
pub struct Stores {
    pub tab_sessions: Arc<dyn TabSessionStore>,
    pub game_links: Arc<dyn GameLinkStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
}

impl Stores {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            tab_sessions: Arc::new(PgTabSessionRepository::new(pool.clone())),
            game_links: Arc::new(PgGameLinkRepository::new(pool.clone())),
            audit_logs: Arc::new(PgAuditLogRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tab_sessions: Arc<TabSessionManager>,
    pub game_access: Arc<GameAccessValidator>,
    pub game_links: Arc<dyn GameLinkStore>,
    pub audit: AuditLogger,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: Config,
        stores: Stores,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let audit = AuditLogger::new(stores.audit_logs);
        let tab_sessions = Arc::new(TabSessionManager::new(
            stores.tab_sessions,
            audit.clone(),
            Arc::clone(&clock),
            config.tab_session_ttl(),
            config.tab_session_renewal,
        ));
        let game_access = Arc::new(GameAccessValidator::new(
            Arc::clone(&stores.game_links),
            Arc::clone(&clock),
        ));
        Self {
            config,
            tab_sessions,
            game_access,
            game_links: stores.game_links,
            audit,
            identity,
            clock,
        }
    }

    /// Production wiring: Postgres stores, JWT identity, wall clock.
    pub fn from_pool(pool: DbPool, config: Config) -> Self {
        let identity = Arc::new(JwtIdentityProvider::new(config.jwt_secret.clone()));
        Self::new(config, Stores::postgres(pool), identity, Arc::new(SystemClock))
    }
}
