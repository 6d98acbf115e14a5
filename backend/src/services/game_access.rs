//! Play-access decisions for shareable game codes.
//!
//! Every call reads the link fresh from the store. A store failure denies
//! access instead of guessing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    models::game_link::{normalize_code, GameLink, GameLinkView, GameMode},
    repositories::GameLinkStore,
    types::{GameLinkId, UserId},
    utils::Clock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DenialReason {
    NotFound,
    Inactive,
    ExpiredLink,
    ModeDisabled,
    OwnerMismatch,
    Unavailable,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NotFound => "NotFound",
            DenialReason::Inactive => "Inactive",
            DenialReason::ExpiredLink => "ExpiredLink",
            DenialReason::ModeDisabled => "ModeDisabled",
            DenialReason::OwnerMismatch => "OwnerMismatch",
            DenialReason::Unavailable => "Unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessResult {
    pub allowed: bool,
    /// The link's configured modes, reported on denials too so players can be
    /// redirected to a mode that is open.
    #[schema(value_type = Vec<String>)]
    pub enabled_games: Vec<GameMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_link: Option<GameLinkView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DenialReason>,
}

impl AccessResult {
    fn denied(reason: DenialReason, enabled_games: Vec<GameMode>) -> Self {
        Self {
            allowed: false,
            enabled_games,
            game_link: None,
            error: Some(reason),
        }
    }

    fn granted(link: &GameLink, requested: Option<&GameMode>) -> Self {
        let configs = link
            .mode_configs
            .iter()
            .filter(|(mode, _)| requested.map_or(true, |requested| *mode == requested))
            .filter(|(mode, _)| link.is_mode_enabled(mode))
            .map(|(mode, config)| (mode.clone(), config.clone()))
            .collect();
        Self {
            allowed: true,
            enabled_games: link.enabled_games.clone(),
            game_link: Some(GameLinkView {
                id: link.id,
                code: link.code.clone(),
                name: link.name.clone(),
                is_active: link.is_active,
                configs,
            }),
            error: None,
        }
    }
}

pub struct GameAccessValidator {
    store: Arc<dyn GameLinkStore>,
    clock: Arc<dyn Clock>,
}

impl GameAccessValidator {
    pub fn new(store: Arc<dyn GameLinkStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Decides whether an anonymous player may join `code`, optionally for one
    /// specific mode. Checks run in a fixed order: existence, kill switch,
    /// expiry, then mode.
    pub async fn validate(&self, code: &str, requested_mode: Option<&str>) -> AccessResult {
        let Some(normalized) = normalize_code(code) else {
            return AccessResult::denied(DenialReason::NotFound, Vec::new());
        };

        let link = match self.store.find_by_code(&normalized).await {
            Ok(Some(link)) => link,
            Ok(None) => return AccessResult::denied(DenialReason::NotFound, Vec::new()),
            Err(err) => {
                tracing::error!(error = %err, "Game link lookup failed; denying access");
                return AccessResult::denied(DenialReason::Unavailable, Vec::new());
            }
        };

        if !link.is_active {
            return AccessResult::denied(DenialReason::Inactive, link.enabled_games);
        }
        if link.has_expired_at(self.clock.now()) {
            return AccessResult::denied(DenialReason::ExpiredLink, link.enabled_games);
        }

        let requested = match requested_mode.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<GameMode>() {
                Ok(mode) if link.is_mode_enabled(&mode) => Some(mode),
                _ => {
                    tracing::debug!(
                        link_id = %link.id,
                        requested_mode = raw,
                        "Requested game mode is not enabled"
                    );
                    return AccessResult::denied(DenialReason::ModeDisabled, link.enabled_games);
                }
            },
        };

        AccessResult::granted(&link, requested.as_ref())
    }

    /// Confirms `caller` owns the link before any management mutation.
    pub async fn authorize_owner(
        &self,
        link_id: GameLinkId,
        caller: UserId,
    ) -> Result<GameLink, DenialReason> {
        let link = match self.store.find_by_id(link_id).await {
            Ok(Some(link)) => link,
            Ok(None) => return Err(DenialReason::NotFound),
            Err(err) => {
                tracing::error!(error = %err, link_id = %link_id, "Game link lookup failed");
                return Err(DenialReason::Unavailable);
            }
        };
        if link.owner_user_id != caller {
            return Err(DenialReason::OwnerMismatch);
        }
        Ok(link)
    }
}
