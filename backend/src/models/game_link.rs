//! Teacher-owned game links and their per-mode configuration.
//!
//! Game links are written by the teacher-management layer; this crate reads them to
//! decide play access and only ever flips the `is_active` kill switch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{GameLinkId, UserId, VocabularyListId};

const MAX_GAME_MODE_LEN: usize = 32;

/// Game-mode identifier such as `hangman` or `memory`; always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameMode(String);

impl GameMode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() || normalized.len() > MAX_GAME_MODE_LEN {
            return Err(format!("invalid game mode length: {:?}", s));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("invalid game mode: {:?}", s));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for GameMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GameMode> for String {
    fn from(mode: GameMode) -> Self {
        mode.0
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerInput {
    Typing,
    MultipleChoice,
    LetterTiles,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HangmanConfig {
    pub answer_input: Option<AnswerInput>,
    pub max_wrong_guesses: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    pub pair_count: Option<u8>,
    pub time_limit_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GapFillConfig {
    pub answer_input: Option<AnswerInput>,
    pub gaps_per_sentence: Option<u8>,
    #[serde(default)]
    pub show_word_bank: bool,
    pub time_limit_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub answer_input: Option<AnswerInput>,
    pub question_count: Option<u16>,
    pub time_limit_seconds: Option<u32>,
}

/// Settings for one game mode. Access checks pass these through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModeConfig {
    Hangman(HangmanConfig),
    Memory(MemoryConfig),
    GapFill(GapFillConfig),
    Quiz(QuizConfig),
    /// Modes without a dedicated schema yet.
    Generic {
        #[schema(value_type = Object)]
        settings: Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameLink {
    pub id: GameLinkId,
    pub code: String,
    pub owner_user_id: UserId,
    pub name: String,
    pub vocabulary_list_id: VocabularyListId,
    /// Joinable modes in the order the teacher configured them.
    pub enabled_games: Vec<GameMode>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub mode_configs: BTreeMap<GameMode, ModeConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameLink {
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_mode_enabled(&self, mode: &GameMode) -> bool {
        self.enabled_games.contains(mode)
    }
}

/// Raw row shape of the `game_links` table.
#[derive(Debug, Clone, FromRow)]
pub struct GameLinkRow {
    pub id: GameLinkId,
    pub code: String,
    pub owner_user_id: UserId,
    pub name: String,
    pub vocabulary_list_id: VocabularyListId,
    pub enabled_games: Vec<String>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub mode_configs: Json<BTreeMap<GameMode, ModeConfig>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<GameLinkRow> for GameLink {
    type Error = String;

    fn try_from(row: GameLinkRow) -> Result<Self, Self::Error> {
        let mut enabled_games: Vec<GameMode> = Vec::with_capacity(row.enabled_games.len());
        for raw in &row.enabled_games {
            let mode: GameMode = raw.parse()?;
            if !enabled_games.contains(&mode) {
                enabled_games.push(mode);
            }
        }
        Ok(Self {
            id: row.id,
            code: row.code,
            owner_user_id: row.owner_user_id,
            name: row.name,
            vocabulary_list_id: row.vocabulary_list_id,
            enabled_games,
            is_active: row.is_active,
            expires_at: row.expires_at,
            mode_configs: row.mode_configs.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Trims and case-folds a shareable code. Blank input yields `None`.
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

/// Link snapshot exposed to players alongside an access decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameLinkView {
    #[schema(value_type = String)]
    pub id: GameLinkId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    #[schema(value_type = Object)]
    pub configs: BTreeMap<GameMode, ModeConfig>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetGameLinkActive {
    pub is_active: bool,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameLinkStatusResponse {
    #[schema(value_type = String)]
    pub id: GameLinkId,
    pub code: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&GameLink> for GameLinkStatusResponse {
    fn from(link: &GameLink) -> Self {
        Self {
            id: link.id,
            code: link.code.clone(),
            is_active: link.is_active,
            updated_at: link.updated_at,
        }
    }
}
