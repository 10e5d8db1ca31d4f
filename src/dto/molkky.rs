use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::PlayerEntity,
    dto::{
        format_system_time,
        settings::MolkkySettingsDto,
        validation::{validate_name, validate_reset_below_target, validate_throws},
    },
    state::molkky::{GamePlayer, MolkkyGame},
};

/// Reusable player record as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub name: String,
    pub target: Option<u32>,
    pub reset: Option<u32>,
    pub max_misses: Option<u32>,
    pub avatar: Option<String>,
}

/// Payload used to create or update a player record.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_player_rules"))]
pub struct PlayerInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    /// Personal winning score overriding the game one.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub target: Option<u32>,
    /// Personal reset score overriding the game one.
    #[serde(default)]
    pub reset: Option<u32>,
    /// Personal tolerance of consecutive misses.
    #[serde(default)]
    pub max_misses: Option<u32>,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn validate_player_rules(input: &PlayerInput) -> Result<(), ValidationError> {
    match input.target {
        Some(target) => validate_reset_below_target(target, input.reset),
        None => Ok(()),
    }
}

/// Player taking part in a new game: either an existing record or a guest name.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_game_player"))]
pub struct GamePlayerInput {
    /// Player record to seed the game player from (name and rule overrides).
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Display name; required for guests, overrides the record name otherwise.
    #[serde(default)]
    pub name: Option<String>,
}

fn validate_game_player(input: &GamePlayerInput) -> Result<(), ValidationError> {
    match (&input.id, &input.name) {
        (_, Some(name)) => validate_name(name),
        (Some(_), None) => Ok(()),
        (None, None) => {
            let mut err = ValidationError::new("player_identity");
            err.message = Some("A game player needs a record id or a name".into());
            Err(err)
        }
    }
}

/// Payload used to start a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Players in turn order.
    #[validate(length(min = 1), nested)]
    pub players: Vec<GamePlayerInput>,
    /// Game rules; the caller's Mölkky settings apply when omitted.
    #[serde(default)]
    #[validate(nested)]
    pub rules: Option<MolkkySettingsDto>,
}

/// A single throw for the current player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddScoreRequest {
    #[validate(range(max = 12))]
    pub score: u32,
}

/// Replacement of a player's whole throw history.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateScoresRequest {
    #[validate(custom(function = "validate_throws"))]
    pub scores: Vec<u32>,
}

/// Replacement of a player's most recent throw.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateLastScoreRequest {
    #[validate(range(max = 12))]
    pub score: u32,
}

/// Kind of object a share link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    Game,
    Player,
}

/// Shared object the caller wants to join.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareObject {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ShareKind,
}

/// Player of a game with its derived standing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GamePlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub scores: Vec<u32>,
    pub score: u32,
    pub misses: u32,
    pub won: bool,
    pub out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_misses: Option<u32>,
}

/// Game state returned by every Mölkky game operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    /// Creation date (RFC 3339).
    pub date: String,
    pub target: u32,
    pub reset: Option<u32>,
    pub max_misses: Option<u32>,
    pub players: Vec<GamePlayerSummary>,
    /// Index of the player whose turn it is.
    pub current_player: usize,
    pub winner: Option<Uuid>,
    /// Whether every player has won or been eliminated.
    pub over: bool,
}

impl From<&PlayerEntity> for PlayerRecord {
    fn from(record: &PlayerEntity) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            target: record.target,
            reset: record.reset,
            max_misses: record.max_misses,
            avatar: record.avatar.clone(),
        }
    }
}

impl From<&GamePlayer> for GamePlayerSummary {
    fn from(player: &GamePlayer) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            scores: player.scores.clone(),
            score: player.score,
            misses: player.misses,
            won: player.has_won(),
            out: player.is_out(),
            target: player.target,
            reset: player.reset,
            max_misses: player.max_misses,
        }
    }
}

impl From<&MolkkyGame> for GameSummary {
    fn from(game: &MolkkyGame) -> Self {
        Self {
            id: game.id,
            date: format_system_time(game.date),
            target: game.rules.target,
            reset: game.rules.reset,
            max_misses: game.rules.max_misses,
            players: game.players().iter().map(Into::into).collect(),
            current_player: game.current_player(),
            winner: game.winner(),
            over: game.is_over(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn throws_above_twelve_are_rejected() {
        assert!(AddScoreRequest { score: 12 }.validate().is_ok());
        assert!(AddScoreRequest { score: 13 }.validate().is_err());
        assert!(
            UpdateScoresRequest {
                scores: vec![1, 20]
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn game_players_need_an_identity() {
        let request: CreateGameRequest =
            serde_json::from_value(json!({ "players": [{ "name": "Ana" }, {}] })).unwrap();
        assert!(request.validate().is_err());

        let request: CreateGameRequest = serde_json::from_value(json!({
            "players": [{ "name": "Ana" }, { "id": Uuid::new_v4() }]
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let request: CreateGameRequest =
            serde_json::from_value(json!({ "players": [] })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn share_object_uses_type_key() {
        let share: ShareObject =
            serde_json::from_value(json!({ "id": Uuid::nil(), "type": "player" })).unwrap();
        assert_eq!(share.kind, ShareKind::Player);
    }

    #[test]
    fn player_overrides_are_checked_together() {
        let input = PlayerInput {
            name: "Bob".into(),
            target: Some(30),
            reset: Some(35),
            max_misses: None,
            avatar: None,
        };
        assert!(input.validate().is_err());
    }
}
