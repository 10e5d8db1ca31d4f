use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{
    molkky::{GamePlayer, MolkkyGame},
    rules::ScoreRules,
    settings::GameKind,
};

/// Reusable player record that new games can be seeded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the record.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Personal winning score, if it differs from the game one.
    #[serde(default)]
    pub target: Option<u32>,
    /// Personal reset score.
    #[serde(default)]
    pub reset: Option<u32>,
    /// Personal tolerance of consecutive misses.
    #[serde(default)]
    pub max_misses: Option<u32>,
    /// Optional avatar reference (URL or emoji).
    #[serde(default)]
    pub avatar: Option<String>,
    /// Users allowed to see and edit the record.
    pub uids: Vec<String>,
}

impl PlayerEntity {
    /// Whether `uid` may access the record.
    pub fn is_visible_to(&self, uid: &str) -> bool {
        self.uids.iter().any(|candidate| candidate == uid)
    }
}

/// Player as stored inside a game. Derived totals are kept for readers of the
/// snapshot but recomputed from `scores` on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GamePlayerEntity {
    pub id: Uuid,
    pub name: String,
    pub scores: Vec<u32>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub misses: u32,
    #[serde(default)]
    pub target: Option<u32>,
    #[serde(default)]
    pub reset: Option<u32>,
    #[serde(default)]
    pub max_misses: Option<u32>,
}

/// Mölkky game persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Creation timestamp.
    pub date: SystemTime,
    /// Winning score.
    pub target: u32,
    /// Score to fall back to after overshooting the target.
    pub reset: Option<u32>,
    /// Consecutive misses tolerated before elimination.
    pub max_misses: Option<u32>,
    /// Players in turn order.
    pub players: Vec<GamePlayerEntity>,
    /// Index of the player whose turn it is.
    pub current_player: usize,
    /// Identifier of the winner, if any.
    pub winner: Option<Uuid>,
    /// Users allowed to see and update the game.
    pub uids: Vec<String>,
}

impl GameEntity {
    /// Whether `uid` may access the game.
    pub fn is_visible_to(&self, uid: &str) -> bool {
        self.uids.iter().any(|candidate| candidate == uid)
    }
}

/// Flat settings record of one user for one helper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsEntity {
    pub uid: String,
    pub kind: GameKind,
    pub record: serde_json::Value,
}

impl From<&GamePlayer> for GamePlayerEntity {
    fn from(player: &GamePlayer) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            scores: player.scores.clone(),
            score: player.score,
            misses: player.misses,
            target: player.target,
            reset: player.reset,
            max_misses: player.max_misses,
        }
    }
}

impl From<GamePlayerEntity> for GamePlayer {
    fn from(entity: GamePlayerEntity) -> Self {
        GamePlayer::new(entity.id, entity.name)
            .with_scores(entity.scores)
            .with_overrides(entity.target, entity.reset, entity.max_misses)
    }
}

impl From<&MolkkyGame> for GameEntity {
    fn from(game: &MolkkyGame) -> Self {
        Self {
            id: game.id,
            date: game.date,
            target: game.rules.target,
            reset: game.rules.reset,
            max_misses: game.rules.max_misses,
            players: game.players().iter().map(Into::into).collect(),
            current_player: game.current_player(),
            winner: game.winner(),
            uids: game.uids.clone(),
        }
    }
}

impl From<GameEntity> for MolkkyGame {
    fn from(entity: GameEntity) -> Self {
        let rules = ScoreRules {
            target: entity.target,
            reset: entity.reset,
            max_misses: entity.max_misses,
        };
        MolkkyGame::restore(
            entity.id,
            entity.date,
            rules,
            entity.players.into_iter().map(Into::into).collect(),
            entity.current_player,
            entity.uids,
        )
    }
}

impl From<&PlayerEntity> for GamePlayer {
    fn from(record: &PlayerEntity) -> Self {
        GamePlayer::new(record.id, record.name.clone()).with_overrides(
            record.target,
            record.reset,
            record.max_misses,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoreRules {
        ScoreRules {
            target: 50,
            reset: Some(25),
            max_misses: Some(3),
        }
    }

    #[test]
    fn restored_game_recomputes_derived_values() {
        let ana = GamePlayer::new(Uuid::new_v4(), "Ana").with_scores(vec![40, 10]);
        let bob = GamePlayer::new(Uuid::new_v4(), "Bob").with_scores(vec![12]);
        let game = MolkkyGame::new(rules(), vec![ana, bob], vec!["uid-1".into()]);

        let mut entity = GameEntity::from(&game);
        entity.winner = None;
        entity.players[0].score = 0;

        let restored = MolkkyGame::from(entity);
        assert_eq!(restored.players()[0].score, 50);
        assert_eq!(restored.winner(), Some(game.players()[0].id));
        assert_eq!(restored.current_player(), 1);
    }

    #[test]
    fn player_record_overrides_are_carried_into_games() {
        let record = PlayerEntity {
            id: Uuid::new_v4(),
            name: "Chloé".into(),
            target: Some(40),
            reset: None,
            max_misses: Some(2),
            avatar: None,
            uids: vec!["uid-1".into()],
        };

        let player = GamePlayer::from(&record);
        assert_eq!(player.target, Some(40));
        assert_eq!(player.rules(&rules()).reset, Some(25));
        assert_eq!(player.rules(&rules()).max_misses, Some(2));
        assert!(record.is_visible_to("uid-1"));
        assert!(!record.is_visible_to("uid-2"));
    }

    #[test]
    fn game_entity_serializes_to_json() {
        let game = MolkkyGame::new(rules(), Vec::new(), vec!["uid-1".into()]);
        let entity = GameEntity::from(&game);

        let json = serde_json::to_string(&entity).unwrap();
        let parsed: GameEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entity);
    }
}
