//! Mölkky game engine: turn order, score replay and winner resolution.

use std::time::SystemTime;

use thiserror::Error;
use uuid::Uuid;

use crate::state::rules::{ScoreRules, Standing};

/// Errors raised while mutating a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No player with this identifier takes part in the game.
    #[error("couldn't find player with ID '{0}'")]
    PlayerNotFound(Uuid),
    /// Every player has either won or been eliminated.
    #[error("the game is over")]
    GameOver,
    /// The player has not thrown yet, so there is no last score to replace.
    #[error("player '{0}' has no recorded score")]
    NoScores(Uuid),
}

/// Player taking part in a game, with its throw history and derived totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePlayer {
    /// Identifier of the player within the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Throw values in throw order.
    pub scores: Vec<u32>,
    /// Current total, derived from `scores`.
    pub score: u32,
    /// Current consecutive misses, derived from `scores`.
    pub misses: u32,
    /// Per-player override of the game target.
    pub target: Option<u32>,
    /// Per-player override of the reset score.
    pub reset: Option<u32>,
    /// Per-player override of the tolerated consecutive misses.
    pub max_misses: Option<u32>,
    standing: Standing,
}

impl GamePlayer {
    /// Create a player with an empty history.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scores: Vec::new(),
            score: 0,
            misses: 0,
            target: None,
            reset: None,
            max_misses: None,
            standing: Standing::default(),
        }
    }

    /// Attach a throw history to the player.
    pub fn with_scores(mut self, scores: Vec<u32>) -> Self {
        self.scores = scores;
        self
    }

    /// Override the game rules for this player. `None` fields keep the game value.
    pub fn with_overrides(
        mut self,
        target: Option<u32>,
        reset: Option<u32>,
        max_misses: Option<u32>,
    ) -> Self {
        self.target = target;
        self.reset = reset;
        self.max_misses = max_misses;
        self
    }

    /// Throw index at which the player won, if any.
    pub fn won_at(&self) -> Option<usize> {
        self.standing.won_at
    }

    /// Whether the player has won.
    pub fn has_won(&self) -> bool {
        self.standing.won_at.is_some()
    }

    /// Whether the player was eliminated by consecutive misses.
    pub fn is_out(&self) -> bool {
        self.standing.out_at.is_some()
    }

    /// Whether the player can no longer take a turn.
    pub fn is_finished(&self) -> bool {
        self.standing.is_finished()
    }

    /// Rules in effect for this player given the game-level rules. A personal target
    /// brings a complete rule set: a missing reset or miss limit then means none.
    /// Without a personal target, the set fields refine the game rules.
    pub fn rules(&self, game: &ScoreRules) -> ScoreRules {
        match self.target {
            Some(target) => ScoreRules {
                target,
                reset: self.reset,
                max_misses: self.max_misses,
            },
            None => ScoreRules {
                target: game.target,
                reset: self.reset.or(game.reset),
                max_misses: self.max_misses.or(game.max_misses),
            },
        }
    }

    fn recalculate(&mut self, game: &ScoreRules) {
        self.standing = self.rules(game).replay(&self.scores);
        self.score = self.standing.total;
        self.misses = self.standing.misses;
    }
}

/// A game of Mölkky.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolkkyGame {
    /// Stable identifier of the game.
    pub id: Uuid,
    /// Creation date.
    pub date: SystemTime,
    /// Game-level rules.
    pub rules: ScoreRules,
    /// Users allowed to see and update the game.
    pub uids: Vec<String>,
    players: Vec<GamePlayer>,
    current_player: usize,
    winner: Option<Uuid>,
}

impl MolkkyGame {
    /// Build a fresh game. Histories already attached to players are replayed.
    pub fn new(rules: ScoreRules, players: Vec<GamePlayer>, uids: Vec<String>) -> Self {
        Self::restore(Uuid::new_v4(), SystemTime::now(), rules, players, 0, uids)
    }

    /// Rebuild a game from persisted parts, recomputing every derived value.
    pub fn restore(
        id: Uuid,
        date: SystemTime,
        rules: ScoreRules,
        players: Vec<GamePlayer>,
        current_player: usize,
        uids: Vec<String>,
    ) -> Self {
        let current_player = if players.is_empty() {
            0
        } else {
            current_player % players.len()
        };
        let mut game = Self {
            id,
            date,
            rules,
            uids,
            players,
            current_player,
            winner: None,
        };
        game.recalculate_scores();
        game.settle_turn();
        game
    }

    /// Players in turn order.
    pub fn players(&self) -> &[GamePlayer] {
        &self.players
    }

    /// Index of the player whose turn it is.
    pub fn current_player(&self) -> usize {
        self.current_player
    }

    /// Identifier of the winning player, if any.
    pub fn winner(&self) -> Option<Uuid> {
        self.winner
    }

    /// Whether no player can take another turn.
    pub fn is_over(&self) -> bool {
        self.players.iter().all(GamePlayer::is_finished)
    }

    /// Whether `uid` may access the game.
    pub fn is_visible_to(&self, uid: &str) -> bool {
        self.uids.iter().any(|candidate| candidate == uid)
    }

    /// Record a throw for the current player, then hand the turn to the next one.
    pub fn add_score(&mut self, score: u32) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }

        self.players[self.current_player].scores.push(score);
        self.recalculate_scores();
        self.move_next();
        Ok(())
    }

    /// Replace the whole throw history of a player.
    pub fn update_scores(&mut self, player_id: Uuid, scores: Vec<u32>) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        player.scores = scores;

        self.recalculate_scores();
        self.settle_turn();
        Ok(())
    }

    /// Replace the most recent throw of a player.
    pub fn update_last_score(&mut self, player_id: Uuid, score: u32) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        let last = player
            .scores
            .last_mut()
            .ok_or(GameError::NoScores(player_id))?;
        *last = score;

        self.recalculate_scores();
        self.settle_turn();
        Ok(())
    }

    fn player_mut(&mut self, player_id: Uuid) -> Result<&mut GamePlayer, GameError> {
        self.players
            .iter_mut()
            .find(|player| player.id == player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    /// Replay every history and elect the player who won on the earliest throw.
    /// On equal throw indexes the first player in turn order wins.
    fn recalculate_scores(&mut self) {
        let rules = self.rules;
        let mut best: Option<(usize, Uuid)> = None;

        for player in &mut self.players {
            player.recalculate(&rules);

            if let Some(won_at) = player.won_at()
                && best.is_none_or(|(best_at, _)| won_at < best_at)
            {
                best = Some((won_at, player.id));
            }
        }

        self.winner = best.map(|(_, id)| id);
    }

    /// Advance to the next player who has neither won nor been eliminated, visiting
    /// at most one full round. When nobody is eligible the pointer stays on the last
    /// candidate examined.
    fn move_next(&mut self) {
        let count = self.players.len();
        if count == 0 {
            return;
        }

        let mut candidate = self.current_player;
        for _ in 0..count {
            candidate = (candidate + 1) % count;
            if !self.players[candidate].is_finished() {
                break;
            }
        }
        self.current_player = candidate;
    }

    /// Keep the turn pointer on an eligible player after an out-of-band edit.
    fn settle_turn(&mut self) {
        let finished = self
            .players
            .get(self.current_player)
            .is_some_and(GamePlayer::is_finished);
        if finished {
            self.move_next();
        }
    }

    #[cfg(test)]
    fn set_current_player(&mut self, index: usize) {
        self.current_player = index;
    }
}
