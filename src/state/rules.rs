//! Mölkky scoring rules applied one throw at a time.

/// Rule parameters in effect for a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRules {
    /// Score that wins the game.
    pub target: u32,
    /// Score a player falls back to when exceeding the target. Without it, reaching or
    /// passing the target wins.
    pub reset: Option<u32>,
    /// Number of consecutive misses tolerated before the player is out.
    pub max_misses: Option<u32>,
}

/// Running totals after a throw has been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrowOutcome {
    /// Accumulated score.
    pub total: u32,
    /// Consecutive misses.
    pub misses: u32,
    /// Whether the throw satisfied the win condition.
    pub won: bool,
    /// Whether the player exceeded the allowed consecutive misses.
    pub out: bool,
}

/// Derived state of a player computed from the full throw history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    /// Accumulated score.
    pub total: u32,
    /// Consecutive misses at the end of the replayed history.
    pub misses: u32,
    /// Index of the throw at which the player won.
    pub won_at: Option<usize>,
    /// Index of the throw at which the player was eliminated.
    pub out_at: Option<usize>,
}

impl Standing {
    /// Whether the player can no longer take a turn.
    pub fn is_finished(&self) -> bool {
        self.won_at.is_some() || self.out_at.is_some()
    }
}

impl ScoreRules {
    /// Apply a single throw on top of the previous totals.
    pub fn apply(&self, prior_total: u32, prior_misses: u32, throw: u32) -> ThrowOutcome {
        let mut total = prior_total.saturating_add(throw);
        if let Some(reset) = self.reset
            && total > self.target
        {
            total = reset;
        }

        let misses = if throw == 0 { prior_misses + 1 } else { 0 };

        if self.max_misses.is_some_and(|max| misses > max) {
            return ThrowOutcome {
                total,
                misses,
                won: false,
                out: true,
            };
        }

        let won = match self.reset {
            Some(_) => total == self.target,
            None => total >= self.target,
        };

        ThrowOutcome {
            total,
            misses,
            won,
            out: false,
        }
    }

    /// Replay a throw history from scratch. Throws recorded after a win or an
    /// elimination are ignored.
    pub fn replay(&self, throws: &[u32]) -> Standing {
        self.resume(Standing::default(), throws, 0)
    }

    /// Continue a replay from an already computed standing. `offset` is the index of the
    /// first throw in `throws` within the full history.
    pub fn resume(&self, mut standing: Standing, throws: &[u32], offset: usize) -> Standing {
        if standing.is_finished() {
            return standing;
        }

        for (index, &throw) in throws.iter().enumerate() {
            let outcome = self.apply(standing.total, standing.misses, throw);
            standing.total = outcome.total;
            standing.misses = outcome.misses;

            if outcome.out {
                standing.out_at = Some(offset + index);
                break;
            }
            if outcome.won {
                standing.won_at = Some(offset + index);
                break;
            }
        }

        standing
    }
}
