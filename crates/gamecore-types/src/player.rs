//! Player account types.
//!
//! A player row carries the spendable balance, the game the player is
//! currently locked into (if any), and aggregate game statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GameId, PlayerId};

/// Aggregate game statistics for one player.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStats {
    pub games_played: u64,
    pub games_won: u64,
}

impl PlayerStats {
    /// Count one finished game.
    pub fn record_game(&mut self, won: bool) {
        self.games_played += 1;
        if won {
            self.games_won += 1;
        }
    }
}

/// A player row, as seen by the economy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    #[serde(rename = "playerUUID")]
    pub id: PlayerId,
    /// Spendable balance. Mutated only through the balance ledger.
    pub account_balance: Decimal,
    /// Game the player is locked into. Mutated only by matchmaking.
    pub current_game: Option<GameId>,
    /// `None` until the first game is recorded; read as all-zero.
    pub stats: Option<PlayerStats>,
    /// Commit timestamp of the last write. Stamped by the store.
    pub updated: Option<DateTime<Utc>>,
}

impl Player {
    /// Create a player with the given balance, not in a game, without stats.
    #[must_use]
    pub fn new(id: PlayerId, account_balance: Decimal) -> Self {
        Self {
            id,
            account_balance,
            current_game: None,
            stats: None,
            updated: None,
        }
    }

    /// Statistics with absent stats treated as zero.
    #[must_use]
    pub fn stats_or_default(&self) -> PlayerStats {
        self.stats.unwrap_or_default()
    }

    /// Whether matchmaking may assign this player to a new game.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.current_game.is_none()
    }

    /// Whether the player is locked into `game`.
    #[must_use]
    pub fn is_playing(&self, game: GameId) -> bool {
        self.current_game == Some(game)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Player {
    /// A fresh player holding `balance`.
    pub fn dummy(balance: Decimal) -> Self {
        Self::new(PlayerId::new(), balance)
    }

    /// A fresh player holding `balance`, already locked into `game`.
    pub fn dummy_in_game(balance: Decimal, game: GameId) -> Self {
        Self {
            current_game: Some(game),
            ..Self::dummy(balance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_stats_read_as_zero() {
        let player = Player::dummy(Decimal::ZERO);
        assert_eq!(player.stats_or_default(), PlayerStats::default());
        assert!(player.stats.is_none());
    }

    #[test]
    fn record_game_counts_wins() {
        let mut stats = PlayerStats::default();
        stats.record_game(false);
        stats.record_game(true);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.games_won, 1);
    }

    #[test]
    fn availability_tracks_current_game() {
        let game = GameId::new();
        let player = Player::dummy_in_game(Decimal::ONE, game);
        assert!(!player.is_available());
        assert!(player.is_playing(game));
        assert!(!player.is_playing(GameId::new()));
    }

    #[test]
    fn serde_uses_schema_column_names() {
        let player = Player::dummy(Decimal::new(1000, 2));
        let json = serde_json::to_value(&player).unwrap();
        assert!(json.get("playerUUID").is_some());
        assert_eq!(json["account_balance"], "10.00");
        assert!(json["current_game"].is_null());
    }
}
