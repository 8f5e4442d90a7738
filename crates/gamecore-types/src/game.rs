//! Matchmaking game sessions.
//!
//! A game is open while `finished` is unset. Closing it picks a winner from
//! its player list and stamps `finished`; a closed game never reopens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EconomyError, GameId, PlayerId, Result};

/// Derived lifecycle of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Open,
    Closed,
}

/// A game session (`games`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    #[serde(rename = "gameUUID")]
    pub id: GameId,
    /// Assigned at creation. Never mutated afterwards.
    pub players: Vec<PlayerId>,
    pub winner: Option<PlayerId>,
    pub created: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
}

impl Game {
    #[must_use]
    pub fn new(id: GameId, players: Vec<PlayerId>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            players,
            winner: None,
            created,
            finished: None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.finished.is_none()
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        if self.is_open() {
            GameState::Open
        } else {
            GameState::Closed
        }
    }

    /// Close the game with `winner`.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::AlreadyFinished`] if the game is already closed.
    /// - [`EconomyError::Validation`] if `winner` is not one of the players.
    pub fn close(&mut self, winner: PlayerId, now: DateTime<Utc>) -> Result<()> {
        if !self.is_open() {
            return Err(EconomyError::AlreadyFinished(self.id));
        }
        if !self.players.contains(&winner) {
            return Err(EconomyError::validation(format!(
                "winner {winner} is not a player of game {}",
                self.id
            )));
        }
        self.winner = Some(winner);
        self.finished = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_game() -> Game {
        Game::new(GameId::new(), vec![PlayerId::new(), PlayerId::new()], Utc::now())
    }

    #[test]
    fn new_game_is_open() {
        let game = two_player_game();
        assert_eq!(game.state(), GameState::Open);
        assert!(game.winner.is_none());
    }

    #[test]
    fn close_sets_winner_and_finished() {
        let mut game = two_player_game();
        let winner = game.players[1];
        let now = Utc::now();
        game.close(winner, now).unwrap();
        assert_eq!(game.state(), GameState::Closed);
        assert_eq!(game.winner, Some(winner));
        assert_eq!(game.finished, Some(now));
    }

    #[test]
    fn second_close_is_already_finished() {
        let mut game = two_player_game();
        let winner = game.players[0];
        game.close(winner, Utc::now()).unwrap();
        let err = game.close(winner, Utc::now()).unwrap_err();
        assert!(matches!(err, EconomyError::AlreadyFinished(id) if id == game.id));
    }

    #[test]
    fn outsider_cannot_win() {
        let mut game = two_player_game();
        let err = game.close(PlayerId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, EconomyError::Validation { .. }));
        assert!(game.is_open());
    }
}
