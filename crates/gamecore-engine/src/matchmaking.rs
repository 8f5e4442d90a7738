//! Matchmaking: forming games from unassigned players and closing them.
//!
//! ```text
//!   create_game ──▶ OPEN ──close_game──▶ CLOSED
//! ```
//!
//! A player is locked into at most one game through `current_game`. Closing
//! a game records statistics for every player still locked into it and
//! releases them. Concurrent closers all re-check `finished` inside the
//! closing transaction; exactly one of them commits.

use std::sync::Arc;

use gamecore_store::{Store, TransactionCoordinator};
use gamecore_types::{
    Clock, EconomyConfig, EconomyError, Game, GameId, Player, PlayerId, PlayerStats, Result,
};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::sampler::ContentionSampler;

/// The game lifecycle state machine.
pub struct MatchmakingEngine<S: Store> {
    coordinator: TransactionCoordinator<S>,
    clock: Arc<dyn Clock>,
    config: Arc<EconomyConfig>,
    open_games: ContentionSampler,
}

impl<S: Store> MatchmakingEngine<S> {
    #[must_use]
    pub fn new(
        coordinator: TransactionCoordinator<S>,
        clock: Arc<dyn Clock>,
        config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            open_games: ContentionSampler::new(config.sample_window),
            coordinator,
            clock,
            config,
        }
    }

    /// Form a game from up to `players_per_game` randomly chosen unassigned
    /// players and lock them into it.
    ///
    /// Fewer eligible players than requested, including none, still creates
    /// the game.
    pub fn create_game<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Game> {
        let id = GameId::new();
        let game = self.coordinator.read_write("create_game", |txn| {
            let now = self.clock.now();
            let candidates = txn.unassigned_players(self.config.player_candidate_limit)?;
            let chosen = ContentionSampler::choose_many(&mut *rng, &candidates, self.config.players_per_game);

            let game = Game::new(id, chosen.iter().map(|p| p.id).collect(), now);
            txn.insert_game(game.clone());
            for mut player in chosen {
                player.current_game = Some(id);
                txn.update_player(player);
            }
            Ok(game)
        })?;

        tracing::info!(game = %game.id, players = game.players.len(), "game created");
        Ok(game)
    }

    /// A random open game among the `sample_window` most recently created.
    pub fn open_game<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<Game>> {
        let picked = self.coordinator.read_only("open_game", |txn| {
            self.open_games.sample(rng, |limit| txn.open_games(limit))
        })?;
        if let Some(game) = &picked {
            tracing::debug!(game = %game.id, "open game sampled");
        }
        Ok(picked)
    }

    /// Close `game_id`, picking the winner uniformly among the players still
    /// locked into it.
    ///
    /// # Errors
    /// - `GameNotFound` if the game does not exist
    /// - `AlreadyFinished` if it was already closed
    /// - `NoPlayersInGame` if none of its players still reference it
    pub fn close_game<R: Rng + ?Sized>(&self, game_id: GameId, rng: &mut R) -> Result<PlayerId> {
        let winner = self.coordinator.read_write("close_game", |txn| {
            let now = self.clock.now();
            let mut game = txn.game(game_id)?.ok_or(EconomyError::GameNotFound(game_id))?;
            if !game.is_open() {
                return Err(EconomyError::AlreadyFinished(game_id));
            }

            let current: Vec<Player> = txn
                .players(&game.players)?
                .into_iter()
                .filter(|p| p.is_playing(game_id))
                .collect();
            let winner = current
                .choose(&mut *rng)
                .map(|p| p.id)
                .ok_or(EconomyError::NoPlayersInGame(game_id))?;

            for mut player in current {
                let mut stats = player.stats_or_default();
                stats.record_game(player.id == winner);
                player.stats = Some(stats);
                player.current_game = None;
                txn.update_player(player);
            }
            game.close(winner, now)?;
            txn.update_game(game);
            Ok(winner)
        })?;

        tracing::info!(game = %game_id, winner = %winner, "game closed");
        Ok(winner)
    }

    pub fn game(&self, game_id: GameId) -> Result<Game> {
        self.coordinator.read_only("game", |txn| {
            txn.game(game_id)?.ok_or(EconomyError::GameNotFound(game_id))
        })
    }

    /// Statistics of `player`, zero if none were recorded yet.
    pub fn player_stats(&self, player: PlayerId) -> Result<PlayerStats> {
        self.coordinator.read_only("player_stats", |txn| {
            txn.player(player)?
                .map(|p| p.stats_or_default())
                .ok_or(EconomyError::PlayerNotFound(player))
        })
    }
}
