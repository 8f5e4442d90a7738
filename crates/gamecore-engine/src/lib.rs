//! # gamecore-engine
//!
//! The command surface of the gamecore economy:
//!
//! - [`TradeOrderEngine`]: list, buy, cancel and expire sell orders
//! - [`MatchmakingEngine`]: create, sample and close games
//! - [`PlayerAccounts`]: transfers, adjustments and item acquisition
//! - [`ContentionSampler`]: uniform picks from a bounded window of rows
//!
//! Engines hold no mutable state. All of them share one
//! [`TransactionCoordinator`], so any number of threads may call them
//! concurrently; consistency comes from the store's serializable
//! transactions.

pub mod accounts;
pub mod matchmaking;
pub mod sampler;
pub mod trade;

use std::sync::Arc;

use gamecore_store::{RetryPolicy, Store, TransactionCoordinator};
use gamecore_types::{Clock, EconomyConfig, Result};

pub use accounts::PlayerAccounts;
pub use matchmaking::MatchmakingEngine;
pub use sampler::ContentionSampler;
pub use trade::{ListOrder, TradeOrderEngine};

/// All engines wired to one store, one clock and one configuration.
pub struct Economy<S: Store> {
    config: Arc<EconomyConfig>,
    coordinator: TransactionCoordinator<S>,
    trade: TradeOrderEngine<S>,
    matchmaking: MatchmakingEngine<S>,
    accounts: PlayerAccounts<S>,
}

impl<S: Store> Economy<S> {
    /// Validate `config` and build the engines.
    ///
    /// # Errors
    /// `Configuration` if the configuration is rejected.
    pub fn new(store: Arc<S>, config: EconomyConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let coordinator = TransactionCoordinator::new(store, RetryPolicy::from(&config.retry));

        tracing::info!(
            version = gamecore_types::constants::VERSION,
            sample_window = config.sample_window,
            players_per_game = config.players_per_game,
            max_attempts = config.retry.max_attempts,
            "economy initialised"
        );

        Ok(Self {
            trade: TradeOrderEngine::new(coordinator.clone(), Arc::clone(&clock), Arc::clone(&config)),
            matchmaking: MatchmakingEngine::new(coordinator.clone(), Arc::clone(&clock), Arc::clone(&config)),
            accounts: PlayerAccounts::new(coordinator.clone(), clock),
            coordinator,
            config,
        })
    }

    #[must_use]
    pub fn trade(&self) -> &TradeOrderEngine<S> {
        &self.trade
    }

    #[must_use]
    pub fn matchmaking(&self) -> &MatchmakingEngine<S> {
        &self.matchmaking
    }

    #[must_use]
    pub fn accounts(&self) -> &PlayerAccounts<S> {
        &self.accounts
    }

    /// The shared coordinator, for callers composing their own units of work.
    #[must_use]
    pub fn coordinator(&self) -> &TransactionCoordinator<S> {
        &self.coordinator
    }

    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }
}
