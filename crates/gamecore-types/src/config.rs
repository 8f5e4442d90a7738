//! Configuration types for the gamecore engines.
//!
//! Values are process-wide and read-only after startup. Discovering them
//! (files, environment) is the embedding service's job; this module only
//! defines the shape, the defaults, and validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{EconomyError, Result, constants};

/// Retry policy knobs for read-write transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts (first try included) before surfacing `Conflict`.
    pub max_attempts: u32,
    /// Backoff before the second attempt, in milliseconds.
    pub base_backoff_ms: u64,
    /// Backoff ceiling, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_TXN_MAX_ATTEMPTS,
            base_backoff_ms: constants::DEFAULT_TXN_BASE_BACKOFF_MS,
            max_backoff_ms: constants::DEFAULT_TXN_MAX_BACKOFF_MS,
        }
    }
}

/// Engine configuration shared by every gamecore engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Contention window for random picks (open games, open orders, ...).
    pub sample_window: usize,
    /// Players assigned to a freshly created game.
    pub players_per_game: usize,
    /// Unassigned players read when forming a game.
    pub player_candidate_limit: usize,
    /// Listable items read when sampling an item to sell.
    pub listable_item_candidate_limit: usize,
    /// Funded players read when sampling a buyer.
    pub buyer_candidate_limit: usize,
    /// Lifetime of an order listed without an explicit expiry.
    pub default_order_expiry_secs: i64,
    /// Transaction retry policy.
    pub retry: RetryConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            sample_window: constants::DEFAULT_SAMPLE_WINDOW,
            players_per_game: constants::DEFAULT_PLAYERS_PER_GAME,
            player_candidate_limit: constants::DEFAULT_PLAYER_CANDIDATE_LIMIT,
            listable_item_candidate_limit: constants::DEFAULT_LISTABLE_ITEM_CANDIDATE_LIMIT,
            buyer_candidate_limit: constants::DEFAULT_BUYER_CANDIDATE_LIMIT,
            default_order_expiry_secs: constants::DEFAULT_ORDER_EXPIRY_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl EconomyConfig {
    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(doc)
            .map_err(|e| EconomyError::Configuration(format!("invalid config document: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the engines cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("sample_window", self.sample_window),
            ("players_per_game", self.players_per_game),
            ("player_candidate_limit", self.player_candidate_limit),
            ("listable_item_candidate_limit", self.listable_item_candidate_limit),
            ("buyer_candidate_limit", self.buyer_candidate_limit),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(EconomyError::Configuration(format!("{name} must be > 0")));
            }
        }
        if self.players_per_game > self.player_candidate_limit {
            return Err(EconomyError::Configuration(format!(
                "players_per_game ({}) exceeds player_candidate_limit ({})",
                self.players_per_game, self.player_candidate_limit
            )));
        }
        if !(1..=constants::MAX_ORDER_EXPIRY_SECS).contains(&self.default_order_expiry_secs) {
            return Err(EconomyError::Configuration(format!(
                "default_order_expiry_secs must be in 1..={}, got {}",
                constants::MAX_ORDER_EXPIRY_SECS,
                self.default_order_expiry_secs
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(EconomyError::Configuration(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.retry.base_backoff_ms > self.retry.max_backoff_ms {
            return Err(EconomyError::Configuration(format!(
                "retry.base_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.base_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Default order lifetime as a duration.
    ///
    /// # Errors
    /// `Configuration` if the seconds value is outside what a duration can hold.
    pub fn default_order_expiry(&self) -> Result<Duration> {
        Duration::try_seconds(self.default_order_expiry_secs).ok_or_else(|| {
            EconomyError::Configuration(format!(
                "default_order_expiry_secs {} is out of range",
                self.default_order_expiry_secs
            ))
        })
    }
}
