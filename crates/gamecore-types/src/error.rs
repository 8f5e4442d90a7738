//! Error types for the gamecore economy.
//!
//! All errors use the `GC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by class:
//! - 1xx: Validation errors (caller's fault, never retried)
//! - 2xx: Not-found errors (referenced row absent, never retried)
//! - 3xx: Lifecycle errors (terminal state already reached)
//! - 4xx: Concurrency errors (retryable by the caller)
//! - 9xx: Infrastructure / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{GameId, GameItemId, OrderId, PlayerId, PlayerItemId};

/// Caller-visible classification of an [`EconomyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A business rule was violated.
    Validation,
    /// A referenced player, item, order or game does not exist.
    NotFound,
    /// The game (or order) already reached its terminal state.
    AlreadyFinished,
    /// The unit of work lost a race; the caller may retry.
    Conflict,
    /// Opaque store / configuration failure.
    Infrastructure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyFinished => write!(f, "ALREADY_FINISHED"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Infrastructure => write!(f, "INFRASTRUCTURE"),
        }
    }
}

/// Central error enum for all gamecore operations.
#[derive(Debug, Error)]
pub enum EconomyError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// Generic business-rule or input violation.
    #[error("GC_ERR_100: Validation failed: {reason}")]
    Validation { reason: String },

    /// The payer cannot cover the amount.
    #[error("GC_ERR_101: Insufficient funds for player {player}: need {needed}, have {available}")]
    InsufficientFunds {
        player: PlayerId,
        needed: Decimal,
        available: Decimal,
    },

    /// Source and destination of a transfer are the same player.
    #[error("GC_ERR_102: Player {0} cannot transfer to themselves")]
    SelfTransfer(PlayerId),

    /// The order is not in a state that allows the requested transition.
    #[error("GC_ERR_103: Order {order} cannot be {action}: {reason}")]
    OrderNotFillable {
        order: OrderId,
        action: &'static str,
        reason: String,
    },

    /// The item is hidden or expired and cannot be listed.
    #[error("GC_ERR_104: Item ({owner}, {item}) cannot be listed: {reason}")]
    ItemNotListable {
        owner: PlayerId,
        item: PlayerItemId,
        reason: String,
    },

    // =================================================================
    // Not-Found Errors (2xx)
    // =================================================================
    #[error("GC_ERR_200: Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("GC_ERR_201: Game item not found: {0}")]
    ItemNotFound(GameItemId),

    #[error("GC_ERR_202: Player item ({owner}, {item}) not found")]
    PlayerItemNotFound { owner: PlayerId, item: PlayerItemId },

    #[error("GC_ERR_203: Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("GC_ERR_204: Game not found: {0}")]
    GameNotFound(GameId),

    /// None of the game's players still reference it as their current game.
    #[error("GC_ERR_205: No players found for game {0}")]
    NoPlayersInGame(GameId),

    // =================================================================
    // Lifecycle Errors (3xx)
    // =================================================================
    /// The game already has a finished timestamp.
    #[error("GC_ERR_300: Game {0} is already finished")]
    AlreadyFinished(GameId),

    // =================================================================
    // Concurrency Errors (4xx)
    // =================================================================
    /// The store aborted the transaction (serialization failure). Transient:
    /// the transaction coordinator retries these internally.
    #[error("GC_ERR_400: Transaction aborted: {reason}")]
    Aborted { reason: String },

    /// Retries were exhausted without a successful commit.
    #[error("GC_ERR_401: Transaction '{tag}' conflicted after {attempts} attempts")]
    Conflict { tag: String, attempts: u32 },

    // =================================================================
    // Infrastructure / Internal (9xx)
    // =================================================================
    /// Opaque store failure, surfaced without interpretation.
    #[error("GC_ERR_900: Storage error: {0}")]
    Storage(String),

    /// Configuration error (invalid values, unparsable document, etc.).
    #[error("GC_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("GC_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// Value conservation was violated. Critical safety alert.
    #[error("GC_ERR_903: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },
}

impl EconomyError {
    /// Classify this error for the caller.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::InsufficientFunds { .. }
            | Self::SelfTransfer(_)
            | Self::OrderNotFillable { .. }
            | Self::ItemNotListable { .. } => ErrorKind::Validation,
            Self::PlayerNotFound(_)
            | Self::ItemNotFound(_)
            | Self::PlayerItemNotFound { .. }
            | Self::OrderNotFound(_)
            | Self::GameNotFound(_)
            | Self::NoPlayersInGame(_) => ErrorKind::NotFound,
            Self::AlreadyFinished(_) => ErrorKind::AlreadyFinished,
            Self::Aborted { .. } | Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::SupplyInvariantViolation { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Whether the caller may retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Whether this is the store's serialization-abort signal.
    #[must_use]
    pub fn is_transient_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EconomyError>;

impl From<serde_json::Error> for EconomyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = EconomyError::OrderNotFound(OrderId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("GC_ERR_203"), "Got: {msg}");
    }

    #[test]
    fn insufficient_funds_display() {
        let err = EconomyError::InsufficientFunds {
            player: PlayerId::new(),
            needed: Decimal::new(314, 2),
            available: Decimal::new(100, 2),
        };
        let msg = format!("{err}");
        assert!(msg.contains("GC_ERR_101"));
        assert!(msg.contains("3.14"));
        assert!(msg.contains("1.00"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            EconomyError::SelfTransfer(PlayerId::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EconomyError::NoPlayersInGame(GameId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EconomyError::AlreadyFinished(GameId::new()).kind(),
            ErrorKind::AlreadyFinished
        );
        assert_eq!(
            EconomyError::Storage("disk".into()).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict = EconomyError::Conflict {
            tag: "close_game".into(),
            attempts: 3,
        };
        assert!(conflict.is_retryable());
        assert!(!conflict.is_transient_abort());

        let aborted = EconomyError::Aborted {
            reason: "row changed".into(),
        };
        assert!(aborted.is_transient_abort());

        assert!(!EconomyError::validation("bad").is_retryable());
        assert!(!EconomyError::GameNotFound(GameId::new()).is_retryable());
    }

    #[test]
    fn all_errors_have_gc_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(EconomyError::validation("x")),
            Box::new(EconomyError::PlayerNotFound(PlayerId::new())),
            Box::new(EconomyError::AlreadyFinished(GameId::new())),
            Box::new(EconomyError::Storage("x".into())),
            Box::new(EconomyError::SupplyInvariantViolation { reason: "x".into() }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("GC_ERR_"),
                "Error missing GC_ERR_ prefix: {msg}"
            );
        }
    }
}
