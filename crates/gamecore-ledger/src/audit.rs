//! Supply conservation checker.
//!
//! Transfers only move value between players, so for any set of players:
//! ```text
//! Σ balance(now) == Σ balance(opening) + Σ external adjustments
//! ```
//! A mismatch means value was created or destroyed outside the ledger.

use gamecore_store::ReadTxn;
use gamecore_types::{EconomyError, PlayerId, Result};
use rust_decimal::Decimal;

/// Opening balance total of a fixed player set, plus every single-sided
/// adjustment recorded since.
#[derive(Debug, Clone)]
pub struct SupplyAudit {
    players: Vec<PlayerId>,
    opening: Decimal,
    external: Decimal,
}

impl SupplyAudit {
    /// Snapshot the total balance of `players`.
    ///
    /// # Errors
    /// `PlayerNotFound` if any player is missing.
    pub fn open(txn: &mut dyn ReadTxn, players: Vec<PlayerId>) -> Result<Self> {
        let opening = total_balance(txn, &players)?;
        Ok(Self {
            players,
            opening,
            external: Decimal::ZERO,
        })
    }

    /// Record a single-sided credit (positive) or debit (negative).
    pub fn record_external(&mut self, delta: Decimal) {
        self.external += delta;
    }

    #[must_use]
    pub fn opening_supply(&self) -> Decimal {
        self.opening
    }

    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.opening + self.external
    }

    /// Check the current total against the expected one.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` on mismatch, `PlayerNotFound` if a player vanished.
    pub fn verify(&self, txn: &mut dyn ReadTxn) -> Result<()> {
        let actual = total_balance(txn, &self.players)?;
        let expected = self.expected_supply();
        if actual != expected {
            return Err(EconomyError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual} != expected {expected} \
                     (opening={}, external={})",
                    self.opening, self.external
                ),
            });
        }
        Ok(())
    }
}

fn total_balance(txn: &mut dyn ReadTxn, players: &[PlayerId]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for id in players {
        let player = txn.player(*id)?.ok_or(EconomyError::PlayerNotFound(*id))?;
        total += player.account_balance;
    }
    Ok(total)
}
