//! Double-entry balance ledger.
//!
//! Every balance change is a player row update plus an append to
//! `player_ledger_entries`, buffered into the caller's transaction:
//! 1. Validate the request (amount, participants)
//! 2. Read the affected players
//! 3. Compute new balances with checked arithmetic
//! 4. Check the postings net to zero (transfers only)
//! 5. Buffer the player updates and the postings
//!
//! Nothing here commits. If a later step of the caller's unit of work fails,
//! the buffered writes are discarded with the transaction.

use gamecore_store::WriteTxn;
use gamecore_types::{
    EconomyError, GameId, LedgerPosting, Player, PlayerId, Result, net_postings,
};
use rust_decimal::Decimal;

/// A request to move `amount` from one player's balance to another's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: PlayerId,
    pub to: PlayerId,
    pub amount: Decimal,
    /// Session tag written on both postings.
    pub game_session: Option<GameId>,
    pub source: String,
}

/// Post-transfer balances of both participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}

/// Balance ledger operations. Stateless; all state lives in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceLedger;

impl BalanceLedger {
    /// Buffer a transfer of `t.amount` from `t.from` to `t.to`.
    ///
    /// # Errors
    /// - `Validation` if the amount is not positive or a balance would overflow
    /// - `SelfTransfer` if `from == to`
    /// - `PlayerNotFound` if either player is missing
    /// - `InsufficientFunds` if the payer's balance is below the amount
    pub fn transfer(txn: &mut dyn WriteTxn, t: &Transfer) -> Result<TransferReceipt> {
        if t.amount <= Decimal::ZERO {
            return Err(EconomyError::validation(format!(
                "transfer amount must be positive, got {}",
                t.amount
            )));
        }
        if t.from == t.to {
            return Err(EconomyError::SelfTransfer(t.from));
        }

        let mut payer = load_player(txn, t.from)?;
        let mut payee = load_player(txn, t.to)?;

        if payer.account_balance < t.amount {
            return Err(EconomyError::InsufficientFunds {
                player: payer.id,
                needed: t.amount,
                available: payer.account_balance,
            });
        }

        let from_balance = payer
            .account_balance
            .checked_sub(t.amount)
            .ok_or_else(|| overflow(payer.id))?;
        let to_balance = payee
            .account_balance
            .checked_add(t.amount)
            .ok_or_else(|| overflow(payee.id))?;

        let postings = [
            LedgerPosting {
                player: payer.id,
                amount: -t.amount,
                game_session: t.game_session,
                source: t.source.clone(),
            },
            LedgerPosting {
                player: payee.id,
                amount: t.amount,
                game_session: t.game_session,
                source: t.source.clone(),
            },
        ];
        let net = net_postings(&postings);
        if !net.is_zero() {
            return Err(EconomyError::SupplyInvariantViolation {
                reason: format!("transfer {} -> {} nets to {net}", t.from, t.to),
            });
        }

        payer.account_balance = from_balance;
        payee.account_balance = to_balance;
        txn.update_player(payer);
        txn.update_player(payee);
        for posting in postings {
            txn.append_ledger_entry(posting);
        }

        tracing::debug!(
            from = %t.from,
            to = %t.to,
            amount = %t.amount,
            source = %t.source,
            "transfer buffered"
        );
        Ok(TransferReceipt {
            from_balance,
            to_balance,
        })
    }

    /// Buffer a single-sided change of `delta` to `player`'s balance.
    ///
    /// The posting is tagged with the player's current game. Returns the new
    /// balance.
    ///
    /// # Errors
    /// - `Validation` if `delta` is zero or the balance would overflow
    /// - `PlayerNotFound` if the player is missing
    /// - `InsufficientFunds` if the balance would go below zero
    pub fn adjust(
        txn: &mut dyn WriteTxn,
        player: PlayerId,
        delta: Decimal,
        source: &str,
    ) -> Result<Decimal> {
        if delta.is_zero() {
            return Err(EconomyError::validation("balance adjustment must be non-zero"));
        }
        let mut row = load_player(txn, player)?;
        let balance = row
            .account_balance
            .checked_add(delta)
            .ok_or_else(|| overflow(player))?;
        if balance < Decimal::ZERO {
            return Err(EconomyError::InsufficientFunds {
                player,
                needed: -delta,
                available: row.account_balance,
            });
        }

        let session = row.current_game;
        row.account_balance = balance;
        txn.update_player(row);
        txn.append_ledger_entry(LedgerPosting {
            player,
            amount: delta,
            game_session: session,
            source: source.to_string(),
        });
        tracing::debug!(player = %player, delta = %delta, source, "adjustment buffered");
        Ok(balance)
    }
}

fn load_player(txn: &mut dyn WriteTxn, id: PlayerId) -> Result<Player> {
    txn.player(id)?.ok_or(EconomyError::PlayerNotFound(id))
}

fn overflow(player: PlayerId) -> EconomyError {
    EconomyError::validation(format!("balance of player {player} would overflow"))
}
