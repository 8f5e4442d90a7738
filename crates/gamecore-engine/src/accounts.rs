//! Player account operations, each in its own transaction.

use std::sync::Arc;

use gamecore_ledger::{BalanceLedger, ItemCustody, Transfer, TransferReceipt};
use gamecore_store::{Store, TransactionCoordinator};
use gamecore_types::{
    Clock, EconomyError, GameItemId, LedgerEntry, Player, PlayerId, PlayerItem, Result,
};
use rust_decimal::Decimal;

/// Balance and inventory commands for individual players.
pub struct PlayerAccounts<S: Store> {
    coordinator: TransactionCoordinator<S>,
    clock: Arc<dyn Clock>,
}

impl<S: Store> PlayerAccounts<S> {
    #[must_use]
    pub fn new(coordinator: TransactionCoordinator<S>, clock: Arc<dyn Clock>) -> Self {
        Self { coordinator, clock }
    }

    /// Move `amount` from `from` to `to`, tagged with the payer's current game.
    pub fn transfer_balance(
        &self,
        from: PlayerId,
        to: PlayerId,
        amount: Decimal,
        source: &str,
    ) -> Result<TransferReceipt> {
        let receipt = self.coordinator.read_write("transfer_balance", |txn| {
            let session = txn
                .player(from)?
                .ok_or(EconomyError::PlayerNotFound(from))?
                .current_game;
            BalanceLedger::transfer(
                txn,
                &Transfer {
                    from,
                    to,
                    amount,
                    game_session: session,
                    source: source.to_string(),
                },
            )
        })?;

        tracing::info!(
            from = %from,
            to = %to,
            amount = %amount,
            source,
            from_balance = %receipt.from_balance,
            "balance transferred"
        );
        Ok(receipt)
    }

    /// Credit (positive `delta`) or debit (negative) one player. Returns the
    /// new balance.
    pub fn adjust_balance(&self, player: PlayerId, delta: Decimal, source: &str) -> Result<Decimal> {
        let balance = self.coordinator.read_write("adjust_balance", |txn| {
            BalanceLedger::adjust(txn, player, delta, source)
        })?;

        tracing::info!(player = %player, delta = %delta, balance = %balance, source, "balance adjusted");
        Ok(balance)
    }

    /// Give `player` a fresh instance of catalog item `item`.
    pub fn acquire_item(&self, player: PlayerId, item: GameItemId, source: &str) -> Result<PlayerItem> {
        let acquired = self.coordinator.read_write("acquire_item", |txn| {
            ItemCustody::acquire(txn, player, item, source, self.clock.now())
        })?;

        tracing::info!(
            player = %player,
            item = %item,
            player_item = %acquired.id,
            price = %acquired.price,
            "item acquired"
        );
        Ok(acquired)
    }

    pub fn player(&self, id: PlayerId) -> Result<Player> {
        self.coordinator
            .read_only("player", |txn| txn.player(id)?.ok_or(EconomyError::PlayerNotFound(id)))
    }

    /// Ledger rows of `player`, in commit order.
    pub fn ledger(&self, player: PlayerId) -> Result<Vec<LedgerEntry>> {
        self.coordinator
            .read_only("ledger", |txn| txn.ledger_entries(player))
    }

    pub fn items(&self, player: PlayerId) -> Result<Vec<PlayerItem>> {
        self.coordinator
            .read_only("items", |txn| txn.player_items(player))
    }
}
