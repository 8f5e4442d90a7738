//! The store contract.
//!
//! A store exposes serializable read-write transactions and read-only
//! snapshots. Reads observe committed state only: writes buffered through a
//! [`WriteTxn`] become visible when the transaction commits, so every read a
//! unit of work depends on must be issued before it buffers writes. All reads
//! of one transaction observe the same committed state, so a business error
//! raised from them is never the product of a half-seen concurrent commit.
//!
//! Any read or the final commit may fail with [`EconomyError::Aborted`] when
//! the store detects a serialization conflict. The
//! [`TransactionCoordinator`](crate::TransactionCoordinator) retries those.
//!
//! [`EconomyError::Aborted`]: gamecore_types::EconomyError::Aborted

use chrono::{DateTime, Utc};
use gamecore_types::{
    Game, GameId, GameItem, GameItemId, LedgerEntry, LedgerPosting, OrderId, Player, PlayerId,
    PlayerItem, PlayerItemId, Result, TradeOrder,
};
use rust_decimal::Decimal;

/// Reads, grouped per table.
pub trait ReadTxn {
    // -----------------------------------------------------------------
    // players
    // -----------------------------------------------------------------

    fn player(&mut self, id: PlayerId) -> Result<Option<Player>>;

    /// The subset of `ids` that exist, in the order given.
    fn players(&mut self, ids: &[PlayerId]) -> Result<Vec<Player>>;

    /// Up to `limit` players with no current game.
    fn unassigned_players(&mut self, limit: usize) -> Result<Vec<Player>>;

    /// Up to `limit` players currently in a game, other than `exclude`, whose
    /// balance is strictly greater than `min_balance`.
    fn funded_players_in_game(
        &mut self,
        exclude: PlayerId,
        min_balance: Decimal,
        limit: usize,
    ) -> Result<Vec<Player>>;

    // -----------------------------------------------------------------
    // game_items / player_items
    // -----------------------------------------------------------------

    fn game_item(&mut self, id: GameItemId) -> Result<Option<GameItem>>;

    fn player_item(&mut self, owner: PlayerId, id: PlayerItemId) -> Result<Option<PlayerItem>>;

    fn player_items(&mut self, owner: PlayerId) -> Result<Vec<PlayerItem>>;

    /// Up to `limit` visible, non-expiring items held by players who are
    /// currently in a game.
    fn listable_items(&mut self, limit: usize) -> Result<Vec<PlayerItem>>;

    // -----------------------------------------------------------------
    // trade_orders
    // -----------------------------------------------------------------

    fn trade_order(&mut self, id: OrderId) -> Result<Option<TradeOrder>>;

    /// Up to `limit` active orders with `expires > now`, newest first.
    fn open_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>>;

    /// Up to `limit` active orders with `expires <= now`, oldest expiry first.
    fn due_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>>;

    // -----------------------------------------------------------------
    // games
    // -----------------------------------------------------------------

    fn game(&mut self, id: GameId) -> Result<Option<Game>>;

    /// Up to `limit` unfinished games, most recently created first.
    fn open_games(&mut self, limit: usize) -> Result<Vec<Game>>;

    // -----------------------------------------------------------------
    // player_ledger_entries
    // -----------------------------------------------------------------

    fn ledger_entries(&mut self, player: PlayerId) -> Result<Vec<LedgerEntry>>;
}

/// Buffered writes. Nothing is visible until the owning transaction commits.
///
/// Inserting an existing key or updating a missing one fails the commit with
/// a `Storage` error. Deleting a missing key is a no-op.
pub trait WriteTxn: ReadTxn {
    fn insert_player(&mut self, player: Player);
    fn update_player(&mut self, player: Player);

    fn insert_game_item(&mut self, item: GameItem);

    fn insert_player_item(&mut self, item: PlayerItem);
    fn update_player_item(&mut self, item: PlayerItem);
    fn delete_player_item(&mut self, owner: PlayerId, id: PlayerItemId);

    fn insert_trade_order(&mut self, order: TradeOrder);
    fn update_trade_order(&mut self, order: TradeOrder);

    fn insert_game(&mut self, game: Game);
    fn update_game(&mut self, game: Game);

    /// Append a ledger row. The entry date is the commit timestamp.
    fn append_ledger_entry(&mut self, posting: LedgerPosting);
}

/// A read-write transaction that can be committed.
pub trait StoreTxn: WriteTxn {
    /// View this transaction as a plain [`WriteTxn`].
    fn as_write(&mut self) -> &mut dyn WriteTxn;

    /// Apply every buffered write atomically, or none of them.
    ///
    /// # Errors
    ///
    /// `Aborted` if anything this transaction read changed since it was read;
    /// `Storage` if a buffered write violates a key precondition.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// A transactional store.
pub trait Store: Send + Sync {
    /// Begin a serializable read-write transaction.
    fn begin(&self) -> Box<dyn StoreTxn + '_>;

    /// A consistent read-only view of committed state.
    fn snapshot(&self) -> Box<dyn ReadTxn + '_>;
}
