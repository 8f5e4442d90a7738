//! Item custody: who holds which item instance.
//!
//! A `player_items` row is keyed by `(owner, id)`, so a custody transfer is a
//! re-key: insert the row under the new owner, delete it under the old one,
//! both in the caller's transaction. The item instance keeps its identifier
//! and its frozen acquisition price.

use chrono::{DateTime, Utc};
use gamecore_store::WriteTxn;
use gamecore_types::{
    EconomyError, GameId, GameItemId, PlayerId, PlayerItem, PlayerItemId, Result,
};

/// Custody operations. Stateless; all state lives in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCustody;

impl ItemCustody {
    /// Buffer the move of `item` from `from` to `to`.
    ///
    /// The new row is visible, has no expiry, is tagged with `game_session`
    /// and acquired at `now`. Returns the row as it will be committed.
    ///
    /// # Errors
    /// `PlayerItemNotFound` if `from` does not hold `item`; nothing is buffered.
    pub fn move_item(
        txn: &mut dyn WriteTxn,
        item: PlayerItemId,
        from: PlayerId,
        to: PlayerId,
        game_session: Option<GameId>,
        now: DateTime<Utc>,
    ) -> Result<PlayerItem> {
        let held = load_player_item(txn, from, item)?;
        let moved = PlayerItem {
            owner: to,
            game_session,
            acquire_time: now,
            expires_time: None,
            visible: true,
            ..held
        };
        txn.insert_player_item(moved.clone());
        txn.delete_player_item(from, item);
        tracing::debug!(item = %item, from = %from, to = %to, "custody move buffered");
        Ok(moved)
    }

    /// Buffer a fresh instance of catalog item `item` for `player`.
    ///
    /// The catalog value is frozen as the acquisition price; the player's
    /// current game (if any) becomes the session tag.
    ///
    /// # Errors
    /// `ItemNotFound` or `PlayerNotFound` when either row is missing.
    pub fn acquire(
        txn: &mut dyn WriteTxn,
        player: PlayerId,
        item: GameItemId,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerItem> {
        let catalog = txn.game_item(item)?.ok_or(EconomyError::ItemNotFound(item))?;
        let owner = txn.player(player)?.ok_or(EconomyError::PlayerNotFound(player))?;

        let acquired = PlayerItem {
            id: PlayerItemId::new(),
            owner: owner.id,
            item: catalog.id,
            price: catalog.value,
            source: source.to_string(),
            game_session: owner.current_game,
            acquire_time: now,
            expires_time: None,
            visible: true,
        };
        txn.insert_player_item(acquired.clone());
        Ok(acquired)
    }

    /// Buffer a change of the visibility flag on `(owner, item)`.
    ///
    /// # Errors
    /// `PlayerItemNotFound` if the row is missing.
    pub fn set_visibility(
        txn: &mut dyn WriteTxn,
        owner: PlayerId,
        item: PlayerItemId,
        visible: bool,
    ) -> Result<PlayerItem> {
        let mut held = load_player_item(txn, owner, item)?;
        held.visible = visible;
        txn.update_player_item(held.clone());
        Ok(held)
    }
}

fn load_player_item(txn: &mut dyn WriteTxn, owner: PlayerId, item: PlayerItemId) -> Result<PlayerItem> {
    txn.player_item(owner, item)?
        .ok_or(EconomyError::PlayerItemNotFound { owner, item })
}
