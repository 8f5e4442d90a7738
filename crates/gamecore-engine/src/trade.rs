//! Trade post: listing, buying, cancelling and expiring sell orders.
//!
//! Each command is one read-write unit of work. Buying composes the balance
//! transfer, the custody move and the order transition in a single
//! transaction, so a fulfilment is either complete or absent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gamecore_ledger::{BalanceLedger, ItemCustody, Transfer};
use gamecore_store::{ReadTxn, Store, TransactionCoordinator, WriteTxn};
use gamecore_types::{
    Clock, EconomyConfig, EconomyError, OrderId, Player, PlayerId, PlayerItem, PlayerItemId, Result,
    TradeOrder, constants,
};
use rand::Rng;
use rust_decimal::Decimal;

use crate::sampler::ContentionSampler;

/// Parameters of a new sell order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrder {
    pub lister: PlayerId,
    pub player_item: PlayerItemId,
    pub price: Decimal,
    /// Defaults to now plus the configured order lifetime.
    pub expires: Option<DateTime<Utc>>,
}

/// The trade-order state machine.
pub struct TradeOrderEngine<S: Store> {
    coordinator: TransactionCoordinator<S>,
    clock: Arc<dyn Clock>,
    config: Arc<EconomyConfig>,
    open_orders: ContentionSampler,
    buyers: ContentionSampler,
    listable_items: ContentionSampler,
}

impl<S: Store> TradeOrderEngine<S> {
    #[must_use]
    pub fn new(
        coordinator: TransactionCoordinator<S>,
        clock: Arc<dyn Clock>,
        config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            open_orders: ContentionSampler::new(config.sample_window),
            buyers: ContentionSampler::new(config.buyer_candidate_limit),
            listable_items: ContentionSampler::new(config.listable_item_candidate_limit),
            coordinator,
            clock,
            config,
        }
    }

    // =================================================================
    // Commands
    // =================================================================

    /// Put a held item up for sale.
    ///
    /// # Errors
    /// - `Validation` for a non-positive price or an expiry not in the future
    /// - `PlayerItemNotFound` if the lister does not hold the item
    /// - `ItemNotListable` if the item is hidden or expired
    pub fn list_order(&self, req: &ListOrder) -> Result<OrderId> {
        if req.price <= Decimal::ZERO {
            return Err(EconomyError::validation(format!(
                "list price must be positive, got {}",
                req.price
            )));
        }

        let id = OrderId::new();
        let order = self.coordinator.read_write("list_order", |txn| {
            let now = self.clock.now();
            let item = held_item(txn, req.lister, req.player_item)?;
            if let Some(reason) = item.unlistable_reason(now) {
                return Err(EconomyError::ItemNotListable {
                    owner: req.lister,
                    item: req.player_item,
                    reason: reason.to_string(),
                });
            }
            let expires = match req.expires {
                Some(at) if at <= now => {
                    return Err(EconomyError::validation(format!(
                        "order expiry {at} is not in the future"
                    )));
                }
                Some(at) => at,
                None => {
                    let lifetime = self.config.default_order_expiry()?;
                    now.checked_add_signed(lifetime).ok_or_else(|| {
                        EconomyError::validation(format!(
                            "order lifetime {lifetime} from {now} is out of range"
                        ))
                    })?
                }
            };

            let order = TradeOrder::new_sell(id, req.lister, req.player_item, req.price, now, expires);
            ItemCustody::set_visibility(txn, req.lister, req.player_item, false)?;
            txn.insert_trade_order(order.clone());
            Ok(order)
        })?;

        tracing::info!(
            order = %order.id,
            lister = %order.lister,
            item = %order.player_item,
            price = %order.list_price,
            expires = %order.expires,
            "order listed"
        );
        Ok(order.id)
    }

    /// Fill an active order: pay the lister, hand the item to the buyer.
    ///
    /// # Errors
    /// - `OrderNotFound` / `PlayerNotFound` for missing rows
    /// - `OrderNotFillable` unless the order is active and unexpired
    /// - `Validation` if the buyer is the lister
    /// - `InsufficientFunds` if the buyer cannot pay the list price
    pub fn buy_order(&self, order_id: OrderId, buyer: PlayerId) -> Result<OrderId> {
        let order = self.coordinator.read_write("buy_order", |txn| {
            let now = self.clock.now();
            let mut order = load_order(txn, order_id)?;
            order.ensure_fillable(now)?;

            let purchaser = txn.player(buyer)?.ok_or(EconomyError::PlayerNotFound(buyer))?;
            if purchaser.id == order.lister {
                return Err(EconomyError::validation(format!(
                    "player {buyer} cannot buy their own order {order_id}"
                )));
            }
            if purchaser.account_balance < order.list_price {
                return Err(EconomyError::InsufficientFunds {
                    player: buyer,
                    needed: order.list_price,
                    available: purchaser.account_balance,
                });
            }

            let session = purchaser.current_game;
            BalanceLedger::transfer(
                txn,
                &Transfer {
                    from: buyer,
                    to: order.lister,
                    amount: order.list_price,
                    game_session: session,
                    source: constants::TRADEPOST_SOURCE.to_string(),
                },
            )?;
            ItemCustody::move_item(txn, order.player_item, order.lister, buyer, session, now)?;
            order.mark_filled(buyer, now)?;
            txn.update_trade_order(order.clone());
            Ok(order)
        })?;

        tracing::info!(
            order = %order.id,
            buyer = %buyer,
            lister = %order.lister,
            price = %order.list_price,
            "order filled"
        );
        Ok(order.id)
    }

    /// Withdraw an active order. Only the lister may cancel.
    ///
    /// The item becomes visible again; balances are untouched.
    pub fn cancel_order(&self, order_id: OrderId, requester: PlayerId) -> Result<OrderId> {
        self.coordinator.read_write("cancel_order", |txn| {
            let now = self.clock.now();
            let mut order = load_order(txn, order_id)?;
            if order.lister != requester {
                return Err(EconomyError::validation(format!(
                    "only the lister may cancel order {order_id}"
                )));
            }
            order.mark_cancelled(now)?;
            ItemCustody::set_visibility(txn, order.lister, order.player_item, true)?;
            txn.update_trade_order(order);
            Ok(())
        })?;

        tracing::info!(order = %order_id, lister = %requester, "order cancelled");
        Ok(order_id)
    }

    /// Expire an active order whose expiry has been reached.
    pub fn expire_order(&self, order_id: OrderId) -> Result<OrderId> {
        self.coordinator.read_write("expire_order", |txn| {
            let now = self.clock.now();
            let order = load_order(txn, order_id)?;
            expire(txn, order, now)
        })?;

        tracing::info!(order = %order_id, "order expired");
        Ok(order_id)
    }

    /// Expire up to `limit` due orders in one transaction, oldest expiry first.
    pub fn expire_due_orders(&self, limit: usize) -> Result<Vec<OrderId>> {
        let expired = self.coordinator.read_write("expire_due_orders", |txn| {
            let now = self.clock.now();
            let due = txn.due_orders(now, limit)?;
            let mut ids = Vec::with_capacity(due.len());
            for order in due {
                ids.push(order.id);
                expire(txn, order, now)?;
            }
            Ok(ids)
        })?;

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "due orders expired");
        }
        Ok(expired)
    }

    // =================================================================
    // Queries
    // =================================================================

    pub fn order(&self, order_id: OrderId) -> Result<TradeOrder> {
        self.coordinator
            .read_only("order", |txn| load_order(txn, order_id))
    }

    /// A random open order among the newest `sample_window`.
    pub fn sample_open_order<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<TradeOrder>> {
        let now = self.clock.now();
        self.coordinator.read_only("sample_open_order", |txn| {
            self.open_orders
                .sample(rng, |limit| txn.open_orders(now, limit))
        })
    }

    /// A random player in a game, other than the lister, who can afford `order`.
    pub fn sample_buyer<R: Rng + ?Sized>(&self, order: &TradeOrder, rng: &mut R) -> Result<Option<Player>> {
        self.coordinator.read_only("sample_buyer", |txn| {
            self.buyers.sample(rng, |limit| {
                txn.funded_players_in_game(order.lister, order.list_price, limit)
            })
        })
    }

    /// A random visible, non-expiring item held by a player in a game.
    pub fn sample_listable_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<PlayerItem>> {
        self.coordinator.read_only("sample_listable_item", |txn| {
            self.listable_items
                .sample(rng, |limit| txn.listable_items(limit))
        })
    }
}

fn load_order<T: ReadTxn + ?Sized>(txn: &mut T, id: OrderId) -> Result<TradeOrder> {
    txn.trade_order(id)?.ok_or(EconomyError::OrderNotFound(id))
}

fn held_item(txn: &mut dyn WriteTxn, owner: PlayerId, item: PlayerItemId) -> Result<PlayerItem> {
    txn.player_item(owner, item)?
        .ok_or(EconomyError::PlayerItemNotFound { owner, item })
}

fn expire(txn: &mut dyn WriteTxn, mut order: TradeOrder, now: DateTime<Utc>) -> Result<()> {
    order.mark_expired(now)?;
    ItemCustody::set_visibility(txn, order.lister, order.player_item, true)?;
    txn.update_trade_order(order);
    Ok(())
}
