//! # Trade orders: the trade-post state machine
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐   buy     ┌────────┐
//!   │ ACTIVE ├──────────▶│ FILLED │
//!   └───┬─┬──┘           └────────┘
//!       │ │ cancel       ┌───────────┐
//!       │ └─────────────▶│ CANCELLED │
//!       │                └───────────┘
//!       │ expire         ┌─────────┐
//!       └───────────────▶│ EXPIRED │
//!                        └─────────┘
//! ```
//!
//! Every transition leaves `Active` and is irreversible. In storage the state
//! is the four mutually exclusive flags `active`, `filled`, `cancelled`,
//! `expired`; exactly one of them is set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EconomyError, OrderId, PlayerId, PlayerItemId, Result};

/// Lifecycle state of a trade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "OrderFlags", try_from = "OrderFlags")]
pub enum OrderState {
    /// Listed and purchasable until `expires`.
    Active,
    /// Bought. **Irreversible.**
    Filled,
    /// Withdrawn by the lister.
    Cancelled,
    /// Passed its expiry without being bought.
    Expired,
}

impl OrderState {
    /// Can the order move from this state to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Filled | Self::Cancelled | Self::Expired)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// The persisted projection of [`OrderState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlags {
    pub active: bool,
    pub filled: bool,
    pub cancelled: bool,
    pub expired: bool,
}

impl From<OrderState> for OrderFlags {
    fn from(state: OrderState) -> Self {
        let mut flags = Self::default();
        match state {
            OrderState::Active => flags.active = true,
            OrderState::Filled => flags.filled = true,
            OrderState::Cancelled => flags.cancelled = true,
            OrderState::Expired => flags.expired = true,
        }
        flags
    }
}

impl TryFrom<OrderFlags> for OrderState {
    type Error = EconomyError;

    fn try_from(flags: OrderFlags) -> Result<Self> {
        match (flags.active, flags.filled, flags.cancelled, flags.expired) {
            (true, false, false, false) => Ok(Self::Active),
            (false, true, false, false) => Ok(Self::Filled),
            (false, false, true, false) => Ok(Self::Cancelled),
            (false, false, false, true) => Ok(Self::Expired),
            _ => Err(EconomyError::Serialization(format!(
                "order flags are not mutually exclusive: {flags:?}"
            ))),
        }
    }
}

/// Kind of trade. Only sell orders exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Sell,
}

/// A trade-post order (`trade_orders`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradeOrder {
    #[serde(rename = "orderUUID")]
    pub id: OrderId,
    pub lister: PlayerId,
    /// Set once, when the order is filled.
    pub buyer: Option<PlayerId>,
    #[serde(rename = "playerItemUUID")]
    pub player_item: PlayerItemId,
    pub trade_type: TradeType,
    pub list_price: Decimal,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    /// Set once, when the order reaches a terminal state.
    pub ended: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub state: OrderState,
}

impl TradeOrder {
    /// A new active sell order.
    #[must_use]
    pub fn new_sell(
        id: OrderId,
        lister: PlayerId,
        player_item: PlayerItemId,
        list_price: Decimal,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            lister,
            buyer: None,
            player_item,
            trade_type: TradeType::Sell,
            list_price,
            created,
            expires,
            ended: None,
            state: OrderState::Active,
        }
    }

    /// Whether the order's expiry has been reached at `now`. An order is
    /// expired from the `expires` instant on.
    #[must_use]
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Whether a buyer could fill this order at `now`.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.state == OrderState::Active && !self.is_past_expiry(now)
    }

    /// Check that the order can be bought at `now`.
    pub fn ensure_fillable(&self, now: DateTime<Utc>) -> Result<()> {
        if self.state != OrderState::Active {
            return Err(self.not_fillable("filled", format!("order is {}", self.state)));
        }
        if self.is_past_expiry(now) {
            return Err(self.not_fillable("filled", format!("order expired at {}", self.expires)));
        }
        Ok(())
    }

    /// Transition to FILLED.
    pub fn mark_filled(&mut self, buyer: PlayerId, now: DateTime<Utc>) -> Result<()> {
        self.ensure_fillable(now)?;
        self.transition(OrderState::Filled, "filled", now)?;
        self.buyer = Some(buyer);
        Ok(())
    }

    /// Transition to CANCELLED.
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(OrderState::Cancelled, "cancelled", now)
    }

    /// Transition to EXPIRED. Only allowed once `expires` is reached.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state == OrderState::Active && !self.is_past_expiry(now) {
            return Err(self.not_fillable("expired", format!("order expires at {}", self.expires)));
        }
        self.transition(OrderState::Expired, "expired", now)
    }

    fn transition(&mut self, target: OrderState, action: &'static str, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(self.not_fillable(
                action,
                format!("cannot transition from {} to {target}", self.state),
            ));
        }
        self.state = target;
        self.ended = Some(now);
        Ok(())
    }

    fn not_fillable(&self, action: &'static str, reason: String) -> EconomyError {
        EconomyError::OrderNotFillable {
            order: self.id,
            action,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_at(now: DateTime<Utc>) -> TradeOrder {
        TradeOrder::new_sell(
            OrderId::new(),
            PlayerId::new(),
            PlayerItemId::new(),
            Decimal::new(314, 2),
            now,
            now + chrono::Duration::hours(24),
        )
    }

    #[test]
    fn only_active_can_transition() {
        use OrderState::*;
        assert!(Active.can_transition_to(Filled));
        assert!(Active.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Expired));
        for terminal in [Filled, Cancelled, Expired] {
            assert!(terminal.is_terminal());
            for target in [Active, Filled, Cancelled, Expired] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn fill_sets_buyer_and_ended() {
        let now = Utc::now();
        let mut order = order_at(now);
        let buyer = PlayerId::new();
        order.mark_filled(buyer, now).unwrap();
        assert_eq!(order.state, OrderState::Filled);
        assert_eq!(order.buyer, Some(buyer));
        assert_eq!(order.ended, Some(now));
    }

    #[test]
    fn second_fill_rejected() {
        let now = Utc::now();
        let mut order = order_at(now);
        order.mark_filled(PlayerId::new(), now).unwrap();
        let err = order.mark_filled(PlayerId::new(), now).unwrap_err();
        assert!(matches!(err, EconomyError::OrderNotFillable { .. }));
    }

    #[test]
    fn expired_order_not_fillable() {
        let now = Utc::now();
        let order = order_at(now);
        let later = now + chrono::Duration::hours(25);
        assert!(!order.is_open_at(later));
        assert!(order.ensure_fillable(later).is_err());
    }

    #[test]
    fn expiry_instant_is_expired_everywhere() {
        let now = Utc::now();
        let mut order = order_at(now);
        let at = order.expires;
        assert!(order.is_open_at(at - chrono::Duration::milliseconds(1)));
        assert!(!order.is_open_at(at));
        assert!(matches!(order.ensure_fillable(at), Err(EconomyError::OrderNotFillable { .. })));
        order.mark_expired(at).unwrap();
    }

    #[test]
    fn expire_before_deadline_rejected() {
        let now = Utc::now();
        let mut order = order_at(now);
        assert!(order.mark_expired(now).is_err());
        order.mark_expired(order.expires).unwrap();
        assert_eq!(order.state, OrderState::Expired);
    }

    #[test]
    fn cancelled_order_cannot_be_filled() {
        let now = Utc::now();
        let mut order = order_at(now);
        order.mark_cancelled(now).unwrap();
        assert!(order.mark_filled(PlayerId::new(), now).is_err());
        assert!(order.mark_expired(order.expires).is_err());
    }

    #[test]
    fn state_persists_as_exclusive_flags() {
        let order = order_at(Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["filled"], false);
        assert_eq!(json["cancelled"], false);
        assert_eq!(json["expired"], false);
        let back: TradeOrder = serde_json::from_value(json).unwrap();
        assert_eq!(back.state, OrderState::Active);
    }

    #[test]
    fn conflicting_flags_rejected() {
        let flags = OrderFlags {
            active: true,
            filled: true,
            ..OrderFlags::default()
        };
        assert!(OrderState::try_from(flags).is_err());
        assert!(OrderState::try_from(OrderFlags::default()).is_err());
    }
}
