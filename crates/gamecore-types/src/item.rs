//! Catalog items and the custody records of items held by players.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GameId, GameItemId, PlayerId, PlayerItemId};

/// A catalog entry (`game_items`). Created by the item catalog upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameItem {
    #[serde(rename = "itemUUID")]
    pub id: GameItemId,
    #[serde(rename = "item_name")]
    pub name: String,
    /// Current catalog value. Copied into a [`PlayerItem`] on acquisition.
    #[serde(rename = "item_value")]
    pub value: Decimal,
    pub available_time: DateTime<Utc>,
    /// Availability duration in seconds.
    pub duration: i64,
}

/// One item instance owned by one player (`player_items`).
///
/// Keyed by `(owner, id)`. A custody transfer deletes the row under the old
/// owner and re-inserts it under the new one with the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerItem {
    #[serde(rename = "playerItemUUID")]
    pub id: PlayerItemId,
    #[serde(rename = "playerUUID")]
    pub owner: PlayerId,
    #[serde(rename = "itemUUID")]
    pub item: GameItemId,
    /// Catalog value frozen at acquisition time.
    pub price: Decimal,
    pub source: String,
    pub game_session: Option<GameId>,
    pub acquire_time: DateTime<Utc>,
    pub expires_time: Option<DateTime<Utc>>,
    /// `false` while the item is listed on the trade post.
    pub visible: bool,
}

impl PlayerItem {
    /// Whether the item has an expiry at or before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_time.is_some_and(|expires| expires <= now)
    }

    /// Why the item cannot be put up for sale, or `None` if it can.
    #[must_use]
    pub fn unlistable_reason(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if !self.visible {
            Some("item is not visible")
        } else if self.is_expired(now) {
            Some("item is expired")
        } else {
            None
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl GameItem {
    pub fn dummy(value: Decimal) -> Self {
        Self {
            id: GameItemId::new(),
            name: "dummy item".to_string(),
            value,
            available_time: Utc::now(),
            duration: 0,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl PlayerItem {
    /// A visible, non-expiring instance of `item` owned by `owner`.
    pub fn dummy(owner: PlayerId, item: &GameItem) -> Self {
        Self {
            id: PlayerItemId::new(),
            owner,
            item: item.id,
            price: item.value,
            source: "loot".to_string(),
            game_session: None,
            acquire_time: Utc::now(),
            expires_time: None,
            visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlayerItem {
        PlayerItem::dummy(PlayerId::new(), &GameItem::dummy(Decimal::new(314, 2)))
    }

    #[test]
    fn visible_unexpired_item_is_listable() {
        assert_eq!(sample().unlistable_reason(Utc::now()), None);
    }

    #[test]
    fn hidden_item_is_not_listable() {
        let mut pi = sample();
        pi.visible = false;
        assert_eq!(pi.unlistable_reason(Utc::now()), Some("item is not visible"));
    }

    #[test]
    fn expired_item_is_not_listable() {
        let now = Utc::now();
        let mut pi = sample();
        pi.expires_time = Some(now - chrono::Duration::seconds(1));
        assert!(pi.is_expired(now));
        assert_eq!(pi.unlistable_reason(now), Some("item is expired"));
    }

    #[test]
    fn rows_persist_under_column_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let mut columns: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        columns.sort_unstable();
        assert_eq!(
            columns,
            [
                "acquire_time",
                "expires_time",
                "game_session",
                "itemUUID",
                "playerItemUUID",
                "playerUUID",
                "price",
                "source",
                "visible",
            ]
        );

        let catalog = serde_json::to_value(GameItem::dummy(Decimal::ONE)).unwrap();
        for column in ["itemUUID", "item_name", "item_value", "available_time", "duration"] {
            assert!(catalog.get(column).is_some(), "missing {column}");
        }
    }

    #[test]
    fn future_expiry_is_still_listable() {
        let now = Utc::now();
        let mut pi = sample();
        pi.expires_time = Some(now + chrono::Duration::hours(1));
        assert!(!pi.is_expired(now));
        assert_eq!(pi.unlistable_reason(now), None);
    }
}
