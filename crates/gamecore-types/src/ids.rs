//! Globally unique identifiers used throughout gamecore.
//!
//! Every entity ID is an opaque UUID. New IDs are minted as UUIDv7 so that
//! rows created later sort later, which keeps "newest first" scans cheap.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID newtype with the common constructors and trait impls.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a fresh, time-ordered identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            /// Parse the canonical hyphenated form used by the persisted schema.
            pub fn parse(s: &str) -> crate::Result<Self> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    crate::EconomyError::Validation {
                        reason: format!("malformed {} '{s}': {e}", stringify!($name)),
                    }
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

uuid_id!(
    /// Identifier of a player account (`playerUUID`).
    PlayerId
);

// ---------------------------------------------------------------------------
// GameItemId
// ---------------------------------------------------------------------------

uuid_id!(
    /// Identifier of a catalog item (`itemUUID`).
    GameItemId
);

// ---------------------------------------------------------------------------
// PlayerItemId
// ---------------------------------------------------------------------------

uuid_id!(
    /// Identifier of one owned item instance (`playerItemUUID`).
    ///
    /// The identifier survives custody transfers: the row is re-keyed under
    /// the new owner but keeps the same `PlayerItemId`.
    PlayerItemId
);

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

uuid_id!(
    /// Identifier of a trade-post order (`orderUUID`).
    OrderId
);

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

uuid_id!(
    /// Identifier of a game, also used as the game-session tag on items
    /// and ledger entries (`gameUUID`).
    GameId
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(PlayerId::new(), PlayerId::new());
        assert_ne!(OrderId::new(), OrderId::new());
        assert_ne!(GameId::new(), GameId::new());
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = GameId::new();
        let b = GameId::new();
        assert!(a < b);
    }

    #[test]
    fn parse_accepts_display_form() {
        let id = PlayerItemId::new();
        let back = PlayerItemId::parse(&id.to_string()).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = OrderId::parse("not-a-uuid").unwrap_err();
        assert!(format!("{err}").starts_with("GC_ERR_100"), "Got: {err}");
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let id = PlayerId::from_bytes([7u8; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
