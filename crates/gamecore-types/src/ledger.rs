//! Append-only balance ledger records (`player_ledger_entries`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GameId, PlayerId};

/// A balance change about to be recorded. The store stamps the entry date
/// at commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerPosting {
    #[serde(rename = "playerUUID")]
    pub player: PlayerId,
    /// Signed: positive credits the player, negative debits.
    pub amount: Decimal,
    pub game_session: Option<GameId>,
    pub source: String,
}

/// A committed ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    #[serde(rename = "playerUUID")]
    pub player: PlayerId,
    pub amount: Decimal,
    pub game_session: Option<GameId>,
    pub source: String,
    /// Commit timestamp.
    #[serde(rename = "entryDate")]
    pub entry_date: DateTime<Utc>,
}

impl LedgerEntry {
    #[must_use]
    pub fn from_posting(posting: LedgerPosting, entry_date: DateTime<Utc>) -> Self {
        Self {
            player: posting.player,
            amount: posting.amount,
            game_session: posting.game_session,
            source: posting.source,
            entry_date,
        }
    }
}

/// Sum of a set of postings. A balanced transfer nets to zero.
#[must_use]
pub fn net_postings<'a>(postings: impl IntoIterator<Item = &'a LedgerPosting>) -> Decimal {
    postings.into_iter().map(|p| p.amount).sum()
}
