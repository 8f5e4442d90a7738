//! System-wide constants for the gamecore economy.

/// Default contention window: how many of the newest eligible rows a
/// random pick is drawn from.
pub const DEFAULT_SAMPLE_WINDOW: usize = 10;

/// Default number of players assigned to a new game.
pub const DEFAULT_PLAYERS_PER_GAME: usize = 10;

/// Upper bound on unassigned players read when forming a game.
pub const DEFAULT_PLAYER_CANDIDATE_LIMIT: usize = 10_000;

/// Upper bound on listable items read when sampling an item to sell.
pub const DEFAULT_LISTABLE_ITEM_CANDIDATE_LIMIT: usize = 100;

/// Upper bound on funded players read when sampling a buyer.
pub const DEFAULT_BUYER_CANDIDATE_LIMIT: usize = 10_000;

/// Default lifetime of a trade order: 24 hours.
pub const DEFAULT_ORDER_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Longest accepted order lifetime: ten years.
pub const MAX_ORDER_EXPIRY_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Default number of attempts for a read-write transaction.
pub const DEFAULT_TXN_MAX_ATTEMPTS: u32 = 10;

/// First retry backoff in milliseconds (doubles per attempt).
pub const DEFAULT_TXN_BASE_BACKOFF_MS: u64 = 5;

/// Retry backoff ceiling in milliseconds.
pub const DEFAULT_TXN_MAX_BACKOFF_MS: u64 = 500;

/// Source tag written on ledger entries and items moved by the trade post.
pub const TRADEPOST_SOURCE: &str = "tradepost";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
