//! # gamecore-types
//!
//! Shared types, errors, and configuration for the **gamecore** economy.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PlayerId`], [`GameItemId`], [`PlayerItemId`], [`OrderId`], [`GameId`]
//! - **Player model**: [`Player`], [`PlayerStats`]
//! - **Item model**: [`GameItem`], [`PlayerItem`]
//! - **Trade model**: [`TradeOrder`], [`OrderState`], [`TradeType`]
//! - **Game model**: [`Game`], [`GameState`]
//! - **Ledger model**: [`LedgerPosting`], [`LedgerEntry`]
//! - **Configuration**: [`EconomyConfig`], [`RetryConfig`]
//! - **Errors**: [`EconomyError`] with `GC_ERR_` prefix codes, classified by [`ErrorKind`]
//! - **Time**: the [`Clock`] abstraction injected into every engine
//! - **Constants**: system-wide limits and defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod ids;
pub mod item;
pub mod ledger;
pub mod player;
pub mod trade_order;

// Re-export all primary types at crate root for ergonomic imports:
//   use gamecore_types::{Player, TradeOrder, Game, EconomyError, ...};

pub use clock::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use ids::*;
pub use item::*;
pub use ledger::*;
pub use player::*;
pub use trade_order::*;

// Constants are accessed via `gamecore_types::constants::FOO`
// (not re-exported to avoid name collisions).
