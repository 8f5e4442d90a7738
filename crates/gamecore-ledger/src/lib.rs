//! # gamecore-ledger
//!
//! Building blocks that run inside a caller's read-write transaction:
//!
//! - [`BalanceLedger`]: double-entry balance transfers and single-sided adjustments
//! - [`ItemCustody`]: item acquisition, custody transfer and visibility
//! - [`SupplyAudit`]: conservation check over a set of players
//!
//! None of these commit. Engines compose them inside one
//! `TransactionCoordinator::read_write` closure so that a fulfilment either
//! happens completely or not at all.

pub mod audit;
pub mod balance;
pub mod custody;

pub use audit::SupplyAudit;
pub use balance::{BalanceLedger, Transfer, TransferReceipt};
pub use custody::ItemCustody;
