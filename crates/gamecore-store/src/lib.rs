//! # gamecore-store
//!
//! The transactional store contract the gamecore engines run against, the
//! [`TransactionCoordinator`] that drives units of work through it, and
//! [`MemoryStore`], an in-process implementation of the contract.
//!
//! ## Unit of work
//!
//! ```text
//!   engine ──read_write(tag, |txn| ..)──▶ TransactionCoordinator
//!                                           │ begin()
//!                                           ▼
//!                                 reads ──▶ StoreTxn ◀── buffered writes
//!                                           │ commit()
//!                          Aborted ◀────────┤
//!                    (backoff, re-run)      ▼
//!                                        committed
//! ```

pub mod coordinator;
pub mod memory;
pub mod txn;

pub use coordinator::{RetryPolicy, TransactionCoordinator};
pub use memory::MemoryStore;
pub use txn::{ReadTxn, Store, StoreTxn, WriteTxn};
