//! Account Ledger
//!
//! Holds account balances and moves funds between two accounts atomically
//! under concurrent load: no lost updates, no deadlocks, no negative balances.
//!
//! # Modules
//!
//! - [`store`] - Ledger store seam (PostgreSQL and in-memory backends)
//! - [`coordinator`] - Unit-of-work execution with commit/rollback policy
//! - [`account`] - Account repository and read-only lookup
//! - [`transfer`] - Transfer engine and lock ordering
//! - [`gateway`] - HTTP API
//! - [`error`] - Error kinds shared by the core and the gateway

pub mod account;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountService};
pub use coordinator::{CommitPolicy, RollbackPolicy, TransactionCoordinator};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use store::{IsolationLevel, LedgerStore, MemoryLedgerStore, PgLedgerStore, TransactionPolicy};
pub use transfer::{Transfer, TransferEngine};
