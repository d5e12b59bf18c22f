//! Ledger Store seam
//!
//! The core talks to storage only through [`LedgerStore`] (a connection source)
//! and [`StoreConnection`] (one connection scoped to one unit of work).
//!
//! # Backends
//!
//! - [`PgLedgerStore`]: PostgreSQL via sqlx, row locks with `SELECT ... FOR UPDATE`
//! - [`MemoryLedgerStore`]: in-process rows guarded by per-row exclusive locks

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Write rejected: connection is read-only")]
    ReadOnly,

    #[error("{0}")]
    Unavailable(String),
}

/// Transaction isolation level requested for a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Connection settings applied before a unit of work runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionPolicy {
    pub isolation: IsolationLevel,
    pub read_only: bool,
    /// Every statement commits on its own; no transaction block is opened.
    pub auto_commit: bool,
}

impl TransactionPolicy {
    /// Single-statement reads: read committed, read-only, auto-commit
    pub const READ: TransactionPolicy = TransactionPolicy {
        isolation: IsolationLevel::ReadCommitted,
        read_only: true,
        auto_commit: true,
    };

    /// Explicit read-write transaction at the given isolation level
    pub const fn read_write(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            read_only: false,
            auto_commit: false,
        }
    }
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self::read_write(IsolationLevel::ReadCommitted)
    }
}

/// Raw account row as stored; `amount` is the unparsed stored text.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub amount: Option<String>,
}

/// Source of connections (a pool, or the in-memory table)
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Acquire a connection exclusively owned by the caller until dropped.
    async fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One connection, used by exactly one unit of work at a time.
///
/// Dropping a connection with an open transaction aborts that transaction and
/// releases every row lock it holds.
#[async_trait]
pub trait StoreConnection: Send {
    /// Apply the policy; opens a transaction block unless `auto_commit` is set.
    async fn begin(&mut self, policy: TransactionPolicy) -> Result<(), StoreError>;

    /// Fetch one account row. With `for_update` the row is locked exclusively
    /// until the transaction ends, blocking while another connection holds it.
    async fn select_account(
        &mut self,
        id: &str,
        for_update: bool,
    ) -> Result<Option<AccountRow>, StoreError>;

    /// Overwrite the stored amount; returns the number of rows matched.
    async fn update_amount(&mut self, id: &str, amount: &str) -> Result<u64, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}
