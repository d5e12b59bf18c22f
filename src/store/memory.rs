//! In-memory ledger store
//!
//! Each row carries its last committed amount plus an exclusive lock. A
//! connection inside a transaction keeps the lock of every row it read for
//! update or wrote, stages its writes, and publishes them on commit. Rollback
//! or drop discards the staged writes and releases the locks.
//!
//! Isolation levels are accepted but not modelled beyond this: plain reads see
//! the last committed value, locking reads wait for the current holder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::{AccountRow, LedgerStore, StoreConnection, StoreError, TransactionPolicy};

struct RowCell {
    committed: Mutex<String>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl RowCell {
    fn new(amount: String) -> Self {
        Self {
            committed: Mutex::new(amount),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn committed(&self) -> String {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, amount: String) {
        *self.committed.lock().unwrap_or_else(PoisonError::into_inner) = amount;
    }
}

type RowTable = Arc<RwLock<HashMap<String, Arc<RowCell>>>>;

/// Ledger store keeping account rows in process memory
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    rows: RowTable,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(id, stored amount)` pairs.
    pub fn with_accounts<I, K, V>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (id, amount) in accounts {
            store.insert(id, amount);
        }
        store
    }

    /// Insert or replace a row with a raw stored amount (administration / seeding).
    pub fn insert(&self, id: impl Into<String>, amount: impl Into<String>) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), Arc::new(RowCell::new(amount.into())));
    }

    /// Insert a row unless the id already exists; returns whether it was inserted.
    pub fn insert_if_absent(&self, id: impl Into<String>, amount: impl Into<String>) -> bool {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let id = id.into();
        if rows.contains_key(&id) {
            return false;
        }
        rows.insert(id, Arc::new(RowCell::new(amount.into())));
        true
    }

    /// Last committed raw amount of a row
    pub fn amount(&self, id: &str) -> Option<String> {
        lookup(&self.rows, id).map(|cell| cell.committed())
    }

    pub fn account_count(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn lookup(rows: &RowTable, id: &str) -> Option<Arc<RowCell>> {
    rows.read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        Ok(Box::new(MemoryConnection {
            rows: self.rows.clone(),
            policy: TransactionPolicy::default(),
            in_transaction: false,
            held: HashMap::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A row locked by a connection, with its staged write
struct HeldRow {
    cell: Arc<RowCell>,
    pending: Option<String>,
    _guard: OwnedMutexGuard<()>,
}

impl HeldRow {
    fn current(&self) -> String {
        self.pending
            .clone()
            .unwrap_or_else(|| self.cell.committed())
    }
}

pub struct MemoryConnection {
    rows: RowTable,
    policy: TransactionPolicy,
    in_transaction: bool,
    held: HashMap<String, HeldRow>,
}

impl MemoryConnection {
    fn release(&mut self) {
        self.held.clear();
        self.in_transaction = false;
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn begin(&mut self, policy: TransactionPolicy) -> Result<(), StoreError> {
        self.policy = policy;
        self.in_transaction = !policy.auto_commit;
        Ok(())
    }

    async fn select_account(
        &mut self,
        id: &str,
        for_update: bool,
    ) -> Result<Option<AccountRow>, StoreError> {
        if let Some(held) = self.held.get(id) {
            return Ok(Some(AccountRow {
                id: id.to_string(),
                amount: Some(held.current()),
            }));
        }
        let Some(cell) = lookup(&self.rows, id) else {
            return Ok(None);
        };

        let amount = if for_update {
            let guard = cell.lock.clone().lock_owned().await;
            let amount = cell.committed();
            if self.in_transaction {
                self.held.insert(
                    id.to_string(),
                    HeldRow {
                        cell,
                        pending: None,
                        _guard: guard,
                    },
                );
            }
            amount
        } else {
            cell.committed()
        };

        Ok(Some(AccountRow {
            id: id.to_string(),
            amount: Some(amount),
        }))
    }

    async fn update_amount(&mut self, id: &str, amount: &str) -> Result<u64, StoreError> {
        if self.policy.read_only {
            return Err(StoreError::ReadOnly);
        }
        if let Some(held) = self.held.get_mut(id) {
            held.pending = Some(amount.to_string());
            return Ok(1);
        }
        let Some(cell) = lookup(&self.rows, id) else {
            return Ok(0);
        };

        let guard = cell.lock.clone().lock_owned().await;
        if self.in_transaction {
            self.held.insert(
                id.to_string(),
                HeldRow {
                    cell,
                    pending: Some(amount.to_string()),
                    _guard: guard,
                },
            );
        } else {
            cell.publish(amount.to_string());
        }
        Ok(1)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        for (_, row) in self.held.drain() {
            if let Some(amount) = &row.pending {
                row.cell.publish(amount.clone());
            }
        }
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.release();
        Ok(())
    }
}
