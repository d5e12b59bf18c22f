//! PostgreSQL ledger store
//!
//! Transactional policies run on a `sqlx::Transaction` from `pool.begin()`,
//! configured with `SET TRANSACTION` as its first statement. Dropping the
//! transaction at any point, including mid-`BEGIN`, rolls it back before the
//! connection is reused. Auto-commit policies run single statements on a plain
//! pooled connection. Row locks come from `SELECT ... FOR UPDATE` and `UPDATE`
//! and are held until the transaction ends.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, Postgres};
use sqlx::{Executor, Transaction};
use tracing::{debug, warn};

use super::{AccountRow, LedgerStore, StoreConnection, StoreError, TransactionPolicy};

const SELECT_ACCOUNT: &str = "SELECT id, amount FROM accounts WHERE id = $1";
const SELECT_ACCOUNT_FOR_UPDATE: &str = "SELECT id, amount FROM accounts WHERE id = $1 FOR UPDATE";
const UPDATE_AMOUNT: &str = "UPDATE accounts SET amount = $1 WHERE id = $2";

/// Ledger store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgStoreConnection {
            pool: self.pool.clone(),
            state: PgState::Single(conn),
            policy: TransactionPolicy::default(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

enum PgState {
    /// Auto-commit: every statement commits on its own
    Single(PoolConnection<Postgres>),
    /// Open transaction block
    Transaction(Transaction<'static, Postgres>),
    /// Transaction ended; no connection held
    Released,
}

/// One pooled connection owned by a unit of work
pub struct PgStoreConnection {
    pool: PgPool,
    state: PgState,
    policy: TransactionPolicy,
}

impl PgStoreConnection {
    fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        match &mut self.state {
            PgState::Single(conn) => Ok(&mut **conn),
            PgState::Transaction(tx) => Ok(&mut **tx),
            PgState::Released => Err(StoreError::Unavailable(
                "Connection already released".to_string(),
            )),
        }
    }

    /// Take the open transaction, leaving the connection released.
    fn take_transaction(&mut self) -> Option<Transaction<'static, Postgres>> {
        match std::mem::replace(&mut self.state, PgState::Released) {
            PgState::Transaction(tx) => Some(tx),
            other => {
                self.state = other;
                None
            }
        }
    }
}

#[async_trait]
impl StoreConnection for PgStoreConnection {
    async fn begin(&mut self, policy: TransactionPolicy) -> Result<(), StoreError> {
        self.policy = policy;
        if policy.auto_commit {
            return Ok(());
        }

        let access = if policy.read_only {
            "READ ONLY"
        } else {
            "READ WRITE"
        };
        let sql = format!(
            "SET TRANSACTION ISOLATION LEVEL {} {}",
            policy.isolation.as_sql(),
            access
        );

        // The auto-commit connection goes back to the pool; the transaction
        // owns its own pooled connection from here on.
        self.state = PgState::Released;
        let mut tx = self.pool.begin().await?;
        (&mut *tx).execute(sql.as_str()).await?;
        self.state = PgState::Transaction(tx);
        Ok(())
    }

    async fn select_account(
        &mut self,
        id: &str,
        for_update: bool,
    ) -> Result<Option<AccountRow>, StoreError> {
        let sql = if for_update {
            SELECT_ACCOUNT_FOR_UPDATE
        } else {
            SELECT_ACCOUNT
        };
        let row = sqlx::query_as::<_, AccountRow>(sql)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(row)
    }

    async fn update_amount(&mut self, id: &str, amount: &str) -> Result<u64, StoreError> {
        if self.policy.read_only {
            return Err(StoreError::ReadOnly);
        }
        let result = sqlx::query(UPDATE_AMOUNT)
            .bind(amount)
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        match self.take_transaction() {
            Some(tx) => Ok(tx.commit().await?),
            None => {
                debug!("No open transaction (auto-commit), nothing to commit");
                Ok(())
            }
        }
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        match self.take_transaction() {
            Some(tx) => Ok(tx.rollback().await?),
            None => {
                debug!("No open transaction (auto-commit), nothing to roll back");
                Ok(())
            }
        }
    }
}

impl Drop for PgStoreConnection {
    fn drop(&mut self) {
        if matches!(self.state, PgState::Transaction(_)) {
            warn!("Connection dropped inside an open transaction, rolling back");
        }
    }
}
