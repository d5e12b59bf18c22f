//! Database connection management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::SeedAccount;
use crate::store::PgLedgerStore;

const CREATE_ACCOUNTS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS accounts (
    id VARCHAR(255) PRIMARY KEY,
    amount VARCHAR(255)
)"#;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ledger store sharing this pool
    pub fn ledger_store(&self) -> PgLedgerStore {
        PgLedgerStore::new(self.pool.clone())
    }

    /// Create the accounts table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_ACCOUNTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert seed accounts that are not present yet; existing rows keep
    /// their balance. Returns the number of rows inserted.
    pub async fn seed_accounts(&self, accounts: &[SeedAccount]) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for account in accounts {
            let result = sqlx::query(
                "INSERT INTO accounts (id, amount) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            )
            .bind(&account.id)
            .bind(&account.amount)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }

        tracing::info!(
            inserted,
            configured = accounts.len(),
            "Seed accounts applied"
        );
        Ok(inserted)
    }
}
