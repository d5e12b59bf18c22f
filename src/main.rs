//! Account Ledger server
//!
//! ```text
//! config/{env}.yaml ──▶ store (postgres | memory) ──▶ gateway (axum)
//! ```
//!
//! Usage: `account_ledger [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use account_ledger::config::{AppConfig, StoreBackend};
use account_ledger::db::Database;
use account_ledger::gateway::{self, AppState};
use account_ledger::logging::init_logging;
use account_ledger::store::{LedgerStore, MemoryLedgerStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = MemoryLedgerStore::new();
            for seed in &config.seed_accounts {
                store.insert_if_absent(seed.id.clone(), seed.amount.clone());
            }
            info!(accounts = store.account_count(), "In-memory ledger store ready");
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let db = Database::connect(
                config.store.postgres_url()?,
                config.store.max_connections,
                config.store.acquire_timeout(),
            )
            .await
            .context("Failed to connect to PostgreSQL")?;
            db.ensure_schema()
                .await
                .context("Failed to create accounts table")?;
            db.seed_accounts(&config.seed_accounts)
                .await
                .context("Failed to seed accounts")?;
            Ok(Arc::new(db.ledger_store()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = init_logging(&config);

    info!(
        git_hash = env!("GIT_HASH"),
        env = %env,
        backend = ?config.store.backend,
        transfer_isolation = ?config.ledger.transfer_isolation,
        "Starting account ledger"
    );
    if let Some(message) = config.isolation_warning() {
        warn!("{}", message);
    }

    let store = build_store(&config).await?;
    let state = Arc::new(AppState::new(store, config.ledger.transfer_isolation));
    gateway::run_server(&config.gateway.host, config.gateway.port, state).await
}
