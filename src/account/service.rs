//! Account lookup
//!
//! Reads run as single statements: read committed, read-only, auto-commit,
//! with neither commit nor rollback issued by the coordinator.

use tracing::debug;

use super::models::Account;
use super::repository::AccountRepository;
use crate::coordinator::{CommitPolicy, RollbackPolicy, TransactionCoordinator};
use crate::error::LedgerResult;
use crate::store::TransactionPolicy;

#[derive(Clone)]
pub struct AccountService {
    coordinator: TransactionCoordinator,
}

impl AccountService {
    pub fn new(coordinator: TransactionCoordinator) -> Self {
        Self { coordinator }
    }

    /// Current committed balance of an account
    pub async fn get_account(&self, id: &str) -> LedgerResult<Account> {
        debug!(account_id = %id, "Fetching account");
        let id = id.to_string();
        self.coordinator
            .run_in_transaction(
                TransactionPolicy::READ,
                CommitPolicy::LeaveOpen,
                RollbackPolicy::NoRollback,
                move |conn| Box::pin(async move { AccountRepository::get(conn, &id, false).await }),
            )
            .await
    }
}
