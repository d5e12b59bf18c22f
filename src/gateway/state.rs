use std::sync::Arc;

use crate::account::AccountService;
use crate::coordinator::TransactionCoordinator;
use crate::store::{IsolationLevel, LedgerStore};
use crate::transfer::TransferEngine;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub transfers: TransferEngine,
    /// Store handle for health checks
    pub store: Arc<dyn LedgerStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, transfer_isolation: IsolationLevel) -> Self {
        let coordinator = TransactionCoordinator::new(store.clone());
        Self {
            accounts: AccountService::new(coordinator.clone()),
            transfers: TransferEngine::with_isolation(coordinator, transfer_isolation),
            store,
        }
    }
}
