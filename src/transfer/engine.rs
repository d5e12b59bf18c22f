//! Transfer execution

use rust_decimal::Decimal;
use tracing::info;

use super::types::{LockOrder, Transfer, lock_order};
use crate::account::{Account, AccountRepository};
use crate::coordinator::{CommitPolicy, RollbackPolicy, TransactionCoordinator};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{IsolationLevel, StoreConnection, TransactionPolicy};

#[derive(Clone)]
pub struct TransferEngine {
    coordinator: TransactionCoordinator,
    isolation: IsolationLevel,
}

impl TransferEngine {
    /// Engine running transfers at repeatable read
    pub fn new(coordinator: TransactionCoordinator) -> Self {
        Self::with_isolation(coordinator, IsolationLevel::RepeatableRead)
    }

    pub fn with_isolation(coordinator: TransactionCoordinator, isolation: IsolationLevel) -> Self {
        Self {
            coordinator,
            isolation,
        }
    }

    /// Move `transfer.amount` from source to target, all or nothing.
    pub async fn transfer(&self, transfer: &Transfer) -> LedgerResult<()> {
        if let Err(err) = transfer.validate() {
            info!(
                source = %transfer.source_account_id,
                target = %transfer.target_account_id,
                amount = %transfer.amount,
                error = %err,
                "Transfer rejected"
            );
            return Err(err);
        }

        let work = transfer.clone();
        self.coordinator
            .run_in_transaction(
                TransactionPolicy::read_write(self.isolation),
                CommitPolicy::Commit,
                RollbackPolicy::Rollback,
                move |conn| Box::pin(async move { apply(conn, &work).await }),
            )
            .await?;

        info!(
            source = %transfer.source_account_id,
            target = %transfer.target_account_id,
            amount = %transfer.amount,
            "Transfer committed"
        );
        Ok(())
    }
}

async fn apply(conn: &mut dyn StoreConnection, transfer: &Transfer) -> LedgerResult<()> {
    let (source, target) = lock_accounts(conn, transfer).await?;

    if source.amount < transfer.amount {
        return Err(LedgerError::insufficient_funds(format!(
            "Account {} has insufficient funds for debit {}: {}",
            source.id, transfer.amount, source.amount
        )));
    }
    let new_source = exact(
        source.amount.checked_sub(transfer.amount),
        source.amount,
        transfer.amount,
    )
    .ok_or_else(|| {
        LedgerError::invalid_request(format!(
            "Debiting {} from account {} cannot be represented exactly",
            transfer.amount, source.id
        ))
    })?;
    let new_target = exact(
        target.amount.checked_add(transfer.amount),
        target.amount,
        transfer.amount,
    )
    .ok_or_else(|| {
        LedgerError::invalid_request(format!(
            "Crediting {} to account {} cannot be represented exactly",
            transfer.amount, target.id
        ))
    })?;

    AccountRepository::update(conn, &source.id, new_source).await?;
    AccountRepository::update(conn, &target.id, new_target).await?;
    Ok(())
}

/// Keeps `result` only if it is exact. Decimal arithmetic past 28 significant
/// digits rounds by dropping scale, so an exact result never has a smaller
/// scale than either operand.
fn exact(result: Option<Decimal>, lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    result.filter(|r| r.scale() >= lhs.scale().max(rhs.scale()))
}

/// Lock both rows in [`lock_order`]; returns `(source, target)`.
async fn lock_accounts(
    conn: &mut dyn StoreConnection,
    transfer: &Transfer,
) -> LedgerResult<(Account, Account)> {
    let source_id = transfer.source_account_id.as_str();
    let target_id = transfer.target_account_id.as_str();

    match lock_order(source_id, target_id) {
        LockOrder::SourceFirst => {
            let source = AccountRepository::get(conn, source_id, true).await?;
            let target = AccountRepository::get(conn, target_id, true).await?;
            Ok((source, target))
        }
        LockOrder::TargetFirst => {
            let target = AccountRepository::get(conn, target_id, true).await?;
            let source = AccountRepository::get(conn, source_id, true).await?;
            Ok((source, target))
        }
    }
}
