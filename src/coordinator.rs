//! Transaction Coordinator
//!
//! Runs one unit of work on one connection with an explicit commit and
//! rollback policy. The connection belongs to the call: it is released on
//! every exit path, and a connection dropped mid-transaction aborts it.
//!
//! Failures from the store (acquire, begin, commit, or inside the work) come
//! out as the generic `Database` kind with the store error as cause. Business
//! errors raised by the work pass through untouched. A failed rollback never
//! replaces the error that triggered it; it is recorded as suppressed.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, StoreConnection, TransactionPolicy};

/// What to do with the transaction when the work succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    Commit,
    /// Leave the end of the transaction to the caller (auto-commit reads)
    LeaveOpen,
}

/// What to do with the transaction when the work fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    Rollback,
    NoRollback,
}

#[derive(Clone)]
pub struct TransactionCoordinator {
    store: Arc<dyn LedgerStore>,
}

impl TransactionCoordinator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute `work` on a freshly acquired connection configured with `policy`.
    ///
    /// Closures take the connection and return a boxed future borrowing it:
    ///
    /// ```ignore
    /// coordinator
    ///     .run_in_transaction(policy, CommitPolicy::Commit, RollbackPolicy::Rollback, move |conn| {
    ///         Box::pin(async move { AccountRepository::get(conn, &id, true).await })
    ///     })
    ///     .await
    /// ```
    pub async fn run_in_transaction<T, F>(
        &self,
        policy: TransactionPolicy,
        commit: CommitPolicy,
        rollback: RollbackPolicy,
        work: F,
    ) -> LedgerResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut dyn StoreConnection) -> BoxFuture<'c, LedgerResult<T>> + Send,
    {
        let mut conn = self.store.acquire().await.map_err(|e| {
            error!(store = self.store.name(), error = %e, "Failed to acquire connection");
            LedgerError::database("Failed to acquire a database connection", e)
        })?;

        if let Err(e) = conn.begin(policy).await {
            let err = LedgerError::database("Failed to configure the transaction", e);
            return Err(abort(conn.as_mut(), rollback, err).await);
        }

        match work(conn.as_mut()).await {
            Ok(value) => {
                if commit == CommitPolicy::Commit {
                    if let Err(e) = conn.commit().await {
                        let err = LedgerError::database("Failed to commit the transaction", e);
                        return Err(abort(conn.as_mut(), rollback, err).await);
                    }
                    debug!("Transaction committed");
                }
                Ok(value)
            }
            Err(err) => Err(abort(conn.as_mut(), rollback, err).await),
        }
    }
}

async fn abort(
    conn: &mut dyn StoreConnection,
    rollback: RollbackPolicy,
    mut err: LedgerError,
) -> LedgerError {
    if err.is_business() {
        info!(kind = ?err.kind(), error = %err, "Unit of work rejected");
    } else {
        error!(error = %err, causes = ?err.causes(), "Unit of work failed");
    }

    if rollback == RollbackPolicy::Rollback
        && let Err(e) = conn.rollback().await
    {
        warn!(error = %e, "Rollback failed");
        err.add_suppressed(e);
    }
    err
}


#[cfg(test)]
mod tests {
    use super::mock::ScriptedStore;
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::IsolationLevel;

    const RW: TransactionPolicy = TransactionPolicy::read_write(IsolationLevel::RepeatableRead);

    fn coordinator(store: &ScriptedStore) -> TransactionCoordinator {
        TransactionCoordinator::new(Arc::new(store.clone()))
    }

    async fn select_one(
        coordinator: &TransactionCoordinator,
        commit: CommitPolicy,
        rollback: RollbackPolicy,
    ) -> LedgerResult<Option<String>> {
        coordinator
            .run_in_transaction(RW, commit, rollback, |conn| {
                Box::pin(async move {
                    let row = conn.select_account("1", true).await?;
                    Ok(row.and_then(|r| r.amount))
                })
            })
            .await
    }

    #[tokio::test]
    async fn test_success_commits() {
        let store = ScriptedStore::new().with_row("1", "100.0");
        let value = select_one(&coordinator(&store), CommitPolicy::Commit, RollbackPolicy::Rollback)
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("100.0"));
        assert_eq!(
            store.calls(),
            vec![
                "acquire",
                "begin REPEATABLE READ read_only=false auto_commit=false",
                "select 1 for update",
                "commit",
            ]
        );
    }

    #[tokio::test]
    async fn test_leave_open_skips_commit() {
        let store = ScriptedStore::new().with_row("1", "100.0");
        select_one(&coordinator(&store), CommitPolicy::LeaveOpen, RollbackPolicy::NoRollback)
            .await
            .unwrap();

        assert!(!store.calls().contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn test_business_error_passes_through_and_rolls_back() {
        let store = ScriptedStore::new();
        let err = coordinator(&store)
            .run_in_transaction(RW, CommitPolicy::Commit, RollbackPolicy::Rollback, |_conn| {
                Box::pin(async move { Err::<(), _>(LedgerError::no_such_account("Account 9 does not exist")) })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoSuchAccount);
        assert_eq!(err.message(), "Account 9 does not exist");
        let calls = store.calls();
        assert_eq!(calls.last().map(String::as_str), Some("rollback"));
        assert!(!calls.contains(&"commit".to_string()));
    }

    #[tokio::test]
    async fn test_store_error_in_work_becomes_database_kind() {
        let store = ScriptedStore::new().with_row("1", "100.0");
        store.set_fail_select(true);
        let err = select_one(&coordinator(&store), CommitPolicy::Commit, RollbackPolicy::Rollback)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Database);
        assert_eq!(err.causes(), vec!["scripted select failure".to_string()]);
        assert_eq!(store.calls().last().map(String::as_str), Some("rollback"));
    }

    #[tokio::test]
    async fn test_no_rollback_policy_never_rolls_back() {
        let store = ScriptedStore::new();
        store.set_fail_select(true);
        select_one(&coordinator(&store), CommitPolicy::LeaveOpen, RollbackPolicy::NoRollback)
            .await
            .unwrap_err();

        assert!(!store.calls().contains(&"rollback".to_string()));
    }

    #[tokio::test]
    async fn test_rollback_failure_is_suppressed() {
        let store = ScriptedStore::new();
        store.set_fail_rollback(true);
        let err = coordinator(&store)
            .run_in_transaction(RW, CommitPolicy::Commit, RollbackPolicy::Rollback, |_conn| {
                Box::pin(async move { Err::<(), _>(LedgerError::insufficient_funds("not enough")) })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(err.suppressed().len(), 1);
        assert_eq!(err.causes(), vec!["suppressed: scripted rollback failure".to_string()]);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let store = ScriptedStore::new().with_row("1", "100.0");
        store.set_fail_commit(true);
        let err = select_one(&coordinator(&store), CommitPolicy::Commit, RollbackPolicy::Rollback)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Database);
        assert_eq!(err.message(), "Failed to commit the transaction");
        let calls = store.calls();
        assert_eq!(&calls[calls.len() - 2..], ["commit", "rollback"]);
    }

    #[tokio::test]
    async fn test_begin_failure_skips_work() {
        let store = ScriptedStore::new().with_row("1", "100.0");
        store.set_fail_begin(true);
        let err = select_one(&coordinator(&store), CommitPolicy::Commit, RollbackPolicy::Rollback)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Database);
        assert!(!store.calls().iter().any(|c| c.starts_with("select")));
    }

    #[tokio::test]
    async fn test_acquire_failure() {
        let store = ScriptedStore::new();
        store.set_fail_acquire(true);
        let err = select_one(&coordinator(&store), CommitPolicy::Commit, RollbackPolicy::Rollback)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Database);
        assert_eq!(store.calls(), vec!["acquire"]);
    }
}
