//! Account repository
//!
//! Reads and writes one account row on a connection supplied by the caller.
//! Never commits or rolls back: the enclosing unit of work owns the transaction.

use rust_decimal::Decimal;
use tracing::error;

use super::models::Account;
use crate::error::{LedgerError, LedgerResult};
use crate::store::StoreConnection;

pub struct AccountRepository;

impl AccountRepository {
    /// Fetch an account. With `for_update` the row stays locked until the
    /// enclosing transaction ends.
    pub async fn get(
        conn: &mut dyn StoreConnection,
        id: &str,
        for_update: bool,
    ) -> LedgerResult<Account> {
        let row = conn.select_account(id, for_update).await.map_err(|e| {
            error!(account_id = %id, for_update, error = %e, "Failed to read account");
            LedgerError::database(format!("Failed to read account {}", id), e)
        })?;

        let Some(row) = row else {
            return Err(no_such_account(id));
        };
        let amount = parse_amount(id, row.amount.as_deref())?;
        Ok(Account::new(row.id, amount))
    }

    /// Overwrite the balance of an existing account.
    pub async fn update(
        conn: &mut dyn StoreConnection,
        id: &str,
        amount: Decimal,
    ) -> LedgerResult<()> {
        let updated = conn
            .update_amount(id, &amount.to_string())
            .await
            .map_err(|e| {
                error!(account_id = %id, error = %e, "Failed to update account");
                LedgerError::database(format!("Failed to update account {}", id), e)
            })?;

        if updated == 0 {
            return Err(no_such_account(id));
        }
        Ok(())
    }
}

fn no_such_account(id: &str) -> LedgerError {
    LedgerError::no_such_account(format!("Account {} does not exist", id))
}

/// Stored text is parsed exactly; anything that is not a plain decimal is
/// reported with the raw value, never coerced.
fn parse_amount(id: &str, raw: Option<&str>) -> LedgerResult<Decimal> {
    let Some(raw) = raw else {
        return Err(LedgerError::corrupt_data(
            format!("Table has invalid decimal value for id {}: NULL", id),
            "stored amount is NULL",
        ));
    };
    Decimal::from_str_exact(raw).map_err(|e| {
        error!(account_id = %id, raw, "Stored amount is not a valid decimal");
        LedgerError::corrupt_data(
            format!("Table has invalid decimal value for id {}: {}", id, raw),
            e,
        )
    })
}
