//! Transfer request types and lock ordering

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorKind, LedgerError, LedgerResult};

/// A validated-on-demand transfer of `amount` from source to target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub source_account_id: String,
    pub target_account_id: String,
    pub amount: Decimal,
}

impl Transfer {
    pub fn new(
        source_account_id: impl Into<String>,
        target_account_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            source_account_id: source_account_id.into(),
            target_account_id: target_account_id.into(),
            amount,
        }
    }

    /// Checks that need no store access, in this order: positive amount,
    /// distinct accounts.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_request(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.source_account_id == self.target_account_id {
            return Err(LedgerError::invalid_request(
                "source and target accounts can't be the same",
            ));
        }
        Ok(())
    }
}

/// Transfer request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[schema(example = "2")]
    pub source_account_id: String,
    #[schema(example = "1")]
    pub target_account_id: String,
    /// Exact decimal amount as a string
    #[schema(example = "50.01")]
    pub amount: String,
}

impl TryFrom<TransferRequest> for Transfer {
    type Error = LedgerError;

    fn try_from(req: TransferRequest) -> Result<Self, Self::Error> {
        let amount = Decimal::from_str_exact(req.amount.trim()).map_err(|e| {
            LedgerError::with_source(
                ErrorKind::InvalidRequest,
                format!("Invalid request! amount is not a decimal: {}", req.amount),
                e,
            )
        })?;
        Ok(Transfer {
            source_account_id: req.source_account_id,
            target_account_id: req.target_account_id,
            amount,
        })
    }
}

/// Which of the two rows a transfer locks first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOrder {
    SourceFirst,
    TargetFirst,
}

/// Total order over account ids used for row locking: byte-wise
/// lexicographic comparison of the id strings, smaller id first.
///
/// For any pair `(a, b)`, `lock_order(a, b)` and `lock_order(b, a)` name the
/// same row as first.
pub fn lock_order(source_id: &str, target_id: &str) -> LockOrder {
    match source_id.as_bytes().cmp(target_id.as_bytes()) {
        Ordering::Less | Ordering::Equal => LockOrder::SourceFirst,
        Ordering::Greater => LockOrder::TargetFirst,
    }
}
