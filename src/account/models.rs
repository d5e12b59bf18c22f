//! Account data model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account balance as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Opaque account identifier
    #[schema(example = "1")]
    pub id: String,
    /// Exact decimal balance, serialized as a string
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "150.01")]
    pub amount: Decimal,
}

impl Account {
    pub fn new(id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            amount,
        }
    }
}
