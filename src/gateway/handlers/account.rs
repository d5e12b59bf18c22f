//! Account lookup handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::error::{ApiError, ErrorResponse};
use super::super::state::AppState;
use crate::account::Account;

/// Get the current balance of an account
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(
        ("id" = String, Path, description = "Account id")
    ),
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 500, description = "Corrupt stored balance or database failure", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let account = state.accounts.get_account(&id).await?;
    Ok(Json(account))
}
