//! Transfer handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::error::{ApiError, ErrorResponse};
use super::super::state::AppState;
use crate::error::{ErrorKind, LedgerError};
use crate::transfer::{Transfer, TransferRequest};

/// Move funds between two accounts
///
/// All or nothing: on any error neither balance changes.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferRequest,
    responses(
        (status = 204, description = "Transfer committed"),
        (status = 400, description = "Malformed body, non-positive amount or same account", body = ErrorResponse),
        (status = 403, description = "Insufficient funds", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 500, description = "Corrupt stored balance or database failure", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::info!(error = %rejection, "Rejected unparseable transfer body");
        LedgerError::with_source(
            ErrorKind::InvalidRequest,
            "Invalid request!",
            rejection.body_text(),
        )
    })?;

    let transfer = Transfer::try_from(req)?;
    state.transfers.transfer(&transfer).await?;
    Ok(StatusCode::NO_CONTENT)
}
