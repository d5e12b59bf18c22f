//! Error responses
//!
//! Every failure is rendered as `{code, error, causes}` with the status of its
//! error kind:
//!
//! | kind               | status |
//! |--------------------|--------|
//! | INVALID_REQUEST    | 400    |
//! | NO_SUCH_ACCOUNT    | 404    |
//! | INSUFFICIENT_FUNDS | 403    |
//! | CORRUPT_DATA       | 500    |
//! | DATABASE_ERROR     | 500    |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable error code
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub code: String,
    /// Human-readable message
    pub error: String,
    /// Underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            code: kind.code().to_string(),
            error: self.0.message().to_string(),
            causes: self.0.causes(),
        };
        (status, Json(body)).into_response()
    }
}
