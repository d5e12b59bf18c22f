//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::account::Account;
use crate::gateway::error::ErrorResponse;
use crate::gateway::handlers::HealthResponse;
use crate::transfer::TransferRequest;

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account Ledger API",
        version = "1.0.0",
        description = "Account balances and atomic transfers between accounts. Amounts are exact decimal strings.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::get_account,
        crate::gateway::handlers::create_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            Account,
            TransferRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Account", description = "Balance queries"),
        (name = "Transfer", description = "Fund transfers between accounts"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
