//! Ledger error types
//!
//! Every failure leaving the core is a [`LedgerError`] tagged with one of five
//! [`ErrorKind`]s. The four business kinds are raised where they are detected and
//! travel unwrapped; everything else is the generic `Database` kind, which keeps the
//! original failure as its cause.

use std::error::Error as StdError;

use thiserror::Error;

use crate::store::StoreError;

/// Boxed cause attached to a [`LedgerError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error taxonomy shared by the core and the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or semantically illegal input
    InvalidRequest,
    /// Referenced account id is absent
    NoSuchAccount,
    /// Debit would make the source balance negative
    InsufficientFunds,
    /// Stored balance cannot be parsed as a decimal
    CorruptData,
    /// Anything else (connectivity, lock timeout, driver failure)
    Database,
}

impl ErrorKind {
    /// Stable error code for API responses
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::NoSuchAccount => "NO_SUCH_ACCOUNT",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::CorruptData => "CORRUPT_DATA",
            ErrorKind::Database => "DATABASE_ERROR",
        }
    }

    /// Suggested HTTP status code
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::NoSuchAccount => 404,
            ErrorKind::InsufficientFunds => 403,
            ErrorKind::CorruptData | ErrorKind::Database => 500,
        }
    }

    /// Business kinds pass through the coordinator unwrapped.
    pub fn is_business(self) -> bool {
        !matches!(self, ErrorKind::Database)
    }
}

/// A ledger failure: kind, message, optional cause and any rollback failures
/// that happened while cleaning up after it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LedgerError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    suppressed: Vec<StoreError>,
}

impl LedgerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            suppressed: Vec::new(),
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
            suppressed: Vec::new(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn no_such_account(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchAccount, message)
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientFunds, message)
    }

    pub fn corrupt_data(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::CorruptData, message, source)
    }

    pub fn database(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::Database, message, source)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_business(&self) -> bool {
        self.kind.is_business()
    }

    /// Rollback failures recorded after this error was raised
    pub fn suppressed(&self) -> &[StoreError] {
        &self.suppressed
    }

    /// Attach a secondary failure without replacing this one.
    pub fn add_suppressed(&mut self, err: StoreError) {
        self.suppressed.push(err);
    }

    /// Messages of the source chain followed by suppressed errors.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            causes.push(err.to_string());
            next = err.source();
        }
        causes.extend(
            self.suppressed
                .iter()
                .map(|e| format!("suppressed: {}", e)),
        );
        causes
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::database("Unhandled database error", e)
    }
}
