use thiserror::Error;

use crate::ledger::LedgerError;
use crate::store::StoreError;

pub mod reviews;

/// Result alias for coordinator-level operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced by the coordinator. All are terminal for the operation
/// that raised them; nothing here triggers a retry.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The platform reports that payments cannot be made.
    #[error("payments are disabled on this platform")]
    PaymentsDisabled,
    /// The store cannot serve product lookups right now.
    #[error("the store is unavailable")]
    StoreUnavailable,
    /// No app identifier was configured for the review lookup.
    #[error("no app id is configured")]
    MissingAppId,
    /// No signed-in user identity could be resolved.
    #[error("no user identity available: {0}")]
    IdentityUnavailable(String),
    /// A ledger query could not be served.
    #[error("ledger query failed: {0}")]
    LedgerQuery(String),
    /// A ledger insert was rejected or lost.
    #[error("ledger write failed: {0}")]
    LedgerWrite(String),
    /// A collaborator response could not be parsed.
    #[error("response could not be parsed: {0}")]
    ResponseParse(String),
    /// Failure reported by the store itself.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Transport failure reaching the review lookup endpoint.
    #[error("review lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Identity(reason) => ServiceError::IdentityUnavailable(reason),
            LedgerError::Query(reason) => ServiceError::LedgerQuery(reason),
            LedgerError::Write(reason) => ServiceError::LedgerWrite(reason),
            LedgerError::Schema(err) => ServiceError::ResponseParse(err.to_string()),
        }
    }
}
