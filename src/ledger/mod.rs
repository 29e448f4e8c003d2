use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::purchase::{NewPurchaseRecord, PurchaseRecord, UserRecord};

pub mod schema;

#[cfg(test)]
pub mod mock;

/// Result alias for ledger capability calls.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failures reported by the external durable record database.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No signed-in identity could be resolved.
    #[error("no user identity available: {0}")]
    Identity(String),
    /// A record query could not be served.
    #[error("ledger query failed: {0}")]
    Query(String),
    /// A record insert was rejected or lost.
    #[error("ledger write failed: {0}")]
    Write(String),
    /// A stored record did not match the expected schema.
    #[error(transparent)]
    Schema(#[from] schema::SchemaError),
}

/// Query definition used to filter purchase records.
#[derive(Debug, Default, Clone)]
pub struct PurchaseListQuery {
    /// Restrict to purchases made by this user.
    pub user_id: Option<String>,
    /// Restrict to purchases made strictly after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl PurchaseListQuery {
    /// Construct a query matching every purchase record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results to purchases made by `user_id`.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filter the results to purchases made after `since`.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }
}

/// Read-only operations over the ledger.
pub trait LedgerReader {
    /// Resolve the opaque identifier of the signed-in user.
    fn current_user_id(&self) -> LedgerResult<String>;

    /// Fetch the user record backing `user_id`, if one exists.
    fn get_user_record(&self, user_id: &str) -> LedgerResult<Option<UserRecord>>;

    /// List every user record in the ledger.
    fn list_user_records(&self) -> LedgerResult<Vec<UserRecord>>;

    /// List the purchase records matching `query`.
    fn list_purchases(&self, query: PurchaseListQuery) -> LedgerResult<Vec<PurchaseRecord>>;
}

/// Write operations over the ledger.
pub trait LedgerWriter {
    /// Insert a new purchase record. Completion means the ledger confirmed
    /// the write.
    fn insert_purchase(&self, new_purchase: &NewPurchaseRecord) -> LedgerResult<()>;
}
