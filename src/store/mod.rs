use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::Product;

#[cfg(test)]
pub mod mock;

/// Result alias for store capability calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the external purchase processor.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected or could not serve a product lookup.
    #[error("store is unavailable: {0}")]
    Unavailable(String),
    /// A payment could not be submitted to the store.
    #[error("payment submission failed: {0}")]
    Payment(String),
}

/// Lifecycle states the store reports for a payment transaction.
///
/// `Purchased`, `Failed` and `Restored` are terminal; the store will not
/// update the transaction again without a new payment. `Deferred` waits
/// indefinitely for a later terminal state, possibly across process restarts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Purchasing,
    Purchased,
    Failed,
    Restored,
    Deferred,
}

/// One transaction state transition delivered by the store's observer
/// channel, in store delivery order.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    /// Store-assigned transaction identifier.
    pub transaction_id: String,
    /// Identifier of the product the payment was submitted for.
    pub product_identifier: String,
    /// State the transaction moved into.
    pub state: TransactionState,
    /// Store-supplied failure description, set for `Failed` transitions.
    pub error: Option<String>,
}

impl TransactionUpdate {
    /// Build an update for the given transaction and state.
    pub fn new(
        transaction_id: impl Into<String>,
        product_identifier: impl Into<String>,
        state: TransactionState,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            product_identifier: product_identifier.into(),
            state,
            error: None,
        }
    }

    /// Attach the store-supplied error description.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// External in-app-purchase transaction processor.
///
/// Payment submission is fire-and-forget: outcomes arrive through the
/// embedding application feeding [`TransactionUpdate`]s to the coordinator's
/// `handle_transaction`.
pub trait Store {
    /// Whether the platform currently allows payments at all.
    fn can_make_payments(&self) -> bool;

    /// Look up the products matching the configured identifiers.
    fn list_products(&self, identifiers: &BTreeSet<String>) -> StoreResult<Vec<Product>>;

    /// Submit a payment for the given product.
    fn submit_payment(&self, product_identifier: &str) -> StoreResult<()>;

    /// Ask the store to replay all previously completed transactions for the
    /// current identity.
    fn restore_completed_transactions(&self) -> StoreResult<()>;

    /// Acknowledge a terminal transaction so the store will not redeliver it.
    fn finish_transaction(&self, transaction_id: &str) -> StoreResult<()>;
}
