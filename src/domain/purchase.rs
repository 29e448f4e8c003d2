use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product;

/// Domain representation of one completed purchase held by the ledger.
///
/// Records are written exactly once per finished store transaction and are
/// never mutated or deleted by this crate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    /// Opaque identifier of the purchasing user, as assigned by the ledger's
    /// identity provider.
    pub user_id: String,
    /// Identifier of the purchased product.
    pub product_identifier: String,
    /// Instant the patronage period starts. For an extension this is the
    /// previous expiration date rather than the transaction time.
    pub purchase_date: DateTime<Utc>,
    /// Instant the patronage period ends. Absent when the product identifier
    /// carried no parsable duration at recording time.
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Payload required to insert a new purchase record into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchaseRecord {
    /// Opaque identifier of the purchasing user.
    pub user_id: String,
    /// Identifier of the purchased product.
    pub product_identifier: String,
    /// Start of the patronage period.
    pub purchase_date: DateTime<Utc>,
    /// End of the patronage period, when derivable from the identifier.
    pub expiration_date: Option<DateTime<Utc>>,
}

impl NewPurchaseRecord {
    /// Build a record payload for `product_identifier`, deriving the
    /// expiration date from the identifier's month suffix.
    pub fn new(
        user_id: impl Into<String>,
        product_identifier: impl Into<String>,
        purchase_date: DateTime<Utc>,
    ) -> Self {
        let product_identifier = product_identifier.into();
        let expiration_date = product::expiration_for(&product_identifier, purchase_date);

        Self {
            user_id: user_id.into(),
            product_identifier,
            purchase_date,
            expiration_date,
        }
    }
}

/// Ledger entry for a user account, referencing the purchases made by that
/// user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Opaque record identifier of the user.
    pub record_id: String,
    /// References to the purchase records belonging to this user.
    pub purchase_refs: Vec<String>,
}

/// Decide the start date of a new patronage period. An unexpired previous
/// period is extended from its expiration; otherwise the period starts now.
pub fn next_purchase_date(
    current_expiration: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match current_expiration {
        Some(expiration) if expiration > now => expiration,
        _ => now,
    }
}

/// Reduce a user's purchase records to the latest expiration date. Records
/// without an expiration are skipped.
pub fn latest_expiration(records: &[PurchaseRecord]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter_map(|record| {
            if record.expiration_date.is_none() {
                log::warn!(
                    "Purchase of {} by {} has no expiration date, skipping",
                    record.product_identifier,
                    record.user_id
                );
            }
            record.expiration_date
        })
        .max()
}

/// Count the distinct purchasing users among `records`. A user with several
/// purchases in the set counts once.
pub fn distinct_patrons(records: &[PurchaseRecord]) -> usize {
    let users: std::collections::HashSet<&str> = records
        .iter()
        .map(|record| record.user_id.as_str())
        .collect();
    users.len()
}
