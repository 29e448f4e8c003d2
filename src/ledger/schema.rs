//! String-keyed record schema spoken by the ledger backend.
//!
//! The ledger stores loosely-typed records addressed by record type and field
//! name. This module pins those names down in one place and converts between
//! the wire shape and the typed domain structs, so the rest of the crate
//! never touches raw field maps.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::purchase::{NewPurchaseRecord, PurchaseRecord, UserRecord};

/// Record type holding one purchase per completed transaction.
pub const RECORD_TYPE_PURCHASE: &str = "Purchase";
/// Record type holding one entry per known user.
pub const RECORD_TYPE_USER: &str = "User";

/// Purchase field: opaque identifier of the purchasing user.
pub const FIELD_USER_RECORD_ID: &str = "userRecordID";
/// Purchase field: identifier of the purchased product.
pub const FIELD_PRODUCT_IDENTIFIER: &str = "productIdentifier";
/// Purchase field: start of the patronage period, RFC 3339.
pub const FIELD_PURCHASE_DATE: &str = "purchaseDate";
/// Purchase field: end of the patronage period, RFC 3339.
pub const FIELD_EXPIRATION_DATE: &str = "expirationDate";
/// User field: references to the user's purchase records.
pub const FIELD_PURCHASES: &str = "purchases";

/// Loosely-typed field map as exchanged with the ledger backend.
pub type RecordFields = Map<String, Value>;

/// Failures converting between the wire shape and typed records.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record is missing required field {0}")]
    MissingField(&'static str),
    #[error("record field {0} has an unexpected shape")]
    InvalidField(&'static str),
}

/// Encode a new purchase record into ledger fields. An absent expiration
/// date is simply not written.
pub fn purchase_to_fields(purchase: &NewPurchaseRecord) -> RecordFields {
    let mut fields = RecordFields::new();
    fields.insert(
        FIELD_USER_RECORD_ID.to_string(),
        Value::String(purchase.user_id.clone()),
    );
    fields.insert(
        FIELD_PRODUCT_IDENTIFIER.to_string(),
        Value::String(purchase.product_identifier.clone()),
    );
    fields.insert(
        FIELD_PURCHASE_DATE.to_string(),
        Value::String(purchase.purchase_date.to_rfc3339()),
    );
    if let Some(expiration) = purchase.expiration_date {
        fields.insert(
            FIELD_EXPIRATION_DATE.to_string(),
            Value::String(expiration.to_rfc3339()),
        );
    }
    fields
}

/// Decode a stored purchase record. A missing or malformed expiration date
/// is tolerated and decoded as absent; the other fields are required.
pub fn purchase_from_fields(fields: &RecordFields) -> Result<PurchaseRecord, SchemaError> {
    let user_id = require_string(fields, FIELD_USER_RECORD_ID)?;
    let product_identifier = require_string(fields, FIELD_PRODUCT_IDENTIFIER)?;
    let purchase_date = require_date(fields, FIELD_PURCHASE_DATE)?;

    let expiration_date = match fields.get(FIELD_EXPIRATION_DATE) {
        Some(value) => {
            let parsed = value.as_str().and_then(parse_date);
            if parsed.is_none() {
                log::warn!("Could not read {FIELD_EXPIRATION_DATE} from purchase record");
            }
            parsed
        }
        None => None,
    };

    Ok(PurchaseRecord {
        user_id,
        product_identifier,
        purchase_date,
        expiration_date,
    })
}

/// Decode a stored user record.
pub fn user_from_fields(record_id: &str, fields: &RecordFields) -> Result<UserRecord, SchemaError> {
    let purchase_refs = match fields.get(FIELD_PURCHASES) {
        None => Vec::new(),
        Some(Value::Array(refs)) => refs
            .iter()
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or(SchemaError::InvalidField(FIELD_PURCHASES))
            })
            .collect::<Result<Vec<String>, SchemaError>>()?,
        Some(_) => return Err(SchemaError::InvalidField(FIELD_PURCHASES)),
    };

    Ok(UserRecord {
        record_id: record_id.to_string(),
        purchase_refs,
    })
}

fn require_string(fields: &RecordFields, name: &'static str) -> Result<String, SchemaError> {
    fields
        .get(name)
        .ok_or(SchemaError::MissingField(name))?
        .as_str()
        .map(str::to_string)
        .ok_or(SchemaError::InvalidField(name))
}

fn require_date(fields: &RecordFields, name: &'static str) -> Result<DateTime<Utc>, SchemaError> {
    let raw = fields.get(name).ok_or(SchemaError::MissingField(name))?;
    raw.as_str()
        .and_then(parse_date)
        .ok_or(SchemaError::InvalidField(name))
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
