use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// Domain representation of a purchasable patronage tier, as reported by the
/// store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Product {
    /// Stable store identifier. The trailing dot-separated component encodes
    /// the patronage duration in months.
    pub identifier: String,
    /// Localized title shown to users.
    pub title: String,
    /// Price represented in the smallest currency unit (for example cents).
    pub price_cents: i64,
    /// ISO 4217 currency code associated with the product price.
    pub currency: String,
}

impl Product {
    /// Build a product with the supplied details.
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        price_cents: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            price_cents,
            currency: currency.into(),
        }
    }

    /// Patronage duration in months, parsed from the identifier suffix.
    /// Returns `None` when the suffix is missing or not numeric.
    pub fn duration_months(&self) -> Option<u32> {
        duration_months(&self.identifier)
    }
}

/// Parse the month count from a product identifier's trailing dot-separated
/// component.
pub fn duration_months(identifier: &str) -> Option<u32> {
    identifier
        .rsplit('.')
        .next()
        .and_then(|suffix| suffix.parse::<u32>().ok())
}

/// Compute the expiration instant for a purchase of `identifier` starting at
/// `purchase_date`. `None` when the identifier carries no parsable duration.
pub fn expiration_for(identifier: &str, purchase_date: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months = duration_months(identifier)?;
    purchase_date.checked_add_months(Months::new(months))
}

/// Sort a store response ascending by price. The sort is stable, so products
/// with equal prices keep their original response order.
pub fn sort_by_price(products: &mut [Product]) {
    products.sort_by_key(|product| product.price_cents);
}
