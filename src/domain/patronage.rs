use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::product::Product;

/// Aggregate patronage facts derived from the ledger, the store and the
/// review endpoint.
///
/// Each field reflects the last successful fetch of its kind and keeps its
/// previous value when a refresh fails; the fields carry no cross-invariant.
/// Writes go through the coordinator only; consumers read a snapshot and must
/// tolerate staleness.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PatronageState {
    expiration_date: Option<DateTime<Utc>>,
    patron_count: usize,
    total_patron_count: usize,
    review_count: u64,
    products: Vec<Product>,
}

impl PatronageState {
    /// Expiration of the active user's patronage, when known.
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    /// Distinct patrons seen within the most recently fetched window.
    pub fn patron_count(&self) -> usize {
        self.patron_count
    }

    /// Users with at least one recorded purchase, regardless of age.
    pub fn total_patron_count(&self) -> usize {
        self.total_patron_count
    }

    /// Review count reported by the lookup endpoint.
    pub fn review_count(&self) -> u64 {
        self.review_count
    }

    /// Current catalog, ascending by price.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub(crate) fn set_expiration_date(&mut self, expiration: Option<DateTime<Utc>>) {
        self.expiration_date = expiration;
    }

    pub(crate) fn set_patron_count(&mut self, count: usize) {
        self.patron_count = count;
    }

    pub(crate) fn set_total_patron_count(&mut self, count: usize) {
        self.total_patron_count = count;
    }

    pub(crate) fn set_review_count(&mut self, count: u64) {
        self.review_count = count;
    }

    /// Replace the catalog wholesale; there is no incremental merge.
    pub(crate) fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
    }
}
