use std::collections::BTreeSet;

use mockall::mock;

use super::{Store, StoreResult};
use crate::domain::product::Product;

mock! {
    pub Store {}

    impl Store for Store {
        fn can_make_payments(&self) -> bool;
        fn list_products(&self, identifiers: &BTreeSet<String>) -> StoreResult<Vec<Product>>;
        fn submit_payment(&self, product_identifier: &str) -> StoreResult<()>;
        fn restore_completed_transactions(&self) -> StoreResult<()>;
        fn finish_transaction(&self, transaction_id: &str) -> StoreResult<()>;
    }
}
