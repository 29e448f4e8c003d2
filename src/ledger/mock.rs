use mockall::mock;

use super::{LedgerReader, LedgerResult, LedgerWriter, PurchaseListQuery};
use crate::domain::purchase::{NewPurchaseRecord, PurchaseRecord, UserRecord};

mock! {
    pub LedgerReader {}

    impl LedgerReader for LedgerReader {
        fn current_user_id(&self) -> LedgerResult<String>;
        fn get_user_record(&self, user_id: &str) -> LedgerResult<Option<UserRecord>>;
        fn list_user_records(&self) -> LedgerResult<Vec<UserRecord>>;
        fn list_purchases(&self, query: PurchaseListQuery) -> LedgerResult<Vec<PurchaseRecord>>;
    }
}

mock! {
    pub LedgerWriter {}

    impl LedgerWriter for LedgerWriter {
        fn insert_purchase(&self, new_purchase: &NewPurchaseRecord) -> LedgerResult<()>;
    }
}
