//! Hand-written in-memory fakes driving the coordinator end to end.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use patronage::clock::Clock;
use patronage::domain::product::Product;
use patronage::domain::purchase::{NewPurchaseRecord, PurchaseRecord, UserRecord};
use patronage::ledger::{
    LedgerError, LedgerReader, LedgerResult, LedgerWriter, PurchaseListQuery, schema,
};
use patronage::services::ServiceResult;
use patronage::services::reviews::ReviewLookup;
use patronage::store::{Store, StoreResult};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Review lookup fake reporting a fixed count.
pub struct StaticReviews(pub u64);

impl ReviewLookup for StaticReviews {
    fn review_count(&self, _lookup_url: &str, _app_id: &str) -> ServiceResult<u64> {
        Ok(self.0)
    }
}

/// Clock that reports a settable instant.
pub struct StepClock {
    now: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock poisoned") = now;
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

/// Store fake serving a fixed catalog and recording the calls made to it.
pub struct ScriptedStore {
    catalog: Vec<Product>,
    pub submitted: Mutex<Vec<String>>,
    pub finished: Mutex<Vec<String>>,
    pub restores_requested: Mutex<usize>,
}

impl ScriptedStore {
    pub fn new(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            submitted: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            restores_requested: Mutex::new(0),
        }
    }
}

impl Store for ScriptedStore {
    fn can_make_payments(&self) -> bool {
        true
    }

    fn list_products(&self, identifiers: &BTreeSet<String>) -> StoreResult<Vec<Product>> {
        Ok(self
            .catalog
            .iter()
            .filter(|product| identifiers.contains(&product.identifier))
            .cloned()
            .collect())
    }

    fn submit_payment(&self, product_identifier: &str) -> StoreResult<()> {
        self.submitted
            .lock()
            .expect("store poisoned")
            .push(product_identifier.to_string());
        Ok(())
    }

    fn restore_completed_transactions(&self) -> StoreResult<()> {
        *self.restores_requested.lock().expect("store poisoned") += 1;
        Ok(())
    }

    fn finish_transaction(&self, transaction_id: &str) -> StoreResult<()> {
        self.finished
            .lock()
            .expect("store poisoned")
            .push(transaction_id.to_string());
        Ok(())
    }
}

/// Ledger fake holding purchase records in memory. Inserts are pushed
/// through the string-keyed schema boundary, so the wire encoding is
/// exercised too.
pub struct InMemoryLedger {
    current_user: String,
    purchases: Mutex<Vec<PurchaseRecord>>,
}

impl InMemoryLedger {
    pub fn new(current_user: impl Into<String>) -> Self {
        Self {
            current_user: current_user.into(),
            purchases: Mutex::new(Vec::new()),
        }
    }

    pub fn seed_purchase(&self, record: PurchaseRecord) {
        self.purchases.lock().expect("ledger poisoned").push(record);
    }

    pub fn purchase_count(&self) -> usize {
        self.purchases.lock().expect("ledger poisoned").len()
    }

    pub fn last_purchase(&self) -> Option<PurchaseRecord> {
        self.purchases
            .lock()
            .expect("ledger poisoned")
            .last()
            .cloned()
    }
}

impl LedgerReader for InMemoryLedger {
    fn current_user_id(&self) -> LedgerResult<String> {
        Ok(self.current_user.clone())
    }

    fn get_user_record(&self, user_id: &str) -> LedgerResult<Option<UserRecord>> {
        let purchases = self.purchases.lock().expect("ledger poisoned");
        let purchase_refs: Vec<String> = purchases
            .iter()
            .enumerate()
            .filter(|(_, record)| record.user_id == user_id)
            .map(|(index, _)| format!("purchase-{index}"))
            .collect();

        Ok(Some(UserRecord {
            record_id: user_id.to_string(),
            purchase_refs,
        }))
    }

    fn list_user_records(&self) -> LedgerResult<Vec<UserRecord>> {
        let purchases = self.purchases.lock().expect("ledger poisoned");
        let mut users: Vec<String> = purchases.iter().map(|r| r.user_id.clone()).collect();
        users.sort();
        users.dedup();

        let records = users
            .into_iter()
            .map(|user_id| {
                let purchase_refs = purchases
                    .iter()
                    .enumerate()
                    .filter(|(_, record)| record.user_id == user_id)
                    .map(|(index, _)| format!("purchase-{index}"))
                    .collect();
                UserRecord {
                    record_id: user_id,
                    purchase_refs,
                }
            })
            .collect();

        Ok(records)
    }

    fn list_purchases(&self, query: PurchaseListQuery) -> LedgerResult<Vec<PurchaseRecord>> {
        let purchases = self.purchases.lock().expect("ledger poisoned");
        Ok(purchases
            .iter()
            .filter(|record| match &query.user_id {
                Some(user_id) => &record.user_id == user_id,
                None => true,
            })
            .filter(|record| match query.since {
                Some(since) => record.purchase_date > since,
                None => true,
            })
            .cloned()
            .collect())
    }
}

impl LedgerWriter for InMemoryLedger {
    fn insert_purchase(&self, new_purchase: &NewPurchaseRecord) -> LedgerResult<()> {
        // Round-trip through the wire encoding, the way a real backend
        // would receive the record.
        let fields = schema::purchase_to_fields(new_purchase);
        let record = schema::purchase_from_fields(&fields).map_err(LedgerError::Schema)?;

        self.purchases.lock().expect("ledger poisoned").push(record);
        Ok(())
    }
}
