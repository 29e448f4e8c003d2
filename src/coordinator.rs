//! Purchase-and-record coordinator.
//!
//! Drives the store purchase lifecycle, reconciles completed purchases with
//! the ledger, and derives the aggregate patronage facts held in
//! [`PatronageState`]. The store, ledger, clock and review lookup are
//! constructor-injected capabilities, so the whole flow is testable against
//! fakes.

use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};

use crate::DEFAULT_PATRON_WINDOW_MONTHS;
use crate::clock::Clock;
use crate::config::PatronConfig;
use crate::domain::patronage::PatronageState;
use crate::domain::product::{self, Product};
use crate::domain::purchase::{self, NewPurchaseRecord};
use crate::ledger::{LedgerReader, LedgerWriter, PurchaseListQuery};
use crate::services::reviews::ReviewLookup;
use crate::services::{ServiceError, ServiceResult};
use crate::store::{Store, TransactionState, TransactionUpdate};

/// Identifies one purchase request made through [`PurchaseCoordinator::purchase`].
///
/// Every request gets its own ticket, and transaction outcomes carry the
/// ticket they resolve, so overlapping requests cannot steal each other's
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PurchaseTicket(u64);

/// Outcome of a store transaction, emitted by
/// [`PurchaseCoordinator::handle_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatronEvent {
    /// The store confirmed the purchase. `recorded` reports whether the
    /// ledger write succeeded; a failed write is terminal and only logged.
    PurchaseCompleted {
        /// Ticket of the originating request, absent when the transaction
        /// completed without a live request (for example after a restart).
        ticket: Option<PurchaseTicket>,
        product_identifier: String,
        recorded: bool,
    },
    /// The store rejected the purchase.
    PurchaseFailed {
        ticket: Option<PurchaseTicket>,
        product_identifier: String,
        /// Store-supplied failure description, when one was given.
        error: Option<String>,
    },
    /// A previously completed transaction was replayed by the restore flow.
    /// No ledger write happens for restored transactions.
    PurchaseRestored { product_identifier: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PurchasePhase {
    Submitted,
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct PendingPurchase {
    ticket: Option<PurchaseTicket>,
    phase: PurchasePhase,
}

/// Coordinates the purchase lifecycle and the derived patronage facts.
pub struct PurchaseCoordinator<S, L, C, R> {
    store: S,
    ledger: L,
    clock: C,
    reviews: R,
    config: PatronConfig,
    state: PatronageState,
    pending: HashMap<String, PendingPurchase>,
    next_ticket: u64,
}

impl<S, L, C, R> PurchaseCoordinator<S, L, C, R>
where
    S: Store,
    L: LedgerReader + LedgerWriter,
    C: Clock,
    R: ReviewLookup,
{
    /// Build a coordinator over the given capabilities.
    pub fn new(store: S, ledger: L, clock: C, reviews: R, config: PatronConfig) -> Self {
        Self {
            store,
            ledger,
            clock,
            reviews,
            config,
            state: PatronageState::default(),
            pending: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Snapshot of the derived patronage facts.
    pub fn state(&self) -> &PatronageState {
        &self.state
    }

    /// The injected store capability.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected ledger capability.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether a purchase of `product_identifier` is still waiting for a
    /// terminal transaction state.
    pub fn is_pending(&self, product_identifier: &str) -> bool {
        self.pending.contains_key(product_identifier)
    }

    /// Whether a pending purchase of `product_identifier` was parked by a
    /// deferred transaction and is waiting for a later terminal state.
    pub fn is_deferred(&self, product_identifier: &str) -> bool {
        matches!(
            self.pending.get(product_identifier),
            Some(PendingPurchase {
                phase: PurchasePhase::Deferred,
                ..
            })
        )
    }

    /// Fetch the catalog of patronage products from the store.
    ///
    /// The stored catalog is replaced wholesale, sorted ascending by price
    /// with ties keeping the store's response order. Each call owns its
    /// response; concurrent calls cannot deliver to the wrong caller.
    pub fn fetch_catalog(&mut self) -> ServiceResult<Vec<Product>> {
        if !self.store.can_make_payments() {
            return Err(ServiceError::StoreUnavailable);
        }

        let mut products = self.store.list_products(&self.config.product_identifiers)?;
        product::sort_by_price(&mut products);

        self.state.set_products(products.clone());
        Ok(products)
    }

    /// Submit a payment for `product` to the store.
    ///
    /// Fails immediately with [`ServiceError::PaymentsDisabled`] when the
    /// platform reports payments are impossible; no payment is submitted in
    /// that case. Otherwise the purchase stays pending until the store
    /// delivers a terminal state through [`handle_transaction`].
    ///
    /// [`handle_transaction`]: PurchaseCoordinator::handle_transaction
    pub fn purchase(&mut self, product: &Product) -> ServiceResult<PurchaseTicket> {
        if !self.store.can_make_payments() {
            return Err(ServiceError::PaymentsDisabled);
        }

        self.store.submit_payment(&product.identifier)?;

        let ticket = PurchaseTicket(self.next_ticket);
        self.next_ticket += 1;

        // A second purchase of the same product supersedes the first's
        // pending slot; the store keys transactions by product.
        self.pending.insert(
            product.identifier.clone(),
            PendingPurchase {
                ticket: Some(ticket),
                phase: PurchasePhase::Submitted,
            },
        );

        Ok(ticket)
    }

    /// Ask the store to replay all previously completed transactions.
    ///
    /// Each replayed transaction arrives through [`handle_transaction`] as a
    /// `Restored` update and surfaces as [`PatronEvent::PurchaseRestored`].
    /// Restored transactions are assumed to be already recorded in the
    /// ledger; no write happens here.
    ///
    /// [`handle_transaction`]: PurchaseCoordinator::handle_transaction
    pub fn restore_purchases(&mut self) -> ServiceResult<()> {
        self.store.restore_completed_transactions()?;
        Ok(())
    }

    /// Process one transaction state transition delivered by the store.
    ///
    /// Updates arrive in store delivery order and are never reordered here.
    /// Updates for payments this coordinator never submitted are still
    /// processed, since store transactions outlive the process: a deferred
    /// payment may reach its terminal state long after a restart.
    pub fn handle_transaction(&mut self, update: TransactionUpdate) -> Vec<PatronEvent> {
        let TransactionUpdate {
            transaction_id,
            product_identifier,
            state,
            error,
        } = update;

        match state {
            TransactionState::Purchasing => Vec::new(),
            TransactionState::Purchased => {
                if let Err(err) = self.store.finish_transaction(&transaction_id) {
                    log::error!("Failed to finish transaction {transaction_id}: {err}");
                }

                let recorded = match self.record_purchase(&product_identifier) {
                    Ok(()) => true,
                    Err(err) => {
                        log::error!("Failed to record purchase of {product_identifier}: {err}");
                        false
                    }
                };

                let ticket = self
                    .pending
                    .remove(&product_identifier)
                    .and_then(|pending| pending.ticket);

                vec![PatronEvent::PurchaseCompleted {
                    ticket,
                    product_identifier,
                    recorded,
                }]
            }
            TransactionState::Failed => {
                let ticket = self
                    .pending
                    .remove(&product_identifier)
                    .and_then(|pending| pending.ticket);

                vec![PatronEvent::PurchaseFailed {
                    ticket,
                    product_identifier,
                    error,
                }]
            }
            TransactionState::Restored => {
                vec![PatronEvent::PurchaseRestored { product_identifier }]
            }
            TransactionState::Deferred => {
                // No completion is signaled; the purchase waits indefinitely
                // for a later terminal state.
                self.pending
                    .entry(product_identifier)
                    .and_modify(|pending| pending.phase = PurchasePhase::Deferred)
                    .or_insert(PendingPurchase {
                        ticket: None,
                        phase: PurchasePhase::Deferred,
                    });
                Vec::new()
            }
        }
    }

    /// Fetch the active user's patronage expiration from the ledger.
    ///
    /// Records without an expiration date are skipped. No records is a
    /// normal outcome, not an error. The cached expiration is updated before
    /// returning.
    pub fn fetch_patronage_expiration(&mut self) -> ServiceResult<Option<DateTime<Utc>>> {
        let user_id = self.ledger.current_user_id()?;
        let expiration = self.latest_expiration_for(&user_id)?;

        self.state.set_expiration_date(expiration);
        Ok(expiration)
    }

    /// Count the distinct users with a purchase after `since`.
    ///
    /// A user who purchased several times in the window counts once. An
    /// empty result is zero patrons; a failed query is an error and leaves
    /// the cached count untouched.
    pub fn fetch_patron_count(&mut self, since: DateTime<Utc>) -> ServiceResult<usize> {
        let records = self
            .ledger
            .list_purchases(PurchaseListQuery::new().since(since))?;
        let count = purchase::distinct_patrons(&records);

        self.state.set_patron_count(count);
        Ok(count)
    }

    /// Count the distinct patrons within the default trailing window.
    pub fn fetch_recent_patron_count(&mut self) -> ServiceResult<usize> {
        let now = self.clock.now();
        let since = now
            .checked_sub_months(Months::new(DEFAULT_PATRON_WINDOW_MONTHS))
            .unwrap_or(now);

        self.fetch_patron_count(since)
    }

    /// Count the users holding at least one purchase record, regardless of
    /// purchase age.
    pub fn fetch_total_patron_count(&mut self) -> ServiceResult<usize> {
        let users = self.ledger.list_user_records()?;
        let count = users
            .iter()
            .filter(|user| !user.purchase_refs.is_empty())
            .count();

        self.state.set_total_patron_count(count);
        Ok(count)
    }

    /// Fetch the app's current-version review count from the lookup
    /// endpoint.
    ///
    /// Requires a configured app identifier. Response parse failures yield
    /// zero rather than an error, so a broken response is indistinguishable
    /// from an app with no reviews.
    pub fn fetch_review_count(&mut self) -> ServiceResult<u64> {
        let Some(app_id) = self.config.app_id.as_deref() else {
            return Err(ServiceError::MissingAppId);
        };

        let count = self.reviews.review_count(&self.config.lookup_url, app_id)?;

        self.state.set_review_count(count);
        Ok(count)
    }

    /// Write the ledger record for a store-confirmed purchase.
    ///
    /// Straight-line pipeline with no retries: resolve identity, fetch the
    /// user record, derive the purchase date from the current expiration,
    /// insert. Any failure is terminal for this invocation.
    fn record_purchase(&mut self, product_identifier: &str) -> ServiceResult<()> {
        let user_id = self.ledger.current_user_id()?;

        let Some(user) = self.ledger.get_user_record(&user_id)? else {
            return Err(ServiceError::IdentityUnavailable(format!(
                "no ledger record for user {user_id}"
            )));
        };

        // An unexpired patronage is extended from its expiration date. A
        // failure to fetch the expiration is not fatal; the purchase then
        // starts now.
        let current_expiration = match self.latest_expiration_for(&user.record_id) {
            Ok(expiration) => expiration,
            Err(err) => {
                log::warn!("Failed to fetch expiration before recording: {err}");
                None
            }
        };

        let purchase_date = purchase::next_purchase_date(current_expiration, self.clock.now());
        let record = NewPurchaseRecord::new(user.record_id, product_identifier, purchase_date);

        if record.expiration_date.is_none() {
            log::warn!("Product {product_identifier} carries no parsable duration, recording without expiration");
        }

        self.ledger.insert_purchase(&record)?;
        Ok(())
    }

    fn latest_expiration_for(&self, user_id: &str) -> ServiceResult<Option<DateTime<Utc>>> {
        let records = self
            .ledger
            .list_purchases(PurchaseListQuery::new().for_user(user_id))?;

        Ok(purchase::latest_expiration(&records))
    }
}
