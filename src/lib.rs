pub mod clock;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod ledger;
pub mod services;
pub mod store;

/// Length in months of the default "recent patron" trailing window.
pub const DEFAULT_PATRON_WINDOW_MONTHS: u32 = 1;
