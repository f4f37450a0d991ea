#![doc(test(attr(deny(warnings))))]

//! Expense Core offers ledger storage, offline capture, sync reconciliation,
//! and monthly spending analytics for a personal expense tracker.

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod offline;
pub mod query;
pub mod session;
pub mod storage;
pub mod sync;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}
