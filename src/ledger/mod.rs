//! Expense domain models and the authoritative ledger store.

pub mod expense;
pub mod store;

pub use expense::{Category, Expense, ExpenseDraft, PaymentMethod};
pub use store::LedgerStore;
