//! Persistence backends for owner-scoped expense ledgers.

pub mod json_backend;
pub mod memory;

pub use json_backend::JsonBackend;
pub use memory::MemoryBackend;

use uuid::Uuid;

use crate::errors::Result;
use crate::ledger::Expense;

/// Trait that abstracts interaction with the durable store.
///
/// A backend persists the full record set of one owner at a time; the
/// ledger store on top of it provides per-record semantics.
pub trait StorageBackend: Send + Sync {
    fn load(&self, owner: Uuid) -> Result<Vec<Expense>>;
    fn save(&self, owner: Uuid, expenses: &[Expense]) -> Result<()>;
}
