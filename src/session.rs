//! Owned client context: direct writes with an explicit offline fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analytics::{self, AnalyticsReport};
use crate::errors::Result;
use crate::ledger::{Expense, ExpenseDraft, LedgerStore};
use crate::offline::OfflineQueue;
use crate::query::ExpenseFilter;
use crate::sync::{self, SyncReport};

/// Transport seam to the authoritative ledger.
///
/// Network adapters must bound every call with a timeout and surface expiry
/// as `LedgerError::Transport`; no call may block indefinitely.
pub trait RemoteLedger: Send + Sync {
    fn create(&self, owner: Uuid, draft: ExpenseDraft) -> Result<Expense>;
    fn get(&self, owner: Uuid, id: Uuid) -> Result<Expense>;
    fn update(&self, owner: Uuid, id: Uuid, draft: ExpenseDraft) -> Result<Expense>;
    fn delete(&self, owner: Uuid, id: Uuid) -> Result<()>;
    fn list(&self, owner: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>>;
    fn analytics(&self, owner: Uuid, reference: DateTime<Utc>) -> Result<AnalyticsReport>;
}

/// The in-process store is its own transport.
impl RemoteLedger for LedgerStore {
    fn create(&self, owner: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        LedgerStore::create(self, owner, draft)
    }

    fn get(&self, owner: Uuid, id: Uuid) -> Result<Expense> {
        LedgerStore::get(self, owner, id)
    }

    fn update(&self, owner: Uuid, id: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        LedgerStore::update(self, owner, id, draft)
    }

    fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
        LedgerStore::delete(self, owner, id)
    }

    fn list(&self, owner: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        LedgerStore::list(self, owner, filter)
    }

    fn analytics(&self, owner: Uuid, reference: DateTime<Utc>) -> Result<AnalyticsReport> {
        analytics::report(self, owner, reference)
    }
}

/// How a capture attempt was resolved.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The store acknowledged the write directly.
    Persisted(Expense),
    /// Transport failed; the draft waits in the offline queue.
    Deferred { local_id: u64 },
}

/// Per-owner context holding the remote handle and the local queue; replaces
/// any process-wide mutable state.
pub struct Session {
    owner_id: Uuid,
    remote: Arc<dyn RemoteLedger>,
    queue: OfflineQueue,
}

impl Session {
    pub fn new(owner_id: Uuid, remote: Arc<dyn RemoteLedger>, queue: OfflineQueue) -> Self {
        Self {
            owner_id,
            remote,
            queue,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Attempts a direct create; a transport failure degrades to the queue
    /// and reports success-with-deferred-sync. Validation failures surface
    /// immediately and are never queued.
    pub fn add_expense(&self, draft: ExpenseDraft) -> Result<CaptureOutcome> {
        draft.validate()?;
        match self.remote.create(self.owner_id, draft.clone()) {
            Ok(expense) => Ok(CaptureOutcome::Persisted(expense)),
            Err(err) if err.is_transport() => {
                tracing::info!(error = %err, "create failed in transit; queueing for sync");
                let local_id = self.queue.enqueue(draft)?;
                Ok(CaptureOutcome::Deferred { local_id })
            }
            Err(err) => Err(err),
        }
    }

    /// Updates have no offline path: they require the authoritative record
    /// to already exist server-side.
    pub fn update_expense(&self, id: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        self.remote.update(self.owner_id, id, draft)
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<()> {
        self.remote.delete(self.owner_id, id)
    }

    pub fn expense(&self, id: Uuid) -> Result<Expense> {
        self.remote.get(self.owner_id, id)
    }

    pub fn expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.remote.list(self.owner_id, filter)
    }

    pub fn analytics(&self, reference: DateTime<Utc>) -> Result<AnalyticsReport> {
        self.remote.analytics(self.owner_id, reference)
    }

    /// Drains the offline queue; typically called on reconnect or app
    /// foreground.
    pub fn reconcile(&self) -> Result<SyncReport> {
        sync::reconcile(self.remote.as_ref(), &self.queue, self.owner_id)
    }

    /// Number of writes still waiting for reconciliation.
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }
}
