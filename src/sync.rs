//! Drains the offline queue into the ledger store, idempotently.

use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::offline::OfflineQueue;
use crate::session::RemoteLedger;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Submits queued entries in enqueue order. An entry is removed only after
/// the store confirms persistence, so a crash mid-drain can leave entries
/// behind (safe to retry) but never drop a write. Rejected entries stay in
/// place and do not block the rest of the queue.
pub fn reconcile(remote: &dyn RemoteLedger, queue: &OfflineQueue, owner: Uuid) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    for entry in queue.drainable() {
        match remote.create(owner, entry.payload.clone()) {
            Ok(expense) => {
                queue.remove(entry.local_id)?;
                report.synced += 1;
                tracing::debug!(id = %expense.id, local_id = entry.local_id, "queued expense persisted");
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(local_id = entry.local_id, error = %err, "queued expense rejected; left in queue");
            }
        }
    }
    tracing::info!(synced = report.synced, failed = report.failed, "reconciliation finished");
    Ok(report)
}
