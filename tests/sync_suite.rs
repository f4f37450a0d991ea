//! Offline capture and reconciliation flows, end to end.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use expense_core::{
    analytics::AnalyticsReport,
    errors::{LedgerError, Result},
    ledger::{Category, Expense, ExpenseDraft, LedgerStore, PaymentMethod},
    offline::OfflineQueue,
    query::ExpenseFilter,
    session::{CaptureOutcome, RemoteLedger, Session},
    storage::MemoryBackend,
    sync,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Remote that drops every create while `offline` is set.
struct OutageRemote {
    inner: LedgerStore,
    offline: Mutex<bool>,
}

impl OutageRemote {
    fn new() -> Self {
        Self {
            inner: LedgerStore::new(Box::new(MemoryBackend::new())),
            offline: Mutex::new(false),
        }
    }

    fn set_offline(&self, value: bool) {
        *self.offline.lock().unwrap() = value;
    }
}

impl RemoteLedger for OutageRemote {
    fn create(&self, owner: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        if *self.offline.lock().unwrap() {
            return Err(LedgerError::Transport("request timed out".into()));
        }
        self.inner.create(owner, draft)
    }

    fn get(&self, owner: Uuid, id: Uuid) -> Result<Expense> {
        self.inner.get(owner, id)
    }

    fn update(&self, owner: Uuid, id: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        if *self.offline.lock().unwrap() {
            return Err(LedgerError::Transport("request timed out".into()));
        }
        self.inner.update(owner, id, draft)
    }

    fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
        if *self.offline.lock().unwrap() {
            return Err(LedgerError::Transport("request timed out".into()));
        }
        self.inner.delete(owner, id)
    }

    fn list(&self, owner: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.inner.list(owner, filter)
    }

    fn analytics(&self, owner: Uuid, reference: DateTime<Utc>) -> Result<AnalyticsReport> {
        self.inner.analytics(owner, reference)
    }
}

fn draft(amount: f64, category: Category) -> ExpenseDraft {
    ExpenseDraft::new(amount, category, PaymentMethod::Upi)
        .with_date(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap())
}

#[test]
fn captures_queue_during_outage_and_land_after_reconnect() {
    let temp = TempDir::new().expect("temp dir");
    let remote = Arc::new(OutageRemote::new());
    let queue = OfflineQueue::open(temp.path().join("queue.json")).expect("queue");
    let session = Session::new(Uuid::new_v4(), remote.clone(), queue);

    remote.set_offline(true);
    for amount in [12.0, 8.5, 30.0] {
        let outcome = session.add_expense(draft(amount, Category::Food)).expect("capture");
        assert!(matches!(outcome, CaptureOutcome::Deferred { .. }));
    }
    assert_eq!(session.pending_writes(), 3);
    assert!(session.expenses(&ExpenseFilter::default()).unwrap().is_empty());

    remote.set_offline(false);
    let report = session.reconcile().expect("reconcile");
    assert_eq!(report.synced, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(session.pending_writes(), 0);

    let expenses = session.expenses(&ExpenseFilter::default()).unwrap();
    assert_eq!(expenses.len(), 3);

    // Reconciled records feed analytics like any direct write.
    let reference = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let analytics = session.analytics(reference).expect("analytics");
    assert_eq!(analytics.current.total, 50.5);
}

#[test]
fn update_and_delete_have_no_offline_fallback() {
    let temp = TempDir::new().expect("temp dir");
    let remote = Arc::new(OutageRemote::new());
    let queue = OfflineQueue::open(temp.path().join("queue.json")).expect("queue");
    let session = Session::new(Uuid::new_v4(), remote.clone(), queue);

    let created = match session.add_expense(draft(20.0, Category::Bills)).unwrap() {
        CaptureOutcome::Persisted(expense) => expense,
        other => panic!("expected direct persist, got {other:?}"),
    };

    remote.set_offline(true);
    let update_err = session
        .update_expense(created.id, draft(25.0, Category::Bills))
        .expect_err("update must surface transport failure");
    assert!(update_err.is_transport());
    let delete_err = session
        .delete_expense(created.id)
        .expect_err("delete must surface transport failure");
    assert!(delete_err.is_transport());
    assert_eq!(session.pending_writes(), 0);
}

#[test]
fn interrupted_drain_retries_safely() {
    // Simulates a crash between persist and remove: the entry is still in
    // the queue, so a retry resubmits it; nothing is ever lost.
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("queue.json");
    let store = LedgerStore::new(Box::new(MemoryBackend::new()));
    let owner = Uuid::new_v4();

    {
        let queue = OfflineQueue::open(&path).expect("queue");
        queue.enqueue(draft(10.0, Category::Food)).unwrap();
        queue.enqueue(draft(-1.0, Category::Food)).unwrap();
        queue.enqueue(draft(20.0, Category::Food)).unwrap();

        let report = sync::reconcile(&store, &queue, owner).expect("first pass");
        assert_eq!(report.synced, 2);
        assert_eq!(report.failed, 1);
    }

    // "Restart": reopen the queue from disk and drain again.
    let queue = OfflineQueue::open(&path).expect("reopened queue");
    assert_eq!(queue.len(), 1);
    let report = sync::reconcile(&store, &queue, owner).expect("second pass");
    assert_eq!(report.synced, 0);
    assert_eq!(report.failed, 1);

    let persisted = store.list(owner, &ExpenseFilter::default()).unwrap();
    assert_eq!(persisted.len(), 2, "good entries must not be duplicated");
}
