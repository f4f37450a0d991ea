use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::query::{self, ExpenseFilter};
use crate::storage::StorageBackend;

use super::{Expense, ExpenseDraft};

type OwnerLedgers = HashMap<Uuid, Vec<Expense>>;

/// Authoritative collection of expense records, scoped by owner.
///
/// The interior mutex serializes writes, so concurrent mutations of the
/// same record settle last-writer-wins by arrival order. Every mutation
/// persists through the backend before it is committed to memory; a failed
/// persist leaves the visible state unchanged.
pub struct LedgerStore {
    backend: Box<dyn StorageBackend>,
    ledgers: Mutex<OwnerLedgers>,
}

impl LedgerStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            ledgers: Mutex::new(HashMap::new()),
        }
    }

    /// Validates and persists a new expense, assigning its id and timestamps.
    pub fn create(&self, owner: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        draft.validate()?;
        let mut ledgers = self.lock();
        self.ensure_loaded(&mut ledgers, owner)?;
        let records = ledgers.entry(owner).or_default();

        let expense = Expense::from_draft(owner, draft);
        let mut next = records.clone();
        next.push(expense.clone());
        self.backend.save(owner, &next)?;
        *records = next;
        Ok(expense)
    }

    /// A record owned by a different identity behaves identically to a
    /// missing one.
    pub fn get(&self, owner: Uuid, id: Uuid) -> Result<Expense> {
        let mut ledgers = self.lock();
        self.ensure_loaded(&mut ledgers, owner)?;
        let records = ledgers.entry(owner).or_default();
        records
            .iter()
            .find(|expense| expense.id == id && expense.owner_id == owner)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    /// Whole-record overwrite of the draft fields; `created_at` is kept and
    /// `updated_at` bumped.
    pub fn update(&self, owner: Uuid, id: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        draft.validate()?;
        let mut ledgers = self.lock();
        self.ensure_loaded(&mut ledgers, owner)?;
        let records = ledgers.entry(owner).or_default();

        let position = records
            .iter()
            .position(|expense| expense.id == id && expense.owner_id == owner)
            .ok_or(LedgerError::NotFound(id))?;
        let mut next = records.clone();
        next[position].apply_draft(draft);
        let updated = next[position].clone();
        self.backend.save(owner, &next)?;
        *records = next;
        Ok(updated)
    }

    pub fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
        let mut ledgers = self.lock();
        self.ensure_loaded(&mut ledgers, owner)?;
        let records = ledgers.entry(owner).or_default();

        let position = records
            .iter()
            .position(|expense| expense.id == id && expense.owner_id == owner)
            .ok_or(LedgerError::NotFound(id))?;
        let mut next = records.clone();
        next.remove(position);
        self.backend.save(owner, &next)?;
        *records = next;
        Ok(())
    }

    /// Returns the owner's expenses matching `filter`, newest first.
    pub fn list(&self, owner: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut ledgers = self.lock();
        self.ensure_loaded(&mut ledgers, owner)?;
        let records = ledgers.entry(owner).or_default();

        let mut matched: Vec<Expense> = records
            .iter()
            .filter(|expense| filter.matches(expense))
            .cloned()
            .collect();
        query::sort_newest_first(&mut matched);
        Ok(matched)
    }

    fn lock(&self) -> MutexGuard<'_, OwnerLedgers> {
        self.ledgers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_loaded(&self, ledgers: &mut OwnerLedgers, owner: Uuid) -> Result<()> {
        if !ledgers.contains_key(&owner) {
            let loaded = self.backend.load(owner)?;
            ledgers.insert(owner, loaded);
        }
        Ok(())
    }
}
