use std::{collections::HashMap, sync::Mutex};

use uuid::Uuid;

use crate::{errors::Result, ledger::Expense};

use super::StorageBackend;

/// Volatile backend, mainly for tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryBackend {
    ledgers: Mutex<HashMap<Uuid, Vec<Expense>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, owner: Uuid) -> Result<Vec<Expense>> {
        let ledgers = self.ledgers.lock().unwrap_or_else(|e| e.into_inner());
        Ok(ledgers.get(&owner).cloned().unwrap_or_default())
    }

    fn save(&self, owner: Uuid, expenses: &[Expense]) -> Result<()> {
        let mut ledgers = self.ledgers.lock().unwrap_or_else(|e| e.into_inner());
        ledgers.insert(owner, expenses.to_vec());
        Ok(())
    }
}
