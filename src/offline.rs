//! Client-local durable buffer of writes attempted while disconnected.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::ledger::ExpenseDraft;
use crate::utils::{self, ensure_dir};

const TMP_SUFFIX: &str = "tmp";

/// One unsynced write. The `local_id` is unique within the queue file and
/// never reused, even across process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub local_id: u64,
    pub payload: ExpenseDraft,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QueueState {
    next_local_id: u64,
    entries: Vec<QueueEntry>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            next_local_id: 1,
            entries: Vec::new(),
        }
    }
}

/// Append-only durable queue. Entries keep enqueue order and are removed
/// one at a time, only after the reconciler confirms persistence.
pub struct OfflineQueue {
    path: PathBuf,
    state: Mutex<QueueState>,
}

impl OfflineQueue {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            QueueState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(utils::queue_file())
    }

    /// Appends a payload; this is the fallback path for transport failures,
    /// so it only fails on local I/O problems.
    pub fn enqueue(&self, payload: ExpenseDraft) -> Result<u64> {
        let mut state = self.lock();
        let local_id = state.next_local_id;
        let mut next = QueueState {
            next_local_id: local_id + 1,
            entries: state.entries.clone(),
        };
        next.entries.push(QueueEntry {
            local_id,
            payload,
            queued_at: Utc::now(),
        });
        self.persist(&next)?;
        *state = next;
        Ok(local_id)
    }

    /// Snapshot of pending entries in enqueue order.
    pub fn drainable(&self) -> Vec<QueueEntry> {
        self.lock().entries.clone()
    }

    pub fn remove(&self, local_id: u64) -> Result<()> {
        let mut state = self.lock();
        let mut next = QueueState {
            next_local_id: state.next_local_id,
            entries: state.entries.clone(),
        };
        next.entries.retain(|entry| entry.local_id != local_id);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, state: &QueueState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = tmp_path(&self.path);
        if let Some(parent) = tmp.parent() {
            ensure_dir(parent)?;
        }
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
