use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::{
    errors::Result,
    ledger::Expense,
    utils::{ensure_dir, ledgers_dir},
};

use super::StorageBackend;

const TMP_SUFFIX: &str = "tmp";

/// Stores each owner's ledger as a JSON file under the data directory.
#[derive(Clone)]
pub struct JsonBackend {
    root: PathBuf,
}

impl JsonBackend {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(ledgers_dir);
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn ledger_path(&self, owner: Uuid) -> PathBuf {
        self.root.join(format!("{owner}.json"))
    }
}

impl StorageBackend for JsonBackend {
    fn load(&self, owner: Uuid) -> Result<Vec<Expense>> {
        let path = self.ledger_path(owner);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        let expenses: Vec<Expense> = serde_json::from_str(&data)?;
        Ok(expenses)
    }

    fn save(&self, owner: Uuid, expenses: &[Expense]) -> Result<()> {
        let path = self.ledger_path(owner);
        let json = serde_json::to_string_pretty(expenses)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
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

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
