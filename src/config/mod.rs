use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::Result;
use crate::utils::{self, ensure_dir};

const TMP_SUFFIX: &str = "tmp";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client-side settings. The timeout bounds every network-dependent
/// operation; expiry is treated as a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub request_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            queue_file: None,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn queue_file(&self) -> PathBuf {
        self.queue_file.clone().unwrap_or_else(utils::queue_file)
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::at(utils::config_file())
    }

    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_defaults_when_file_is_missing() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::at(temp.path().join("config.json")).unwrap();
        let config = manager.load().expect("defaults");
        assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.queue_file.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::at(temp.path().join("config.json")).unwrap();
        let mut config = Config::default();
        config.request_timeout_ms = 2_500;
        config.queue_file = Some(temp.path().join("queue.json"));
        manager.save(&config).expect("save");

        let loaded = manager.load().expect("load");
        assert_eq!(loaded.request_timeout_ms, 2_500);
        assert_eq!(loaded.queue_file, config.queue_file);
    }
}
