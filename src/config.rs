use crate::app_dirs::AppDirs;
use crate::store::StoreKind;
use crate::trial::TrialTiming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub researcher: String,
    pub location: String,
    pub data_dir: Option<PathBuf>,
    pub store: StoreKind,
    pub tap_secs: u64,
    pub rest_secs: u64,
    pub first_rest_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            researcher: "TH".to_string(),
            location: "204F, UCL, London".to_string(),
            data_dir: None,
            store: StoreKind::Csv,
            tap_secs: 30,
            rest_secs: 30,
            first_rest_secs: 10,
        }
    }
}

impl Config {
    pub fn timing(&self) -> TrialTiming {
        TrialTiming {
            first_rest: Duration::from_secs(self.first_rest_secs),
            rest: Duration::from_secs(self.rest_secs),
            tap: Duration::from_secs(self.tap_secs),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(AppDirs::data_dir)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            researcher: "AB".into(),
            location: "Lab 2".into(),
            data_dir: Some(dir.path().join("data")),
            store: StoreKind::Sqlite,
            tap_secs: 20,
            rest_secs: 15,
            first_rest_secs: 5,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
        assert_eq!(loaded.data_dir(), dir.path().join("data"));
    }

    #[test]
    fn missing_or_invalid_config_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "researcher": "JK", "store": "sqlite" }"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.researcher, "JK");
        assert_eq!(loaded.store, StoreKind::Sqlite);
        assert_eq!(loaded.tap_secs, 30);
    }

    #[test]
    fn timing_from_config() {
        let timing = Config::default().timing();
        assert_eq!(timing, TrialTiming::default());
    }
}
