use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::finder::{ArrivalPolicy, DEFAULT_ARRIVAL_TOLERANCE};

/// Analysis parameters: where the scripted session aims its weapons and its
/// move order, plus which arrival variant the move metric uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub bullet_target_x: f64,
    pub bullet_target_y: f64,
    pub rocket_target_x: f64,
    pub rocket_target_y: f64,
    pub move_target_x: f64,
    pub move_target_y: f64,
    pub arrival_tolerance: f64,
    pub move_arrival: ArrivalPolicy,
    pub record_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bullet_target_x: 500.0,
            bullet_target_y: 400.0,
            rocket_target_x: 500.0,
            rocket_target_y: 400.0,
            move_target_x: 900.0,
            move_target_y: 100.0,
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            move_arrival: ArrivalPolicy::EdgeTriggered,
            record_history: true,
        }
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
        let path = if let Some(pd) = ProjectDirs::from("", "", "lagscope") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("lagscope_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
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
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);

        let cfg = Config {
            move_target_x: 120.0,
            move_target_y: 80.0,
            move_arrival: ArrivalPolicy::FirstWithin,
            record_history: false,
            ..Config::default()
        };
        store.save(&cfg).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.move_arrival, ArrivalPolicy::FirstWithin);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json {").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn arrival_policy_serializes_kebab_case() {
        let json = serde_json::to_string(&ArrivalPolicy::EdgeTriggered).unwrap();
        assert_eq!(json, "\"edge-triggered\"");
    }
}
