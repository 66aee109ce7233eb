//! Config manager settings
//!
//! Persisted separately from the configuration sections, as plain JSON next
//! to the config root. Missing fields take their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::MANIFEST_PATH;

/// Tunables of the config manager and its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagerSettings {
    /// Device path of the manifest mapping sections to files
    pub manifest_path: String,

    // === Locking ===
    /// Bound on acquiring the coarse config lock
    pub lock_timeout_ms: u64,

    // === Persistence ===
    /// Save dirty sections right after each CRUD mutation
    pub autosave: bool,
    /// Indented JSON in section files
    pub pretty_json: bool,
    /// Replace a missing section file with defaults instead of failing startup
    pub seed_missing_sections: bool,

    // === Runtime ===
    /// Minimum interval between physical temperature reads
    pub temp_read_interval_ms: u64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            manifest_path: MANIFEST_PATH.to_string(),

            lock_timeout_ms: 100,

            autosave: false,
            pretty_json: true,
            seed_missing_sections: false,

            temp_read_interval_ms: 2000,
        }
    }
}

impl ManagerSettings {
    /// Settings file name inside a config root directory
    pub const FILE_NAME: &'static str = "windcfg.json";

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn temp_read_interval(&self) -> Duration {
        Duration::from_millis(self.temp_read_interval_ms)
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        if let Ok(json) = std::fs::read_to_string(path) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring invalid settings {}: {}", path.display(), e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Write settings to `path`
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ManagerSettings::default();
        assert_eq!(settings.manifest_path, "/json/10_cfg_jsonFile.json");
        assert_eq!(settings.lock_timeout(), Duration::from_millis(100));
        assert_eq!(settings.temp_read_interval(), Duration::from_secs(2));
        assert!(!settings.autosave);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManagerSettings::FILE_NAME);
        std::fs::write(&path, r#"{"autosave": true, "lockTimeoutMs": 250}"#).unwrap();

        let settings = ManagerSettings::load(&path);
        assert!(settings.autosave);
        assert_eq!(settings.lock_timeout_ms, 250);
        assert!(settings.pretty_json);
    }

    #[test]
    fn test_invalid_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManagerSettings::FILE_NAME);
        assert_eq!(ManagerSettings::load(&path), ManagerSettings::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(ManagerSettings::load(&path), ManagerSettings::default());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManagerSettings::FILE_NAME);
        let settings = ManagerSettings {
            temp_read_interval_ms: 500,
            seed_missing_sections: true,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(ManagerSettings::load(&path), settings);
    }
}
