//! Backup-rotating load/save of one JSON document

use serde_json::Value;

use super::backend::FileBackend;
use crate::error::{ConfigError, Result};

/// Backup file name for `path`
pub fn backup_path(path: &str) -> String {
    format!("{}.bak", path)
}

/// Loads and saves section documents with `.bak` recovery
#[derive(Debug)]
pub struct SectionStore<B> {
    backend: B,
    pretty: bool,
}

impl<B: FileBackend> SectionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pretty: true,
        }
    }

    /// Choose indented or compact output for saved documents
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn parse(&self, path: &str) -> Option<Value> {
        let bytes = match self.backend.read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Read failed: {} ({})", path, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("Parse failed: {} ({})", path, e);
                None
            }
        }
    }

    /// Load the document at `path`, recovering from the backup when needed.
    ///
    /// Files are only touched when the backup has parsed successfully, so a
    /// failed load never changes what is on disk.
    pub fn load(&self, path: &str) -> Result<Value> {
        let bak = backup_path(path);

        if !self.backend.exists(path) {
            if !self.backend.exists(&bak) {
                log::info!("Config file not found: {}", path);
                return Err(ConfigError::Missing {
                    path: path.to_string(),
                });
            }
            let Some(doc) = self.parse(&bak) else {
                log::error!("Main missing and backup unreadable: {}", path);
                return Err(ConfigError::Corrupt {
                    path: path.to_string(),
                });
            };
            self.backend
                .rename(&bak, path)
                .map_err(|e| ConfigError::io(path, e))?;
            log::warn!("Restored {} from backup", path);
            return Ok(doc);
        }

        if let Some(doc) = self.parse(path) {
            return Ok(doc);
        }

        let recovered = if self.backend.exists(&bak) {
            self.parse(&bak)
        } else {
            None
        };
        let Some(doc) = recovered else {
            log::error!("Load failed, main and backup unreadable: {}", path);
            return Err(ConfigError::Corrupt {
                path: path.to_string(),
            });
        };

        if let Err(e) = self.backend.remove(path) {
            log::warn!("Could not remove corrupt {} (continuing): {}", path, e);
        }
        match self.backend.rename(&bak, path) {
            Ok(()) => log::warn!("Recovered {} from backup", path),
            Err(e) => log::error!("Recovered {} but promoting backup failed: {}", path, e),
        }
        Ok(doc)
    }

    /// Save `doc` to `path`, keeping the previous version as the backup.
    ///
    /// On a failed write the partial file is removed and the backup is moved
    /// back, so the previous durable state stays the main file.
    pub fn save(&self, path: &str, doc: &Value) -> Result<()> {
        let bak = backup_path(path);

        let rotated = self.backend.exists(path);
        if rotated {
            if self.backend.exists(&bak) {
                self.backend
                    .remove(&bak)
                    .map_err(|e| ConfigError::io(&bak, e))?;
            }
            self.backend
                .rename(path, &bak)
                .map_err(|e| ConfigError::io(path, e))?;
        }

        let written = self.encode(path, doc).and_then(|bytes| {
            match self.backend.write(path, &bytes) {
                Ok(0) => Err(ConfigError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::WriteZero, "zero bytes written"),
                )),
                Ok(_) => Ok(()),
                Err(e) => Err(ConfigError::io(path, e)),
            }
        });

        if let Err(e) = written {
            log::error!("Save failed: {} ({})", path, e);
            self.rollback(path, &bak, rotated);
            return Err(e);
        }

        log::debug!("Saved {}", path);
        Ok(())
    }

    fn encode(&self, path: &str, doc: &Value) -> Result<Vec<u8>> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(doc)
        } else {
            serde_json::to_vec(doc)
        };
        encoded.map_err(|source| ConfigError::Encode {
            what: path.to_string(),
            source,
        })
    }

    fn rollback(&self, path: &str, bak: &str, rotated: bool) {
        if self.backend.exists(path) {
            if let Err(e) = self.backend.remove(path) {
                log::error!("Rollback could not remove partial {}: {}", path, e);
            }
        }
        if rotated {
            match self.backend.rename(bak, path) {
                Ok(()) => log::warn!("Rolled back {} to previous version", path),
                Err(e) => log::error!("Rollback rename failed for {}: {}", path, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::backend::{Faults, LocalFs, MemoryFs};
    use serde_json::json;

    const PATH: &str = "/json/20_cfg_system.json";

    #[test]
    fn test_round_trip() {
        let store = SectionStore::new(MemoryFs::new());
        let doc = json!({"system": {"meta": {"deviceName": "fan"}, "values": [1, 2, 3]}});
        store.save(PATH, &doc).unwrap();
        assert_eq!(store.load(PATH).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SectionStore::new(LocalFs::new(dir.path())).with_pretty(false);
        let first = json!({"wifi": {"wifiMode": 2}});
        let second = json!({"wifi": {"wifiMode": 1}});
        store.save(PATH, &first).unwrap();
        store.save(PATH, &second).unwrap();

        assert_eq!(store.load(PATH).unwrap(), second);
        let bak = std::fs::read(dir.path().join("json/20_cfg_system.json.bak")).unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&bak).unwrap(), first);
    }

    #[test]
    fn test_save_keeps_previous_as_backup() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();
        assert!(!fs.exists(&backup_path(PATH)));

        store.save(PATH, &json!({"v": 2})).unwrap();
        let bak: Value = serde_json::from_slice(&fs.get(&backup_path(PATH)).unwrap()).unwrap();
        assert_eq!(bak, json!({"v": 1}));
    }

    #[test]
    fn test_recovery_when_main_deleted() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();
        store.save(PATH, &json!({"v": 2})).unwrap();
        fs.delete(PATH);

        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
        assert!(fs.exists(PATH));
        assert!(!fs.exists(&backup_path(PATH)));
    }

    #[test]
    fn test_corrupt_main_falls_back_and_repairs() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();
        store.save(PATH, &json!({"v": 2})).unwrap();
        fs.put(PATH, "{ not json");

        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
        // the repaired main now parses on its own
        let repaired: Value = serde_json::from_slice(&fs.get(PATH).unwrap()).unwrap();
        assert_eq!(repaired, json!({"v": 1}));
        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
    }

    #[test]
    fn test_dual_failure_mutates_nothing() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();
        store.save(PATH, &json!({"v": 2})).unwrap();
        fs.put(PATH, "garbage");
        fs.put(&backup_path(PATH), "");

        let before = (fs.get(PATH), fs.get(&backup_path(PATH)));
        assert!(matches!(store.load(PATH), Err(ConfigError::Corrupt { .. })));
        assert_eq!((fs.get(PATH), fs.get(&backup_path(PATH))), before);
    }

    #[test]
    fn test_missing_main_with_corrupt_backup() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        fs.put(&backup_path(PATH), "{");

        assert!(matches!(store.load(PATH), Err(ConfigError::Corrupt { .. })));
        assert_eq!(fs.paths(), vec![backup_path(PATH)]);
    }

    #[test]
    fn test_missing_everything() {
        let store = SectionStore::new(MemoryFs::new());
        assert!(matches!(store.load(PATH), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_restore_rename_failure_is_io_error() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        fs.put(&backup_path(PATH), "{}");
        fs.set_faults(Faults {
            fail_rename: true,
            ..Default::default()
        });
        assert!(matches!(store.load(PATH), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();

        fs.set_faults(Faults {
            fail_write: true,
            ..Default::default()
        });
        assert!(store.save(PATH, &json!({"v": 2})).is_err());

        fs.set_faults(Faults::default());
        assert!(!fs.exists(&backup_path(PATH)));
        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
    }

    #[test]
    fn test_zero_byte_write_counts_as_failure() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();

        fs.set_faults(Faults {
            zero_write: true,
            ..Default::default()
        });
        assert!(store.save(PATH, &json!({"v": 2})).is_err());

        fs.set_faults(Faults::default());
        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
    }

    #[test]
    fn test_rotation_failure_aborts_without_changes() {
        let fs = MemoryFs::new();
        let store = SectionStore::new(&fs);
        store.save(PATH, &json!({"v": 1})).unwrap();

        fs.set_faults(Faults {
            fail_rename: true,
            ..Default::default()
        });
        assert!(matches!(
            store.save(PATH, &json!({"v": 2})),
            Err(ConfigError::Io { .. })
        ));
        fs.set_faults(Faults::default());
        assert_eq!(store.load(PATH).unwrap(), json!({"v": 1}));
    }
}
