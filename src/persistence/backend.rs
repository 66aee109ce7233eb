//! Byte-oriented file backends
//!
//! The store only needs five primitives, so the flash filesystem on the
//! device, a host directory and an in-memory map all fit behind one trait.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

/// Minimal filesystem surface used by [`super::SectionStore`]
pub trait FileBackend {
    fn exists(&self, path: &str) -> bool;
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
    /// Create or truncate `path` and write `bytes`, returning the count written
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<usize>;
    fn remove(&self, path: &str) -> io::Result<()>;
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;
}

impl<B: FileBackend + ?Sized> FileBackend for &B {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<usize> {
        (**self).write(path, bytes)
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        (**self).remove(path)
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

/// Host directory standing in for the device filesystem.
///
/// Paths are device-style (`/json/10_cfg_system.json`) and resolve under
/// `root`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl FileBackend for LocalFs {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<usize> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&full)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(bytes.len())
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))
    }
}

/// Injected failures for [`MemoryFs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// Every `write` fails after truncating the target
    pub fail_write: bool,
    /// Every `write` reports zero bytes written
    pub zero_write: bool,
    /// Every `rename` fails
    pub fail_rename: bool,
}

/// In-memory backend with fault injection, for hosts and tests
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<String, Vec<u8>>>,
    faults: Mutex<Faults>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock() = faults;
    }

    /// Place raw bytes, bypassing faults
    pub fn put(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.to_string(), bytes.into());
    }

    /// Raw bytes at `path`, bypassing faults
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn delete(&self, path: &str) {
        self.files.lock().remove(path);
    }

    /// Sorted list of stored paths
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path))
}

impl FileBackend for MemoryFs {
    fn exists(&self, path: &str) -> bool {
        self.files.lock().contains_key(path)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.lock().get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<usize> {
        let faults = *self.faults.lock();
        let mut files = self.files.lock();
        if faults.fail_write {
            files.insert(path.to_string(), Vec::new());
            return Err(io::Error::other("injected write failure"));
        }
        if faults.zero_write {
            files.insert(path.to_string(), Vec::new());
            return Ok(0);
        }
        files.insert(path.to_string(), bytes.to_vec());
        Ok(bytes.len())
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        if self.faults.lock().fail_rename {
            return Err(io::Error::other("injected rename failure"));
        }
        let mut files = self.files.lock();
        let bytes = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_string(), bytes);
        Ok(())
    }
}
