//! Durable section persistence
//!
//! Features:
//! - One JSON document per section file
//! - Backup rotation (old main → `.bak` before each write)
//! - Rollback to the backup when a write fails
//! - Corruption detection and recovery from the backup on load
//!
//! The rotation is not a crash-atomic commit: a power loss between the
//! rename and the write leaves only the backup, which the next load promotes.

pub mod backend;
pub mod store;

pub use backend::{Faults, FileBackend, LocalFs, MemoryFs};
pub use store::{SectionStore, backup_path};
