//! Error type shared by the store, the config manager and the CRUD surface

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::config::SectionKind;

/// Errors returned by configuration operations.
///
/// Every variant carries enough context for a diagnostic message; callers
/// that only need a pass/fail signal can use `is_ok()` on the result.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// open/read/write/rename/remove failed on the file backend
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Neither the main file nor its backup exists
    #[error("configuration file not found: {path}")]
    Missing { path: String },

    /// Main file and backup both failed to parse
    #[error("{path} and its backup are both unreadable")]
    Corrupt { path: String },

    /// Manifest absent, malformed or missing a required section path
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("{collection} is full (capacity {capacity})")]
    Capacity {
        collection: &'static str,
        capacity: usize,
    },

    #[error("duplicate {field} {value} in {collection}")]
    DuplicateKey {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{collection} has no entry {key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    #[error("could not allocate section {0}")]
    Allocation(SectionKind),

    #[error("config lock not acquired within {0:?}")]
    LockTimeout(Duration),

    /// Nested call conflicting with an access already running on this thread
    #[error("config root is in use by an enclosing call")]
    Reentrant,

    /// Input rejected before any mutation (zero user number, empty code, ...)
    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    /// Section document parsed as JSON but does not match the section model
    #[error("section {section} has an unexpected shape: {source}")]
    Decode {
        section: SectionKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: &str, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            what,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
