//! Section names and the manifest that maps them to files

use std::fmt;

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Top-level key of the manifest document
pub const MANIFEST_KEY: &str = "configJsonFile";

/// One named configuration domain, persisted as its own document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    System,
    Wifi,
    Motion,
    NvsSpec,
    Schedules,
    UserProfiles,
    WindDict,
    WebPage,
}

impl SectionKind {
    pub const COUNT: usize = 8;

    /// Every section, in load/save order
    pub const ALL: [SectionKind; Self::COUNT] = [
        SectionKind::System,
        SectionKind::Wifi,
        SectionKind::Motion,
        SectionKind::NvsSpec,
        SectionKind::Schedules,
        SectionKind::UserProfiles,
        SectionKind::WindDict,
        SectionKind::WebPage,
    ];

    /// JSON key used in the manifest, in section files and in exports
    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::System => "system",
            SectionKind::Wifi => "wifi",
            SectionKind::Motion => "motion",
            SectionKind::NvsSpec => "nvsSpec",
            SectionKind::Schedules => "schedules",
            SectionKind::UserProfiles => "userProfiles",
            SectionKind::WindDict => "windDict",
            SectionKind::WebPage => "webPage",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Position in [`Self::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Section name → file path, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFileMap {
    paths: [String; SectionKind::COUNT],
}

impl SectionFileMap {
    /// Build the map from a manifest document.
    ///
    /// Every section must map to a non-empty string; a single gap rejects
    /// the whole manifest.
    pub fn from_document(doc: &Value) -> Result<Self> {
        let root = doc
            .get(MANIFEST_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| ConfigError::Manifest(format!("missing '{}' object", MANIFEST_KEY)))?;

        let mut paths: [String; SectionKind::COUNT] = Default::default();
        for kind in SectionKind::ALL {
            let path = root
                .get(kind.key())
                .and_then(Value::as_str)
                .unwrap_or_default();
            if path.is_empty() {
                return Err(ConfigError::Manifest(format!("missing path for {}", kind)));
            }
            paths[kind.index()] = path.to_string();
        }
        Ok(Self { paths })
    }

    pub fn path(&self, kind: SectionKind) -> &str {
        &self.paths[kind.index()]
    }
}
