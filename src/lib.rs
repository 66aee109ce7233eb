//! Nature Wind configuration core
//!
//! Durable configuration for a smart fan controller, and the runtime pieces
//! that read it.
//!
//! Core modules:
//! - `persistence`: file backends and the backup-rotating section store
//! - `collection`: capacity-bounded lists and id allocation
//! - `config`: section models, the config root and its manager
//! - `runtime`: active schedule selection and AutoOff evaluation
//! - `wind`: preset/style/adjust resolution into actuator parameters
//! - `platform`: clock and temperature sensor seams
//! - `settings`: manager tunables

pub mod collection;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod runtime;
pub mod settings;
pub mod wind;

pub use config::{ConfigManager, ResetTarget, SaveReport, SectionKind};
pub use error::{ConfigError, Result};
pub use settings::ManagerSettings;
pub use wind::{ResolvedWind, resolve};

/// Firmware-wide constants
pub mod consts {
    /// Device path of the section manifest
    pub const MANIFEST_PATH: &str = "/json/10_cfg_jsonFile.json";
    pub const FW_VERSION: &str = "FW_Ver_1.0.0";

    /// Collection capacities
    pub const MAX_SCHEDULES: usize = 8;
    pub const MAX_SEGMENTS: usize = 8;
    pub const MAX_USER_PROFILES: usize = 6;
    pub const MAX_PRESETS: usize = 10;
    pub const MAX_STYLES: usize = 5;
    pub const MAX_STA_NETWORKS: usize = 5;
    pub const MAX_BLE_DEVICES: usize = 8;
    pub const MAX_NVS_ENTRIES: usize = 32;
    pub const MAX_PAGES: usize = 24;
    pub const MAX_PAGE_ASSETS: usize = 8;
    pub const MAX_REDIRECTS: usize = 32;
    pub const MAX_COMMON_ASSETS: usize = 16;
}
