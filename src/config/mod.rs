//! Configuration sections and their manager
//!
//! Core modules:
//! - `manifest`: section names and the section → file map
//! - `sections`, `schedule`, `profile`, `wind_dict`: section models
//! - `items`: CRUD shared by schedules and user profiles
//! - `root`: the lazily allocated config root
//! - `manager`: locking, dirty tracking, load/save and the CRUD surface

pub mod common;
pub mod dirty;
pub mod items;
pub mod manager;
pub mod manifest;
pub mod profile;
pub mod root;
pub mod schedule;
pub mod sections;
pub mod wind_dict;

pub use common::{
    AdjustDelta, AutoOff, BleGate, DayMask, MotionGate, OffTemp, OffTime, Period, PirGate,
    Segment, SegmentMode, TimerOff,
};
pub use dirty::DirtyFlags;
pub use items::{ModeItem, Segments};
pub use manager::{ConfigManager, ResetTarget, SaveReport};
pub use manifest::{MANIFEST_KEY, SectionFileMap, SectionKind};
pub use profile::{UserProfileItem, UserProfilesRoot};
pub use root::{ConfigRoot, Section};
pub use schedule::{ScheduleItem, SchedulesRoot};
pub use sections::{
    MotionConfig, NvsSpecConfig, SystemConfig, WebPageConfig, WifiConfig, WifiCredentials,
    WifiMode,
};
pub use wind_dict::{PresetEntry, StyleEntry, StyleFactors, WindBase, WindProfileDict};
