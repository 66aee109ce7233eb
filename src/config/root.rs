//! The config root: one lazily allocated slot per section

use std::collections::TryReserveError;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::items::validate_items;
use super::manifest::SectionKind;
use super::profile::UserProfilesRoot;
use super::schedule::SchedulesRoot;
use super::sections::{MotionConfig, NvsSpecConfig, SystemConfig, WebPageConfig, WifiConfig};
use super::wind_dict::WindProfileDict;
use crate::collection::ensure_allocated;
use crate::error::{ConfigError, Result};

/// Typed body of one section document
pub trait Section: Serialize + DeserializeOwned + Default + Clone {
    const KIND: SectionKind;
    /// Older top-level key still accepted when reading
    const LEGACY_KEY: Option<&'static str> = None;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>>;
    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>>;

    /// Reserve full collection storage up front
    fn reserve(&mut self) -> std::result::Result<(), TryReserveError> {
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
thread_local! {
    /// Makes every section allocation on this thread fail
    pub(crate) static FAIL_ALLOCATION: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Default value with its collections reserved, or the allocation failure
pub fn try_default<S: Section>() -> std::result::Result<S, TryReserveError> {
    #[cfg(test)]
    if FAIL_ALLOCATION.get() {
        Vec::<u8>::new().try_reserve(usize::MAX)?;
    }

    let mut section = S::default();
    section.reserve()?;
    Ok(section)
}

fn shape_error(kind: SectionKind, message: String) -> ConfigError {
    ConfigError::Decode {
        section: kind,
        source: <serde_json::Error as serde::de::Error>::custom(message),
    }
}

/// Decode and validate a section from its `{ "<key>": body }` document
pub fn decode<S: Section>(doc: &Value) -> Result<S> {
    let body = doc
        .get(S::KIND.key())
        .or_else(|| S::LEGACY_KEY.and_then(|key| doc.get(key)))
        .ok_or_else(|| shape_error(S::KIND, format!("missing '{}' key", S::KIND.key())))?;
    decode_body(body)
}

/// Whether `doc` carries a body for `S` under its key or legacy key
pub fn carries<S: Section>(doc: &Value) -> bool {
    doc.get(S::KIND.key()).is_some() || S::LEGACY_KEY.is_some_and(|key| doc.get(key).is_some())
}

/// Decode and validate a bare section body
pub fn decode_body<S: Section>(body: &Value) -> Result<S> {
    let section = S::deserialize(body).map_err(|source| ConfigError::Decode {
        section: S::KIND,
        source,
    })?;
    section.validate()?;
    Ok(section)
}

/// Validate and serialize a section body (without the wrapping key)
pub fn encode_body<S: Section>(section: &S) -> Result<Value> {
    section.validate()?;
    serde_json::to_value(section).map_err(|source| ConfigError::Encode {
        what: S::KIND.to_string(),
        source,
    })
}

/// Run `$body` with `$S` bound to the section type of `$kind`
macro_rules! with_section {
    ($kind:expr, |$S:ident| $body:expr) => {
        match $kind {
            SectionKind::System => {
                type $S = SystemConfig;
                $body
            }
            SectionKind::Wifi => {
                type $S = WifiConfig;
                $body
            }
            SectionKind::Motion => {
                type $S = MotionConfig;
                $body
            }
            SectionKind::NvsSpec => {
                type $S = NvsSpecConfig;
                $body
            }
            SectionKind::Schedules => {
                type $S = SchedulesRoot;
                $body
            }
            SectionKind::UserProfiles => {
                type $S = UserProfilesRoot;
                $body
            }
            SectionKind::WindDict => {
                type $S = WindProfileDict;
                $body
            }
            SectionKind::WebPage => {
                type $S = WebPageConfig;
                $body
            }
        }
    };
}

/// All loaded sections. A slot stays empty until first use; once filled it
/// is overwritten in place on reload or reset.
#[derive(Debug, Clone, Default)]
pub struct ConfigRoot {
    system: Option<Box<SystemConfig>>,
    wifi: Option<Box<WifiConfig>>,
    motion: Option<Box<MotionConfig>>,
    nvs_spec: Option<Box<NvsSpecConfig>>,
    schedules: Option<Box<SchedulesRoot>>,
    user_profiles: Option<Box<UserProfilesRoot>>,
    wind_dict: Option<Box<WindProfileDict>>,
    web_page: Option<Box<WebPageConfig>>,
}

impl ConfigRoot {
    pub fn get<S: Section>(&self) -> Option<&S> {
        S::slot(self).as_deref()
    }

    /// Section `S`, allocated with defaults on first touch
    pub fn ensure<S: Section>(&mut self) -> Result<&mut S> {
        match ensure_allocated(S::slot_mut(self), || try_default::<S>().map(Box::new)) {
            Some(section) => Ok(section.as_mut()),
            None => {
                log::error!("Allocation failed for section {}", S::KIND);
                Err(ConfigError::Allocation(S::KIND))
            }
        }
    }

    /// Store `section`, reusing the existing slot when there is one
    pub fn install<S: Section>(&mut self, section: S) {
        let slot = S::slot_mut(self);
        if let Some(existing) = slot.as_deref_mut() {
            *existing = section;
        } else {
            *slot = Some(Box::new(section));
        }
    }

    /// Move section `kind` out of `staged` into this root, if `staged` has it
    pub fn adopt(&mut self, kind: SectionKind, staged: &mut ConfigRoot) -> bool {
        with_section!(kind, |S| match S::slot_mut(staged).take() {
            Some(section) => {
                self.install(*section);
                true
            }
            None => false,
        })
    }

    /// Whether `doc` carries a body for section `kind`
    pub fn document_carries(kind: SectionKind, doc: &Value) -> bool {
        with_section!(kind, |S| carries::<S>(doc))
    }

    pub fn is_loaded(&self, kind: SectionKind) -> bool {
        with_section!(kind, |S| self.get::<S>().is_some())
    }

    /// Replace section `kind` with the content of its file document
    pub fn load_document(&mut self, kind: SectionKind, doc: &Value) -> Result<()> {
        with_section!(kind, |S| {
            let section = decode::<S>(doc)?;
            self.install(section);
            Ok(())
        })
    }

    /// Replace section `kind` with a bare body
    pub fn load_body(&mut self, kind: SectionKind, body: &Value) -> Result<()> {
        with_section!(kind, |S| {
            let section = decode_body::<S>(body)?;
            self.install(section);
            Ok(())
        })
    }

    /// Overwrite section `kind` with compiled-in defaults
    pub fn reset(&mut self, kind: SectionKind) -> Result<()> {
        with_section!(kind, |S| {
            let section = try_default::<S>().map_err(|_| ConfigError::Allocation(kind))?;
            self.install(section);
            Ok(())
        })
    }

    /// Serialized body of `kind`, `None` while it is not loaded
    pub fn body(&self, kind: SectionKind) -> Result<Option<Value>> {
        with_section!(kind, |S| self.get::<S>().map(encode_body::<S>).transpose())
    }

    /// File document `{ "<key>": body }` of `kind`
    pub fn document(&self, kind: SectionKind) -> Result<Option<Value>> {
        Ok(self.body(kind)?.map(|body| {
            let mut doc = serde_json::Map::new();
            doc.insert(kind.key().to_string(), body);
            Value::Object(doc)
        }))
    }

    pub fn system(&self) -> Option<&SystemConfig> {
        self.get()
    }

    pub fn schedules(&self) -> Option<&SchedulesRoot> {
        self.get()
    }

    pub fn user_profiles(&self) -> Option<&UserProfilesRoot> {
        self.get()
    }

    pub fn wind_dict(&self) -> Option<&WindProfileDict> {
        self.get()
    }
}

impl Section for SystemConfig {
    const KIND: SectionKind = SectionKind::System;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.system
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.system
    }
}

impl Section for WifiConfig {
    const KIND: SectionKind = SectionKind::Wifi;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.wifi
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.wifi
    }
}

impl Section for MotionConfig {
    const KIND: SectionKind = SectionKind::Motion;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.motion
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.motion
    }
}

impl Section for NvsSpecConfig {
    const KIND: SectionKind = SectionKind::NvsSpec;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.nvs_spec
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.nvs_spec
    }
}

impl Section for SchedulesRoot {
    const KIND: SectionKind = SectionKind::Schedules;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.schedules
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.schedules
    }

    fn reserve(&mut self) -> std::result::Result<(), TryReserveError> {
        self.items.try_reserve_full()
    }

    fn validate(&self) -> Result<()> {
        validate_items(self.items.as_slice())
    }
}

impl Section for UserProfilesRoot {
    const KIND: SectionKind = SectionKind::UserProfiles;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.user_profiles
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.user_profiles
    }

    fn reserve(&mut self) -> std::result::Result<(), TryReserveError> {
        self.profiles.try_reserve_full()
    }

    fn validate(&self) -> Result<()> {
        validate_items(self.profiles.as_slice())
    }
}

impl Section for WindProfileDict {
    const KIND: SectionKind = SectionKind::WindDict;
    const LEGACY_KEY: Option<&'static str> = Some("windProfile");

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.wind_dict
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.wind_dict
    }

    fn reserve(&mut self) -> std::result::Result<(), TryReserveError> {
        self.presets.try_reserve_full()?;
        self.styles.try_reserve_full()
    }

    fn validate(&self) -> Result<()> {
        WindProfileDict::validate(self)
    }
}

impl Section for WebPageConfig {
    const KIND: SectionKind = SectionKind::WebPage;

    fn slot(root: &ConfigRoot) -> &Option<Box<Self>> {
        &root.web_page
    }

    fn slot_mut(root: &mut ConfigRoot) -> &mut Option<Box<Self>> {
        &mut root.web_page
    }
}
