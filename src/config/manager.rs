//! Config manager: the locked, dirty-tracked front of the config root
//!
//! All root operations run under one coarse re-entrant lock, acquired with
//! a bounded wait. A CRUD call may save (autosave) or export while already
//! holding it. Dirty flags sit outside that lock so they can be marked from
//! any thread without waiting on a save in progress.
//!
//! The section → file map is read once from the manifest and never changes
//! afterwards.

use std::cell::{Ref, RefCell, RefMut};
use std::sync::OnceLock;

use chrono_tz::Tz;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde_json::{Map, Value};

use super::common::AdjustDelta;
use super::dirty::DirtyFlags;
use super::items::{add_item, item_from_json, remove_item, update_item};
use super::manifest::{SectionFileMap, SectionKind};
use super::profile::{UserProfileItem, UserProfilesRoot};
use super::root::{ConfigRoot, Section};
use super::schedule::{ScheduleItem, SchedulesRoot};
use super::wind_dict::{PresetEntry, StyleEntry, WindProfileDict};
use crate::error::{ConfigError, Result};
use crate::persistence::{FileBackend, SectionStore};
use crate::platform::{LocalTime, SystemClock, parse_timezone};
use crate::runtime::{SelectionPolicy, find_active_schedule};
use crate::settings::ManagerSettings;
use crate::wind::{self, ResolvedWind};

type RootGuard<'a> = ReentrantMutexGuard<'a, RefCell<ConfigRoot>>;

/// Shared view of the root. Fails while a `mutate` on this thread holds it.
fn borrow_root<'g>(guard: &'g RootGuard<'_>) -> Result<Ref<'g, ConfigRoot>> {
    guard.try_borrow().map_err(|_| ConfigError::Reentrant)
}

/// Exclusive view of the root. Fails while any access on this thread holds it.
fn borrow_root_mut<'g>(guard: &'g RootGuard<'_>) -> Result<RefMut<'g, ConfigRoot>> {
    guard.try_borrow_mut().map_err(|_| ConfigError::Reentrant)
}

/// Which sections a factory reset overwrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    All,
    Section(SectionKind),
}

impl ResetTarget {
    fn kinds(self) -> Vec<SectionKind> {
        match self {
            ResetTarget::All => SectionKind::ALL.to_vec(),
            ResetTarget::Section(kind) => vec![kind],
        }
    }
}

/// Outcome of a save pass. A failed section keeps its dirty flag.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<SectionKind>,
    pub failed: Vec<(SectionKind, ConfigError)>,
}

impl SaveReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// The saved sections, or the first failure
    pub fn into_result(self) -> Result<Vec<SectionKind>> {
        match self.failed.into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(self.saved),
        }
    }
}

/// Owner of the config root, its dirty flags and the section store
pub struct ConfigManager<B> {
    store: SectionStore<B>,
    settings: ManagerSettings,
    file_map: OnceLock<SectionFileMap>,
    root: ReentrantMutex<RefCell<ConfigRoot>>,
    dirty: DirtyFlags,
}

impl<B: FileBackend> ConfigManager<B> {
    pub fn new(backend: B, settings: ManagerSettings) -> Self {
        Self {
            store: SectionStore::new(backend).with_pretty(settings.pretty_json),
            settings,
            file_map: OnceLock::new(),
            root: ReentrantMutex::new(RefCell::new(ConfigRoot::default())),
            dirty: DirtyFlags::new(),
        }
    }

    fn guard(&self) -> Result<RootGuard<'_>> {
        let timeout = self.settings.lock_timeout();
        self.root.try_lock_for(timeout).ok_or_else(|| {
            log::warn!("Config lock not acquired within {:?}", timeout);
            ConfigError::LockTimeout(timeout)
        })
    }

    /// The section → file map, once the manifest has been read
    pub fn file_map(&self) -> Result<&SectionFileMap> {
        self.file_map
            .get()
            .ok_or_else(|| ConfigError::Manifest("manifest not loaded".to_string()))
    }

    /// Read the manifest on first call; later calls return the same map
    pub fn load_manifest(&self) -> Result<&SectionFileMap> {
        if let Some(map) = self.file_map.get() {
            return Ok(map);
        }

        let path = &self.settings.manifest_path;
        let doc = self.store.load(path).map_err(|e| {
            log::error!("Manifest unavailable: {}", e);
            ConfigError::Manifest(format!("{}: {}", path, e))
        })?;
        let map = SectionFileMap::from_document(&doc).inspect_err(|e| log::error!("{}", e))?;

        log::info!("Manifest loaded from {}", path);
        Ok(self.file_map.get_or_init(|| map))
    }

    // === Lifecycle ===

    /// Load every section named by the manifest.
    ///
    /// Sections are decoded into a staging root first. Any failure aborts
    /// with the live root untouched, unless `seed_missing_sections` allows
    /// a missing file to be replaced by defaults (marked dirty).
    pub fn load_all(&self) -> Result<()> {
        let map = self.load_manifest()?;
        let guard = self.guard()?;

        let mut staged = ConfigRoot::default();
        let mut seeded = Vec::new();
        for kind in SectionKind::ALL {
            let path = map.path(kind);
            match self.store.load(path) {
                Ok(doc) => staged.load_document(kind, &doc).inspect_err(|e| {
                    log::error!("Section {} in {} rejected: {}", kind, path, e);
                })?,
                Err(ConfigError::Missing { .. }) if self.settings.seed_missing_sections => {
                    log::warn!("Section {} missing, seeding defaults", kind);
                    staged.reset(kind)?;
                    seeded.push(kind);
                }
                Err(e) => {
                    log::error!("Section {} failed to load: {}", kind, e);
                    return Err(e);
                }
            }
        }

        let mut root = borrow_root_mut(&guard)?;
        for kind in SectionKind::ALL {
            root.adopt(kind, &mut staged);
            self.dirty.clear(kind);
        }
        for kind in seeded {
            self.dirty.mark(kind);
        }

        log::info!("Loaded {} config sections", SectionKind::COUNT);
        Ok(())
    }

    /// Re-read one section from its file, discarding unsaved changes
    pub fn reload(&self, kind: SectionKind) -> Result<()> {
        let map = self.file_map()?;
        let guard = self.guard()?;

        let doc = self.store.load(map.path(kind))?;
        borrow_root_mut(&guard)?.load_document(kind, &doc)?;
        self.dirty.clear(kind);

        log::info!("Reloaded section {}", kind);
        Ok(())
    }

    // === Dirty tracking and saving ===

    pub fn mark_dirty(&self, kind: SectionKind) {
        self.dirty.mark(kind);
    }

    pub fn is_dirty(&self, kind: SectionKind) -> bool {
        self.dirty.is_set(kind)
    }

    /// `{ "<section>": bool, ... }` for every section
    pub fn dirty_status(&self) -> Value {
        Value::Object(
            SectionKind::ALL
                .into_iter()
                .map(|kind| (kind.key().to_string(), Value::Bool(self.dirty.is_set(kind))))
                .collect(),
        )
    }

    fn write_section(&self, root: &ConfigRoot, map: &SectionFileMap, kind: SectionKind) -> Result<()> {
        match root.document(kind)? {
            Some(doc) => self.store.save(map.path(kind), &doc),
            None => {
                log::debug!("Section {} not loaded, nothing to save", kind);
                Ok(())
            }
        }
    }

    /// Save every dirty section.
    ///
    /// Each flag is cleared before its write and set again if the write
    /// fails, so a mark that lands during the save is never lost. One
    /// failing section does not stop the others.
    pub fn save_dirty(&self) -> Result<SaveReport> {
        let map = self.file_map()?;
        let guard = self.guard()?;
        let root = borrow_root(&guard)?;

        let mut report = SaveReport::default();
        for kind in SectionKind::ALL {
            if !self.dirty.take(kind) {
                continue;
            }
            match self.write_section(&root, map, kind) {
                Ok(()) => {
                    log::info!("Saved section {}", kind);
                    report.saved.push(kind);
                }
                Err(e) => {
                    self.dirty.mark(kind);
                    log::error!("Saving section {} failed: {}", kind, e);
                    report.failed.push((kind, e));
                }
            }
        }
        Ok(report)
    }

    /// Mark every loaded section dirty and save
    pub fn save_all(&self) -> Result<SaveReport> {
        let guard = self.guard()?;
        let loaded: Vec<_> = {
            let root = borrow_root(&guard)?;
            SectionKind::ALL.into_iter().filter(|&kind| root.is_loaded(kind)).collect()
        };
        for kind in loaded {
            self.dirty.mark(kind);
        }
        self.save_dirty()
    }

    fn autosave(&self) {
        match self.save_dirty() {
            Ok(report) if report.is_ok() => {}
            Ok(report) => {
                for (kind, e) in &report.failed {
                    log::warn!("Autosave of {} failed, left dirty: {}", kind, e);
                }
            }
            Err(e) => log::warn!("Autosave skipped: {}", e),
        }
    }

    // === Reset and export ===

    /// Overwrite sections with compiled-in defaults and mark them dirty.
    /// Nothing is written until the next save.
    pub fn factory_reset(&self, target: ResetTarget) -> Result<()> {
        let kinds = target.kinds();

        let mut staged = ConfigRoot::default();
        for &kind in &kinds {
            staged.reset(kind)?;
        }

        let guard = self.guard()?;
        let mut root = borrow_root_mut(&guard)?;
        for kind in kinds {
            root.adopt(kind, &mut staged);
            self.dirty.mark(kind);
        }

        log::warn!("Factory reset: {:?}", target);
        Ok(())
    }

    /// Restore the sections present in a master document of defaults.
    ///
    /// Sections absent from `doc` are left alone. Every present section is
    /// decoded before any is applied, so a bad one rejects the whole call.
    pub fn factory_reset_from_document(&self, doc: &Value) -> Result<Vec<SectionKind>> {
        if !doc.is_object() {
            return Err(ConfigError::invalid("defaults document", "not an object"));
        }

        let mut staged = ConfigRoot::default();
        let mut restored = Vec::new();
        for kind in SectionKind::ALL {
            if ConfigRoot::document_carries(kind, doc) {
                staged.load_document(kind, doc)?;
            } else if let Some(body) = flat_body(kind, doc) {
                staged.load_body(kind, &body)?;
            } else {
                continue;
            }
            restored.push(kind);
        }

        let guard = self.guard()?;
        let mut root = borrow_root_mut(&guard)?;
        for &kind in &restored {
            root.adopt(kind, &mut staged);
            self.dirty.mark(kind);
        }

        log::warn!("Restored {} section(s) from defaults document", restored.len());
        Ok(restored)
    }

    /// Every loaded section in one document keyed by section name
    pub fn export_all(&self) -> Result<Value> {
        let mut out = Map::new();
        self.export_into(&mut out)?;
        Ok(Value::Object(out))
    }

    /// Write loaded sections into `out`, dropping keys that name no section
    pub fn export_into(&self, out: &mut Map<String, Value>) -> Result<()> {
        let guard = self.guard()?;
        let root = borrow_root(&guard)?;

        let mut bodies = Vec::with_capacity(SectionKind::COUNT);
        for kind in SectionKind::ALL {
            if let Some(body) = root.body(kind)? {
                bodies.push((kind, body));
            }
        }

        out.retain(|key, _| SectionKind::from_key(key).is_some());
        for (kind, body) in bodies {
            out.insert(kind.key().to_string(), body);
        }
        Ok(())
    }

    // === Access ===

    /// Run `f` against the root under the lock.
    ///
    /// `f` may call back into reads and exports; a nested mutation fails
    /// with [`ConfigError::Reentrant`].
    pub fn read<T>(&self, f: impl FnOnce(&ConfigRoot) -> T) -> Result<T> {
        let guard = self.guard()?;
        let root = borrow_root(&guard)?;
        Ok(f(&root))
    }

    /// Run `f` on section `S` (allocated on first touch), then mark it dirty.
    ///
    /// `f` must check its preconditions before mutating; an error from `f`
    /// leaves the flag untouched. With autosave on, dirty sections are saved
    /// before the lock is released. Any root access from inside `f` fails
    /// with [`ConfigError::Reentrant`].
    pub fn mutate<S: Section, T>(&self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let guard = self.guard()?;
        let out = {
            let mut root = borrow_root_mut(&guard)?;
            f(root.ensure::<S>()?)?
        };
        self.dirty.mark(S::KIND);

        if self.settings.autosave {
            self.autosave();
        }
        drop(guard);
        Ok(out)
    }

    // === Local time ===

    /// Zone named by the system section, UTC when unloaded or unknown
    pub fn timezone(&self) -> Result<Tz> {
        self.read(|root| {
            let Some(system) = root.system() else {
                return Tz::UTC;
            };
            let name = &system.time.timezone;
            parse_timezone(name).unwrap_or_else(|| {
                log::warn!("Unknown timezone '{}', using UTC", name);
                Tz::UTC
            })
        })
    }

    /// Host clock in the configured zone
    pub fn system_clock(&self) -> Result<SystemClock> {
        self.timezone().map(SystemClock::new)
    }

    // === Schedules ===

    /// Add a schedule, returning its new `schId`
    pub fn add_schedule(&self, item: ScheduleItem) -> Result<u16> {
        self.mutate(|s: &mut SchedulesRoot| add_item(&mut s.items, item))
            .inspect(|id| log::info!("Schedule {} added", id))
    }

    pub fn update_schedule(&self, sch_id: u16, item: ScheduleItem) -> Result<()> {
        self.mutate(|s: &mut SchedulesRoot| update_item(&mut s.items, sch_id, item))
    }

    pub fn delete_schedule(&self, sch_id: u16) -> Result<()> {
        self.mutate(|s: &mut SchedulesRoot| remove_item(&mut s.items, sch_id).map(drop))
            .inspect(|_| log::info!("Schedule {} deleted", sch_id))
    }

    pub fn add_schedule_json(&self, doc: &Value) -> Result<u16> {
        self.add_schedule(item_from_json(doc)?)
    }

    pub fn update_schedule_json(&self, sch_id: u16, doc: &Value) -> Result<()> {
        self.update_schedule(sch_id, item_from_json(doc)?)
    }

    /// The schedule active at `now`, if any
    pub fn active_schedule(
        &self,
        now: &LocalTime,
        policy: SelectionPolicy,
    ) -> Result<Option<ScheduleItem>> {
        self.read(|root| {
            let schedules = root.schedules()?;
            let index = find_active_schedule(schedules, now, policy)?;
            schedules.items.get(index).cloned()
        })
    }

    // === User profiles ===

    /// Add a profile, returning its new `profileId`
    pub fn add_profile(&self, item: UserProfileItem) -> Result<u16> {
        self.mutate(|p: &mut UserProfilesRoot| add_item(&mut p.profiles, item))
            .inspect(|id| log::info!("Profile {} added", id))
    }

    pub fn update_profile(&self, profile_id: u16, item: UserProfileItem) -> Result<()> {
        self.mutate(|p: &mut UserProfilesRoot| update_item(&mut p.profiles, profile_id, item))
    }

    pub fn delete_profile(&self, profile_id: u16) -> Result<()> {
        self.mutate(|p: &mut UserProfilesRoot| remove_item(&mut p.profiles, profile_id).map(drop))
            .inspect(|_| log::info!("Profile {} deleted", profile_id))
    }

    pub fn add_profile_json(&self, doc: &Value) -> Result<u16> {
        self.add_profile(item_from_json(doc)?)
    }

    pub fn update_profile_json(&self, profile_id: u16, doc: &Value) -> Result<()> {
        self.update_profile(profile_id, item_from_json(doc)?)
    }

    // === Wind dictionary ===

    pub fn add_preset(&self, entry: PresetEntry) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.add_preset(entry))
    }

    pub fn update_preset(&self, code: &str, entry: PresetEntry) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.update_preset(code, entry))
    }

    pub fn delete_preset(&self, code: &str) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.delete_preset(code).map(drop))
    }

    pub fn add_style(&self, entry: StyleEntry) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.add_style(entry))
    }

    pub fn update_style(&self, code: &str, entry: StyleEntry) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.update_style(code, entry))
    }

    pub fn delete_style(&self, code: &str) -> Result<()> {
        self.mutate(|d: &mut WindProfileDict| d.delete_style(code).map(drop))
    }

    /// Resolve against the loaded dictionary; an unloaded one resolves
    /// every code as unknown
    pub fn resolve_wind(
        &self,
        preset_code: &str,
        style_code: Option<&str>,
        adjust: Option<&AdjustDelta>,
    ) -> Result<ResolvedWind> {
        self.read(|root| match root.wind_dict() {
            Some(dict) => wind::resolve(dict, preset_code, style_code, adjust),
            None => wind::resolve(&WindProfileDict::empty(), preset_code, style_code, adjust),
        })
    }
}

/// Defaults documents may carry the web page lists at the top level
fn flat_body(kind: SectionKind, doc: &Value) -> Option<Value> {
    if kind != SectionKind::WebPage {
        return None;
    }
    let body: Map<String, Value> = ["pages", "reDirect", "assets"]
        .into_iter()
        .filter_map(|key| doc.get(key).map(|v| (key.to_string(), v.clone())))
        .collect();
    (!body.is_empty()).then_some(Value::Object(body))
}
