//! Per-section dirty flags
//!
//! Each flag is a standalone atomic, so marking a section dirty never waits
//! on the coarse config lock held by a long save.

use std::sync::atomic::{AtomicBool, Ordering};

use super::manifest::SectionKind;

#[derive(Debug, Default)]
pub struct DirtyFlags {
    flags: [AtomicBool; SectionKind::COUNT],
}

impl DirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, kind: SectionKind) {
        self.flags[kind.index()].store(true, Ordering::Release);
    }

    pub fn clear(&self, kind: SectionKind) {
        self.flags[kind.index()].store(false, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self, kind: SectionKind) -> bool {
        self.flags[kind.index()].swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self, kind: SectionKind) -> bool {
        self.flags[kind.index()].load(Ordering::Acquire)
    }
}
