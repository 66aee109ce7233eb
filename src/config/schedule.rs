//! Time-triggered schedules

use serde::{Deserialize, Serialize};

use super::common::{AutoOff, MotionGate, Period};
use super::items::{ModeItem, Segments};
use crate::collection::{BoundedVec, IdPolicy};
use crate::consts::MAX_SCHEDULES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleItem {
    pub sch_id: u16,
    pub sch_no: u16,
    pub name: String,
    pub enabled: bool,
    pub period: Period,
    pub segments: Segments,
    pub repeat_segments: bool,
    pub repeat_count: u8,
    pub auto_off: AutoOff,
    pub motion: MotionGate,
}

impl Default for ScheduleItem {
    fn default() -> Self {
        Self {
            sch_id: 0,
            sch_no: 0,
            name: String::new(),
            enabled: true,
            period: Period::default(),
            segments: Segments::new(),
            repeat_segments: true,
            repeat_count: 0,
            auto_off: AutoOff::default(),
            motion: MotionGate::default(),
        }
    }
}

impl ModeItem for ScheduleItem {
    const COLLECTION: &'static str = "schedules";
    const ID_FIELD: &'static str = "schId";
    const NUMBER_FIELD: &'static str = "schNo";
    const WRAPPER: &'static str = "schedule";
    const IDS: IdPolicy = IdPolicy { start: 10, step: 10 };

    fn id(&self) -> u16 {
        self.sch_id
    }

    fn set_id(&mut self, id: u16) {
        self.sch_id = id;
    }

    fn number(&self) -> u16 {
        self.sch_no
    }

    fn segments(&self) -> &Segments {
        &self.segments
    }

    fn segments_mut(&mut self) -> &mut Segments {
        &mut self.segments
    }
}

/// Body of the `schedules` section: a bare array of items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulesRoot {
    pub items: BoundedVec<ScheduleItem, MAX_SCHEDULES>,
}

impl SchedulesRoot {
    pub fn find(&self, sch_id: u16) -> Option<&ScheduleItem> {
        self.items.iter().find(|item| item.sch_id == sch_id)
    }
}
