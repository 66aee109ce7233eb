//! Building blocks shared by schedules and user profiles

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Enabled weekdays, index 0 = Monday .. 6 = Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMask(pub [bool; 7]);

impl Default for DayMask {
    fn default() -> Self {
        Self([true; 7])
    }
}

impl DayMask {
    pub fn is_enabled(&self, weekday: u8) -> bool {
        self.0.get(weekday as usize).copied().unwrap_or(false)
    }
}

// Files store the mask as 0/1 numbers; older files used booleans
impl Serialize for DayMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flags: Vec<u8> = self.0.iter().map(|on| u8::from(*on)).collect();
        flags.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DayMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DayFlag {
            Flag(bool),
            Number(i64),
        }

        let flags = Vec::<DayFlag>::deserialize(deserializer)?;
        let mut days = [true; 7];
        for (slot, flag) in days.iter_mut().zip(flags) {
            *slot = match flag {
                DayFlag::Flag(on) => on,
                DayFlag::Number(n) => n != 0,
            };
        }
        Ok(Self(days))
    }
}

/// Weekly window; times are "HH:MM"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Period {
    pub days: DayMask,
    pub start_time: String,
    pub end_time: String,
}

impl Default for Period {
    fn default() -> Self {
        Self {
            days: DayMask::default(),
            start_time: "00:00".to_string(),
            end_time: "23:59".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SegmentMode {
    /// Wind resolved from preset + style
    #[default]
    Preset,
    /// Constant fan speed
    Fixed,
}

impl<'de> Deserialize<'de> for SegmentMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(if code.eq_ignore_ascii_case("FIXED") {
            SegmentMode::Fixed
        } else {
            SegmentMode::Preset
        })
    }
}

/// User deltas added on top of a resolved preset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdjustDelta {
    pub wind_intensity: f32,
    pub gust_frequency: f32,
    pub wind_variability: f32,
    pub fan_limit: f32,
    pub min_fan: f32,
    pub turbulence_length_scale: f32,
    pub turbulence_intensity_sigma: f32,
    pub thermal_bubble_strength: f32,
    pub thermal_bubble_radius: f32,
}

/// One on/off step of a schedule or profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Segment {
    /// Reissued by the manager on every add/update
    pub seg_id: u16,
    /// User ordering key, unique within the owning item
    pub seg_no: u16,
    pub on_minutes: u16,
    pub off_minutes: u16,
    pub mode: SegmentMode,
    pub preset_code: String,
    pub style_code: String,
    pub adjust: AdjustDelta,
    pub fixed_speed: f32,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            seg_id: 0,
            seg_no: 0,
            on_minutes: 10,
            off_minutes: 0,
            mode: SegmentMode::Preset,
            preset_code: String::new(),
            style_code: String::new(),
            adjust: AdjustDelta::default(),
            fixed_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerOff {
    pub enabled: bool,
    /// Zero leaves the timer disarmed
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffTime {
    pub enabled: bool,
    /// "HH:MM"
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffTemp {
    pub enabled: bool,
    /// Celsius
    pub temp: f32,
}

/// Conditions that end an active run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoOff {
    pub timer: TimerOff,
    pub off_time: OffTime,
    pub off_temp: OffTemp,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PirGate {
    pub enabled: bool,
    pub hold_sec: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BleGate {
    pub enabled: bool,
    pub rssi_threshold: i32,
    pub hold_sec: u16,
}

impl Default for BleGate {
    fn default() -> Self {
        Self {
            enabled: false,
            rssi_threshold: -70,
            hold_sec: 0,
        }
    }
}

/// Presence gating applied while an item runs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionGate {
    pub pir: PirGate,
    pub ble: BleGate,
}
