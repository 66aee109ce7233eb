//! Platform abstraction layer
//!
//! Handles device/host differences for:
//! - Monotonic ticks and local wall-clock time
//! - Temperature readings
//!
//! File access lives in [`crate::persistence::FileBackend`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

/// Local wall-clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    /// Minutes since local midnight, 0..1440
    pub minute_of_day: u16,
    /// 0-based day of the year
    pub day_of_year: u16,
}

impl LocalTime {
    pub fn new(weekday: u8, hour: u8, minute: u8) -> Self {
        Self {
            weekday,
            minute_of_day: hour as u16 * 60 + minute as u16,
            day_of_year: 0,
        }
    }

    pub fn with_day_of_year(mut self, day_of_year: u16) -> Self {
        self.day_of_year = day_of_year;
        self
    }
}

pub trait Clock {
    /// Monotonic milliseconds since an arbitrary start
    fn millis(&self) -> u64;
    /// Local time, `None` while wall-clock time is unknown
    fn local_time(&self) -> Option<LocalTime>;
}

/// Parse an IANA zone name such as `"Asia/Seoul"`
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

/// Weekday, minute of day and day of year of a zoned timestamp
pub fn local_time_of<Z: TimeZone>(at: &DateTime<Z>) -> LocalTime {
    LocalTime {
        weekday: at.weekday().num_days_from_monday() as u8,
        minute_of_day: (at.hour() * 60 + at.minute()) as u16,
        day_of_year: at.ordinal0() as u16,
    }
}

/// Host clock: `Instant` for ticks, UTC system time viewed in a zone
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self {
            start: Instant::now(),
            tz,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
    }

    fn local_time(&self) -> Option<LocalTime> {
        Some(local_time_of(&Utc::now().with_timezone(&self.tz)))
    }
}

/// Settable clock for hosts without real time and for tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
    local: Mutex<Option<LocalTime>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set_local(&self, local: Option<LocalTime>) {
        *self.local.lock() = local;
    }
}

impl Clock for ManualClock {
    fn millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }

    fn local_time(&self) -> Option<LocalTime> {
        *self.local.lock()
    }
}

pub trait TemperatureSensor {
    /// Degrees Celsius, `None` when the read failed
    fn read_celsius(&mut self) -> Option<f32>;
}

/// Sensor stand-in returning a settable value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedTemperature(pub Option<f32>);

impl TemperatureSensor for FixedTemperature {
    fn read_celsius(&mut self) -> Option<f32> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_epoch_is_thursday() {
        let t = local_time_of(&utc(1970, 1, 1, 0, 0));
        assert_eq!(t.weekday, 3);
        assert_eq!(t.minute_of_day, 0);
        assert_eq!(t.day_of_year, 0);
    }

    #[test]
    fn test_known_date() {
        // Friday, day 60 of a leap year
        let t = local_time_of(&utc(2024, 3, 1, 13, 45));
        assert_eq!(t.weekday, 4);
        assert_eq!(t.minute_of_day, 13 * 60 + 45);
        assert_eq!(t.day_of_year, 60);
    }

    #[test]
    fn test_zone_shifts_minute_and_day() {
        let seoul = parse_timezone("Asia/Seoul").unwrap();

        // 14:30 UTC is 23:30 in Seoul, same day
        let t = local_time_of(&utc(2024, 3, 1, 14, 30).with_timezone(&seoul));
        assert_eq!((t.weekday, t.minute_of_day), (4, 23 * 60 + 30));

        // 16:00 UTC Sunday is 01:00 Monday in Seoul
        let t = local_time_of(&utc(2024, 12, 29, 16, 0).with_timezone(&seoul));
        assert_eq!((t.weekday, t.minute_of_day, t.day_of_year), (0, 60, 364));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone(" Asia/Seoul "), Some(chrono_tz::Asia::Seoul));
        assert_eq!(parse_timezone("UTC"), Some(chrono_tz::UTC));
        assert_eq!(parse_timezone("Mars/Olympus"), None);
        assert_eq!(parse_timezone(""), None);
    }

    #[test]
    fn test_system_clock_reports_time() {
        let clock = SystemClock::new(chrono_tz::Europe::Berlin);
        let t = clock.local_time().unwrap();
        assert!(t.weekday < 7);
        assert!(t.minute_of_day < 24 * 60);
        assert!(t.day_of_year < 366);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.local_time(), None);
        clock.advance_ms(1500);
        clock.set_local(Some(LocalTime::new(0, 8, 30)));
        assert_eq!(clock.millis(), 1500);
        assert_eq!(clock.local_time().map(|t| t.minute_of_day), Some(510));
    }
}
