//! Minute-of-day windows that may cross midnight

use crate::config::Period;

/// Half-open `[start, end)` window over minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u16,
    pub end: u16,
}

impl TimeWindow {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn from_period(period: &Period) -> Self {
        Self::new(
            parse_time_of_day(&period.start_time),
            parse_time_of_day(&period.end_time),
        )
    }

    /// A window whose start equals its end never matches
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, minute_of_day: u16) -> bool {
        let (start, end) = (self.start, self.end);

        if self.is_degenerate() {
            false
        } else if start < end {
            // Same-day window
            minute_of_day >= start && minute_of_day < end
        } else {
            // Wraparound case (e.g. 22:00 -> 06:00)
            minute_of_day >= start || minute_of_day < end
        }
    }
}

/// Parse `"HH:MM"` into minutes since midnight.
///
/// Strings without a colon, empty strings and non-numeric parts read as
/// zero. Hour is clamped to 0..=23 and minute to 0..=59.
pub fn parse_time_of_day(text: &str) -> u16 {
    let Some((hour, minute)) = text.split_once(':') else {
        return 0;
    };

    let hour = leading_int(hour).clamp(0, 23) as u16;
    let minute = leading_int(minute).clamp(0, 59) as u16;
    hour * 60 + minute
}

/// Leading signed integer of `text`, ignoring trailing garbage; 0 if none
fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .take(6)
        .fold(0i64, |acc, b| acc * 10 + i64::from(b - b'0'));

    if negative { -value } else { value }
}
