//! AutoOff trigger evaluation
//!
//! Armed from the AutoOff policy of the schedule or profile being started,
//! then polled. Triggers are checked in a fixed order (timer, time of day,
//! temperature) and the first one that fires is reported.

use std::fmt;
use std::time::Duration;

use super::window::parse_time_of_day;
use crate::config::AutoOff;
use crate::platform::{Clock, TemperatureSensor};

/// Temperature assumed until the first successful sensor read
pub const FALLBACK_TEMP_C: f32 = 24.0;

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoOffReason {
    Timer,
    OffTime,
    OffTemp,
}

impl fmt::Display for AutoOffReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timer => "timer",
            Self::OffTime => "offTime",
            Self::OffTemp => "offTemp",
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TimerState {
    started_ms: u64,
    minutes: u32,
}

/// Rate-limited cache in front of the temperature sensor
#[derive(Debug, Clone, Copy)]
struct TempCache {
    celsius: f32,
    last_read_ms: Option<u64>,
    interval_ms: u64,
}

impl TempCache {
    fn current(&mut self, now_ms: u64, sensor: &mut impl TemperatureSensor) -> f32 {
        let due = self
            .last_read_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms);

        if due {
            self.last_read_ms = Some(now_ms);
            match sensor.read_celsius() {
                Some(celsius) if celsius.is_finite() => self.celsius = celsius,
                _ => log::debug!("Temperature read failed, keeping {:.1}C", self.celsius),
            }
        }

        self.celsius
    }
}

/// Per-activation AutoOff state
#[derive(Debug, Clone)]
pub struct AutoOffRuntime {
    timer: Option<TimerState>,
    off_time: Option<u16>,
    off_temp: Option<f32>,
    /// (day of year, minute of day) of the last time-of-day trigger
    off_time_fired: Option<(u16, u16)>,
    temp: TempCache,
}

impl AutoOffRuntime {
    pub fn new(temp_read_interval: Duration) -> Self {
        Self {
            timer: None,
            off_time: None,
            off_temp: None,
            off_time_fired: None,
            temp: TempCache {
                celsius: FALLBACK_TEMP_C,
                last_read_ms: None,
                interval_ms: temp_read_interval.as_millis() as u64,
            },
        }
    }

    /// Arm from `policy`, starting the timer now. Replaces any previous arming.
    pub fn arm(&mut self, policy: &AutoOff, clock: &impl Clock) {
        self.disarm();

        // minutes == 0 leaves the timer disarmed
        if policy.timer.enabled && policy.timer.minutes > 0 {
            self.timer = Some(TimerState {
                started_ms: clock.millis(),
                minutes: policy.timer.minutes,
            });
        }
        if policy.off_time.enabled {
            self.off_time = Some(parse_time_of_day(&policy.off_time.time));
        }
        if policy.off_temp.enabled {
            self.off_temp = Some(policy.off_temp.temp);
        }

        log::debug!(
            "AutoOff armed: timer={:?} offTime={:?} offTemp={:?}",
            self.timer.map(|t| t.minutes),
            self.off_time,
            self.off_temp
        );
    }

    pub fn disarm(&mut self) {
        self.timer = None;
        self.off_time = None;
        self.off_temp = None;
        self.off_time_fired = None;
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some() || self.off_time.is_some() || self.off_temp.is_some()
    }

    /// Evaluate the armed triggers, returning the first that fires
    pub fn check(
        &mut self,
        clock: &impl Clock,
        sensor: &mut impl TemperatureSensor,
    ) -> Option<AutoOffReason> {
        if !self.is_armed() {
            return None;
        }

        let now_ms = clock.millis();

        if let Some(timer) = self.timer {
            let elapsed_min = now_ms.saturating_sub(timer.started_ms) / MS_PER_MINUTE;
            if elapsed_min >= u64::from(timer.minutes) {
                log::info!("AutoOff(timer {} min) triggered", timer.minutes);
                return Some(AutoOffReason::Timer);
            }
        }

        if let Some(off_minute) = self.off_time {
            match clock.local_time() {
                None => log::warn!("AutoOff(offTime) skipped: local time not available"),
                Some(local) => {
                    let stamp = (local.day_of_year, local.minute_of_day);
                    if self.off_time_fired != Some(stamp) && local.minute_of_day >= off_minute {
                        self.off_time_fired = Some(stamp);
                        log::info!(
                            "AutoOff(time {}) triggered (yday={} minute={})",
                            off_minute,
                            local.day_of_year,
                            local.minute_of_day
                        );
                        return Some(AutoOffReason::OffTime);
                    }
                }
            }
        }

        if let Some(threshold) = self.off_temp {
            let celsius = self.temp.current(now_ms, sensor);
            if celsius >= threshold {
                log::info!("AutoOff(temp {:.1}C >= {:.1}C) triggered", celsius, threshold);
                return Some(AutoOffReason::OffTemp);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OffTemp, OffTime, TimerOff};
    use crate::platform::{FixedTemperature, LocalTime, ManualClock};

    fn runtime() -> AutoOffRuntime {
        AutoOffRuntime::new(Duration::from_secs(2))
    }

    fn timer_policy(minutes: u32) -> AutoOff {
        AutoOff {
            timer: TimerOff { enabled: true, minutes },
            ..Default::default()
        }
    }

    fn off_time_policy(time: &str) -> AutoOff {
        AutoOff {
            off_time: OffTime {
                enabled: true,
                time: time.to_string(),
            },
            ..Default::default()
        }
    }

    fn off_temp_policy(temp: f32) -> AutoOff {
        AutoOff {
            off_temp: OffTemp { enabled: true, temp },
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_armed() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&AutoOff::default(), &clock);
        assert!(!rt.is_armed());
        assert_eq!(rt.check(&clock, &mut FixedTemperature(Some(99.0))), None);
    }

    #[test]
    fn test_timer_fires_after_minutes() {
        let clock = ManualClock::new();
        clock.advance_ms(10_000);
        let mut rt = runtime();
        rt.arm(&timer_policy(5), &clock);
        let mut sensor = FixedTemperature(None);

        clock.advance_ms(5 * 60_000 - 1);
        assert_eq!(rt.check(&clock, &mut sensor), None);
        clock.advance_ms(1);
        assert_eq!(rt.check(&clock, &mut sensor), Some(AutoOffReason::Timer));
    }

    #[test]
    fn test_zero_minute_timer_is_disarmed() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&timer_policy(0), &clock);
        assert!(!rt.is_armed());
        clock.advance_ms(60 * 60_000);
        assert_eq!(rt.check(&clock, &mut FixedTemperature(None)), None);
    }

    #[test]
    fn test_off_time_skipped_without_local_time() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_time_policy("00:00"), &clock);
        assert_eq!(rt.check(&clock, &mut FixedTemperature(None)), None);
    }

    #[test]
    fn test_off_time_fires_once_per_minute() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_time_policy("22:00"), &clock);
        let mut sensor = FixedTemperature(None);

        clock.set_local(Some(LocalTime::new(0, 21, 59).with_day_of_year(100)));
        assert_eq!(rt.check(&clock, &mut sensor), None);

        clock.set_local(Some(LocalTime::new(0, 22, 0).with_day_of_year(100)));
        assert_eq!(rt.check(&clock, &mut sensor), Some(AutoOffReason::OffTime));
        assert_eq!(rt.check(&clock, &mut sensor), None);

        clock.set_local(Some(LocalTime::new(0, 22, 1).with_day_of_year(100)));
        assert_eq!(rt.check(&clock, &mut sensor), Some(AutoOffReason::OffTime));

        // Same minute on another day fires again
        clock.set_local(Some(LocalTime::new(1, 22, 1).with_day_of_year(101)));
        assert_eq!(rt.check(&clock, &mut sensor), Some(AutoOffReason::OffTime));
    }

    #[test]
    fn test_off_temp_threshold() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_temp_policy(28.0), &clock);

        assert_eq!(rt.check(&clock, &mut FixedTemperature(Some(27.9))), None);
        clock.advance_ms(2_000);
        assert_eq!(
            rt.check(&clock, &mut FixedTemperature(Some(28.0))),
            Some(AutoOffReason::OffTemp)
        );
    }

    #[test]
    fn test_temperature_reads_are_rate_limited() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_temp_policy(30.0), &clock);

        assert_eq!(rt.check(&clock, &mut FixedTemperature(Some(25.0))), None);

        // Within the interval the cached 25.0 is reused
        clock.advance_ms(1_000);
        assert_eq!(rt.check(&clock, &mut FixedTemperature(Some(35.0))), None);

        clock.advance_ms(1_000);
        assert_eq!(
            rt.check(&clock, &mut FixedTemperature(Some(35.0))),
            Some(AutoOffReason::OffTemp)
        );
    }

    #[test]
    fn test_failed_read_keeps_cached_value() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_temp_policy(30.0), &clock);

        assert_eq!(
            rt.check(&clock, &mut FixedTemperature(Some(31.0))),
            Some(AutoOffReason::OffTemp)
        );
        clock.advance_ms(5_000);
        assert_eq!(
            rt.check(&clock, &mut FixedTemperature(None)),
            Some(AutoOffReason::OffTemp)
        );
    }

    #[test]
    fn test_failed_first_read_uses_fallback() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        rt.arm(&off_temp_policy(FALLBACK_TEMP_C), &clock);
        assert_eq!(
            rt.check(&clock, &mut FixedTemperature(None)),
            Some(AutoOffReason::OffTemp)
        );
    }

    #[test]
    fn test_timer_checked_before_off_time() {
        let clock = ManualClock::new();
        let mut rt = runtime();
        let policy = AutoOff {
            timer: TimerOff {
                enabled: true,
                minutes: 1,
            },
            ..off_time_policy("00:00")
        };
        rt.arm(&policy, &clock);
        clock.set_local(Some(LocalTime::new(0, 12, 0)));
        clock.advance_ms(60_000);

        assert_eq!(rt.check(&clock, &mut FixedTemperature(None)), Some(AutoOffReason::Timer));
    }
}
