//! Active schedule selection

use super::window::TimeWindow;
use crate::config::{ScheduleItem, SchedulesRoot};
use crate::platform::LocalTime;

/// How to choose among several schedules whose windows match at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// First match in stored order
    #[default]
    FirstInOrder,
    /// Match with the largest user-assigned number
    HighestNumber,
}

fn is_active(item: &ScheduleItem, now: &LocalTime) -> bool {
    item.enabled
        && item.period.days.is_enabled(now.weekday)
        && TimeWindow::from_period(&item.period).contains(now.minute_of_day)
}

/// Index of the schedule active at `now`, if any.
///
/// `now.weekday` is Monday-based; anything past 6 selects nothing.
pub fn find_active_schedule(
    schedules: &SchedulesRoot,
    now: &LocalTime,
    policy: SelectionPolicy,
) -> Option<usize> {
    if now.weekday > 6 {
        return None;
    }

    let mut matches = schedules
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| is_active(item, now));

    match policy {
        SelectionPolicy::FirstInOrder => matches.next().map(|(idx, _)| idx),
        SelectionPolicy::HighestNumber => matches
            .max_by_key(|(idx, item)| (item.sch_no, std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DayMask, Period};

    fn schedule(sch_no: u16, start: &str, end: &str) -> ScheduleItem {
        ScheduleItem {
            sch_id: sch_no * 10,
            sch_no,
            period: Period {
                days: DayMask::default(),
                start_time: start.to_string(),
                end_time: end.to_string(),
            },
            ..Default::default()
        }
    }

    fn root(items: Vec<ScheduleItem>) -> SchedulesRoot {
        SchedulesRoot {
            items: items.try_into().unwrap(),
        }
    }

    #[test]
    fn test_overnight_schedule() {
        let schedules = root(vec![schedule(1, "22:00", "06:00")]);
        let at = |h, m| LocalTime::new(2, h, m);

        assert_eq!(find_active_schedule(&schedules, &at(23, 30), SelectionPolicy::default()), Some(0));
        assert_eq!(find_active_schedule(&schedules, &at(5, 0), SelectionPolicy::default()), Some(0));
        assert_eq!(find_active_schedule(&schedules, &at(12, 0), SelectionPolicy::default()), None);
    }

    #[test]
    fn test_degenerate_window_is_skipped() {
        let schedules = root(vec![schedule(1, "08:00", "08:00"), schedule(2, "07:00", "09:00")]);
        let now = LocalTime::new(0, 8, 0);
        assert_eq!(find_active_schedule(&schedules, &now, SelectionPolicy::FirstInOrder), Some(1));
    }

    #[test]
    fn test_disabled_and_day_filters() {
        let mut off = schedule(1, "00:00", "23:59");
        off.enabled = false;
        let mut weekdays_only = schedule(2, "00:00", "23:59");
        weekdays_only.period.days = DayMask([true, true, true, true, true, false, false]);
        let schedules = root(vec![off, weekdays_only]);

        let monday = LocalTime::new(0, 10, 0);
        let sunday = LocalTime::new(6, 10, 0);
        assert_eq!(find_active_schedule(&schedules, &monday, SelectionPolicy::default()), Some(1));
        assert_eq!(find_active_schedule(&schedules, &sunday, SelectionPolicy::default()), None);
    }

    #[test]
    fn test_weekday_out_of_range() {
        let schedules = root(vec![schedule(1, "00:00", "23:59")]);
        let now = LocalTime::new(7, 10, 0);
        assert_eq!(find_active_schedule(&schedules, &now, SelectionPolicy::default()), None);
    }

    #[test]
    fn test_overlap_policies() {
        let schedules = root(vec![
            schedule(3, "08:00", "12:00"),
            schedule(9, "10:00", "14:00"),
            schedule(5, "09:00", "18:00"),
        ]);
        let now = LocalTime::new(1, 11, 0);

        assert_eq!(find_active_schedule(&schedules, &now, SelectionPolicy::FirstInOrder), Some(0));
        assert_eq!(find_active_schedule(&schedules, &now, SelectionPolicy::HighestNumber), Some(1));
    }

    #[test]
    fn test_empty_collection() {
        let now = LocalTime::new(0, 0, 0);
        assert_eq!(find_active_schedule(&SchedulesRoot::default(), &now, SelectionPolicy::HighestNumber), None);
    }
}
