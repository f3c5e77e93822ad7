// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Work-time timestamp generation
//!
//! A work-time is a timestamp on a weekday whose hour falls inside the
//! configured working window, evaluated in the range's own UTC offset.

use chrono::{DateTime, Datelike, Days, FixedOffset, TimeZone, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Draws made before [`next_work_time`] gives up and returns the range start
pub const MAX_ATTEMPTS: usize = 100;

const COARSE_MINUTES: [u32; 4] = [0, 15, 30, 45];

/// Half-open hour window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    start: u32,
    end: u32,
}

impl WorkHours {
    /// Create a window
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidWorkHours` unless `start < end <= 24`.
    pub fn new(start: u32, end: u32) -> Result<Self, ScheduleError> {
        if start >= end || end > 24 {
            return Err(ScheduleError::InvalidWorkHours { start, end });
        }
        Ok(Self { start, end })
    }

    /// First allowed hour
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// First hour past the window
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Whether `hour` lies in the window
    #[must_use]
    pub fn contains(&self, hour: u32) -> bool {
        (self.start..self.end).contains(&hour)
    }
}

impl Default for WorkHours {
    fn default() -> Self {
        Self { start: 9, end: 17 }
    }
}

/// Settings for [`next_work_time`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTimeConfig {
    /// Allowed hours
    pub hours: WorkHours,
    /// Draw minutes from non-multiples of five instead of quarter hours
    pub avoid_round_minutes: bool,
}

/// Closed timestamp range; both ends share the start's offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl DateRange {
    /// Create a range. `end` is converted into `start`'s offset.
    #[must_use]
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            start,
            end: end.with_timezone(start.offset()),
        }
    }

    /// Create a range, rejecting one that ends before it starts
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidRange` if `end < start`.
    pub fn try_new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ScheduleError> {
        if end < start {
            return Err(ScheduleError::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self::new(start, end))
    }

    /// Range start
    #[must_use]
    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    /// Range end (inclusive)
    #[must_use]
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Whether the range holds no interval
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `t` lies inside the range
    #[must_use]
    pub fn contains(&self, t: &DateTime<FixedOffset>) -> bool {
        *t >= self.start && *t <= self.end
    }
}

/// Weekday and business-hour predicate
#[must_use]
pub fn is_work_time<Tz: TimeZone>(t: &DateTime<Tz>, hours: &WorkHours) -> bool {
    t.weekday().num_days_from_monday() < 5 && hours.contains(t.hour())
}

/// Draw a minute of the hour
fn draw_minute<R: Rng + ?Sized>(avoid_round_minutes: bool, rng: &mut R) -> u32 {
    if avoid_round_minutes {
        // 48 non-multiples of five: four per five-minute block
        let idx: u32 = rng.random_range(0..48);
        (idx / 4) * 5 + idx % 4 + 1
    } else {
        COARSE_MINUTES[rng.random_range(0..COARSE_MINUTES.len())]
    }
}

/// Draw a work-time inside `range`
///
/// The day is uniform over the range's calendar days, the hour uniform over
/// the work window, and the second uniform over `0..60`. Draws that land on a
/// weekend or outside the range are retried up to [`MAX_ATTEMPTS`] times, after
/// which the range start is returned. A degenerate range returns its start.
pub fn next_work_time<R: Rng + ?Sized>(
    range: &DateRange,
    config: &WorkTimeConfig,
    rng: &mut R,
) -> DateTime<FixedOffset> {
    if range.is_degenerate() {
        return range.start;
    }

    let offset = *range.start.offset();
    let first_day = range.start.date_naive();
    let day_span = (range.end.date_naive() - first_day).num_days().max(0) as u64;

    for _ in 0..MAX_ATTEMPTS {
        let day = rng.random_range(0..=day_span);
        let hour = rng.random_range(config.hours.start..config.hours.end);
        let minute = draw_minute(config.avoid_round_minutes, rng);
        let second = rng.random_range(0..60);

        let candidate = first_day
            .checked_add_days(Days::new(day))
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .and_then(|naive| offset.from_local_datetime(&naive).single());

        if let Some(t) = candidate {
            if range.contains(&t) && is_work_time(&t, &config.hours) {
                return t;
            }
        }
    }

    range.start
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use similar_asserts::assert_eq;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn dt(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        utc().with_ymd_and_hms(2025, 11, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_work_hours_validation() {
        assert!(WorkHours::new(9, 17).is_ok());
        assert!(WorkHours::new(0, 24).is_ok());
        assert!(matches!(
            WorkHours::new(17, 9),
            Err(ScheduleError::InvalidWorkHours { start: 17, end: 9 })
        ));
        assert!(WorkHours::new(9, 9).is_err());
        assert!(WorkHours::new(9, 25).is_err());
    }

    #[test]
    fn test_work_hours_contains_is_half_open() {
        let hours = WorkHours::default();
        assert!(hours.contains(9));
        assert!(hours.contains(16));
        assert!(!hours.contains(17));
        assert!(!hours.contains(8));
    }

    #[test]
    fn test_is_work_time() {
        let hours = WorkHours::default();
        // 2025-11-10 is a Monday
        assert!(is_work_time(&dt(10, 9, 0), &hours));
        assert!(!is_work_time(&dt(10, 17, 0), &hours));
        // Saturday
        assert!(!is_work_time(&dt(15, 12, 0), &hours));
    }

    #[test]
    fn test_try_new_rejects_reversed_range() {
        assert!(matches!(
            DateRange::try_new(dt(12, 10, 0), dt(10, 10, 0)),
            Err(ScheduleError::InvalidRange { .. })
        ));
        assert!(DateRange::try_new(dt(12, 10, 0), dt(12, 10, 0)).is_ok());
    }

    #[test]
    fn test_degenerate_range_returns_start() {
        let mut rng = StdRng::seed_from_u64(1);
        let range = DateRange::new(dt(12, 10, 0), dt(10, 10, 0));
        let t = next_work_time(&range, &WorkTimeConfig::default(), &mut rng);
        assert_eq!(t, dt(12, 10, 0));

        let point = DateRange::new(dt(12, 10, 0), dt(12, 10, 0));
        assert_eq!(
            next_work_time(&point, &WorkTimeConfig::default(), &mut rng),
            dt(12, 10, 0)
        );
    }

    #[test]
    fn test_weekend_only_range_falls_back_to_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = DateRange::new(dt(15, 0, 0), dt(16, 23, 0));
        let t = next_work_time(&range, &WorkTimeConfig::default(), &mut rng);
        assert_eq!(t, dt(15, 0, 0));
    }

    #[test]
    fn test_coarse_minutes_are_quarter_hours() {
        let mut rng = StdRng::seed_from_u64(3);
        let range = DateRange::new(dt(10, 9, 0), dt(14, 17, 0));
        for _ in 0..200 {
            let t = next_work_time(&range, &WorkTimeConfig::default(), &mut rng);
            assert!(COARSE_MINUTES.contains(&t.minute()), "minute {}", t.minute());
        }
    }

    #[test]
    fn test_avoid_round_minutes_never_multiple_of_five() {
        let mut rng = StdRng::seed_from_u64(4);
        let range = DateRange::new(dt(10, 9, 0), dt(14, 17, 0));
        let config = WorkTimeConfig {
            avoid_round_minutes: true,
            ..Default::default()
        };
        for _ in 0..200 {
            let t = next_work_time(&range, &config, &mut rng);
            assert_ne!(t.minute() % 5, 0, "minute {}", t.minute());
        }
    }

    #[test]
    fn test_draw_minute_covers_all_non_round_minutes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..5000 {
            seen.insert(draw_minute(true, &mut rng));
        }
        let expected: std::collections::BTreeSet<u32> = (0..60).filter(|m| m % 5 != 0).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_offset_is_preserved() {
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        let start = pacific.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap();
        let end = pacific.with_ymd_and_hms(2025, 11, 20, 17, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let t = next_work_time(&DateRange::new(start, end), &WorkTimeConfig::default(), &mut rng);
        assert_eq!(t.offset(), &pacific);
        assert!(is_work_time(&t, &WorkHours::default()));
    }

    #[test]
    fn test_range_end_normalized_to_start_offset() {
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        let start = pacific.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap();
        let range = DateRange::new(start, dt(11, 1, 0));
        assert_eq!(range.end().offset(), &pacific);
        assert_eq!(range.end(), dt(11, 1, 0));
    }
}
