// src/schedule/clock.rs

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Clinic reference zone. Every civil-date and minute-of-day conversion in the
/// engine goes through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicClock {
    tz: Tz,
}

impl ClinicClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Civil date of an instant in clinic-local time.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// 0 = Sunday .. 6 = Saturday.
    pub fn day_of_week(date: NaiveDate) -> i16 {
        date.weekday().num_days_from_sunday() as i16
    }

    /// Instant of `minute` (0..=1440) on the local `date`. 1440 is the next
    /// local midnight.
    pub fn at_minute(&self, date: NaiveDate, minute: i32) -> Option<DateTime<Utc>> {
        if !(0..=MINUTES_PER_DAY).contains(&minute) {
            return None;
        }
        let (date, minute) = if minute == MINUTES_PER_DAY {
            (date.succ_opt()?, 0)
        } else {
            (date, minute)
        };
        let naive = date.and_hms_opt((minute / 60) as u32, (minute % 60) as u32, 0)?;
        self.resolve(naive)
    }

    /// `[local midnight of date, local midnight of the next day)`.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.at_minute(date, 0)?, self.at_minute(date, MINUTES_PER_DAY)?))
    }

    // Folds take the earlier offset; gaps move forward by the usual one-hour shift.
    fn resolve(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => self
                .tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn day_of_week_starts_on_sunday() {
        assert_eq!(ClinicClock::day_of_week(date(2025, 6, 1)), 0); // Sunday
        assert_eq!(ClinicClock::day_of_week(date(2025, 6, 2)), 1);
        assert_eq!(ClinicClock::day_of_week(date(2025, 6, 7)), 6);
    }

    #[test]
    fn at_minute_in_utc() {
        let clock = ClinicClock::utc();
        assert_eq!(clock.at_minute(date(2025, 6, 2), 540), Some(utc(2025, 6, 2, 9, 0)));
        assert_eq!(clock.at_minute(date(2025, 6, 2), 1440), Some(utc(2025, 6, 3, 0, 0)));
        assert_eq!(clock.at_minute(date(2025, 6, 2), 1441), None);
        assert_eq!(clock.at_minute(date(2025, 6, 2), -1), None);
    }

    #[test]
    fn local_conversions_follow_the_zone() {
        let clock = ClinicClock::new(chrono_tz::Australia::Sydney);
        // 23:30 UTC on Sunday is 09:30 Monday in Sydney (AEST, +10).
        let instant = utc(2025, 6, 1, 23, 30);
        assert_eq!(clock.local_date(instant), date(2025, 6, 2));
        assert_eq!(clock.at_minute(date(2025, 6, 2), 570), Some(instant));
    }

    #[test]
    fn dst_gap_moves_forward() {
        let clock = ClinicClock::new(chrono_tz::America::New_York);
        // 02:30 does not exist on 2025-03-09; resolves to 03:30 EDT.
        assert_eq!(clock.at_minute(date(2025, 3, 9), 150), Some(utc(2025, 3, 9, 7, 30)));
    }

    #[test]
    fn dst_fold_takes_earliest() {
        let clock = ClinicClock::new(chrono_tz::America::New_York);
        // 01:30 happens twice on 2025-11-02; the EDT occurrence comes first.
        assert_eq!(clock.at_minute(date(2025, 11, 2), 90), Some(utc(2025, 11, 2, 5, 30)));
    }

    #[test]
    fn day_bounds_span_a_short_day() {
        let clock = ClinicClock::new(chrono_tz::America::New_York);
        let (start, end) = clock.day_bounds(date(2025, 3, 9)).unwrap();
        assert_eq!(end - start, Duration::hours(23));
    }
}
