// src/schedule/projector.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::ShiftRow;
use crate::schedule::{ClinicClock, Interval};

/// Weekly shift template: day of week -> shifts starting that day, plus
/// dates on which the clinic is closed and nothing projects.
#[derive(Debug, Clone, Default)]
pub struct WeeklyAvailability {
    by_day: BTreeMap<i16, Vec<ShiftRow>>,
    closures: BTreeSet<NaiveDate>,
}

impl WeeklyAvailability {
    pub fn from_shifts<'a>(shifts: impl IntoIterator<Item = &'a ShiftRow>) -> Self {
        let mut by_day: BTreeMap<i16, Vec<ShiftRow>> = BTreeMap::new();
        for s in shifts {
            if !s.is_well_formed() {
                tracing::warn!(
                    shift_id = %s.shift_id,
                    day_of_week = s.day_of_week,
                    start_minute = s.start_minute,
                    end_minute = s.end_minute,
                    "skipping malformed shift"
                );
                continue;
            }
            by_day.entry(s.day_of_week).or_default().push(s.clone());
        }
        Self {
            by_day,
            closures: BTreeSet::new(),
        }
    }

    pub fn with_closures(mut self, closures: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.closures.extend(closures);
        self
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closures.contains(&date)
    }

    pub fn shifts_on(&self, day_of_week: i16) -> &[ShiftRow] {
        self.by_day.get(&day_of_week).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn project(&self, date: NaiveDate, clock: &ClinicClock) -> Vec<Interval> {
        if self.is_closed(date) {
            return vec![];
        }

        let mut out: Vec<Interval> = self
            .shifts_on(ClinicClock::day_of_week(date))
            .iter()
            .filter_map(|s| {
                Some(Interval {
                    start: clock.at_minute(date, s.start_minute)?,
                    end: clock.at_minute(date, s.end_minute)?,
                    therapist_id: s.therapist_id,
                })
            })
            .collect();

        out.sort();
        out
    }

    /// Inclusive of both endpoints; every date gets an entry.
    pub fn project_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        clock: &ClinicClock,
    ) -> BTreeMap<NaiveDate, Vec<Interval>> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| (d, self.project(d, clock)))
            .collect()
    }
}
