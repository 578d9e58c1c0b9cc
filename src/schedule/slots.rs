// src/schedule/slots.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::AppointmentRow;
use crate::schedule::{ClinicClock, Interval, overlaps};

pub const DEFAULT_CADENCE_MIN: i32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("duration must be positive, got {0} minutes")]
    InvalidDuration(i32),
    #[error("cadence must be positive, got {0} minutes")]
    InvalidCadence(i32),
}

/// Width of every candidate slot and the step between candidate starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRules {
    duration_min: i32,
    cadence_min: i32,
}

impl SlotRules {
    pub fn new(duration_min: i32, cadence_min: i32) -> Result<Self, ScheduleError> {
        if duration_min <= 0 {
            return Err(ScheduleError::InvalidDuration(duration_min));
        }
        if cadence_min <= 0 {
            return Err(ScheduleError::InvalidCadence(cadence_min));
        }
        Ok(Self {
            duration_min,
            cadence_min,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_min as i64)
    }

    pub fn cadence(&self) -> Duration {
        Duration::minutes(self.cadence_min as i64)
    }
}

/// An open start time and every therapist free to take it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub start_at: DateTime<Utc>,
    pub therapist_ids: Vec<Uuid>,
}

/// Enumerates cadence-aligned starts inside each interval, drops the ones that
/// collide with an active appointment of the same therapist, and merges the
/// rest by start instant. Output is sorted by start; therapist ids are sorted.
pub fn generate_slots(
    intervals: &[Interval],
    rules: &SlotRules,
    appointments: &[AppointmentRow],
) -> Vec<Slot> {
    let duration = rules.duration();
    let cadence = rules.cadence();

    let mut by_start: BTreeMap<DateTime<Utc>, BTreeSet<Uuid>> = BTreeMap::new();

    for interval in intervals {
        let busy: Vec<&AppointmentRow> = appointments
            .iter()
            .filter(|a| a.therapist_id == interval.therapist_id && a.is_active())
            .collect();

        let mut start = interval.start;
        while start + duration <= interval.end {
            let end = start + duration;
            let blocked = busy
                .iter()
                .any(|a| overlaps(a.start_at, a.end_at(), start, end));

            if !blocked {
                by_start.entry(start).or_default().insert(interval.therapist_id);
            }
            start += cadence;
        }
    }

    by_start
        .into_iter()
        .map(|(start_at, ids)| Slot {
            start_at,
            therapist_ids: ids.into_iter().collect(),
        })
        .collect()
}

/// Buckets slots by clinic-local date, keeping ascending order inside a day.
pub fn group_by_day(slots: Vec<Slot>, clock: &ClinicClock) -> BTreeMap<NaiveDate, Vec<Slot>> {
    let mut out: BTreeMap<NaiveDate, Vec<Slot>> = BTreeMap::new();
    for slot in slots {
        out.entry(clock.local_date(slot.start_at)).or_default().push(slot);
    }
    out
}
