// src/schedule/booking.rs

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AppointmentRow, ShiftRow};
use crate::schedule::{ClinicClock, WeeklyAvailability, overlaps};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingCandidate {
    pub therapist_id: Uuid,
    pub location_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_min: i32,
}

impl BookingCandidate {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(self.duration_min as i64)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BookingRejection {
    #[error("therapist is not available at this time/location")]
    NotAvailable,
    #[error("therapist is already booked for this time slot")]
    DoubleBooked,
}

/// Shift coverage first, then collision. Coverage is checked against the
/// projected shift instants, the same intervals slots are generated from.
/// Callers must hold the therapist's booking lock across this check and the
/// insert that follows it.
pub fn validate_booking(
    candidate: &BookingCandidate,
    shifts: &[ShiftRow],
    existing: &[AppointmentRow],
    clock: &ClinicClock,
) -> Result<(), BookingRejection> {
    let end_at = candidate.end_at();
    let date = clock.local_date(candidate.start_at);

    let own = shifts.iter().filter(|s| {
        s.therapist_id == candidate.therapist_id && s.location_id == candidate.location_id
    });
    let covered = WeeklyAvailability::from_shifts(own)
        .project(date, clock)
        .iter()
        .any(|i| i.start <= candidate.start_at && end_at <= i.end);
    if !covered {
        return Err(BookingRejection::NotAvailable);
    }

    let collides = existing.iter().any(|a| {
        a.therapist_id == candidate.therapist_id
            && a.is_active()
            && overlaps(a.start_at, a.end_at(), candidate.start_at, end_at)
    });
    if collides {
        return Err(BookingRejection::DoubleBooked);
    }

    Ok(())
}
