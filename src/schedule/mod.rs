//! Availability and slot engine. Everything in here is pure: no I/O, no shared
//! state. Storage and HTTP live in `store` and `routes`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod booking;
pub mod clock;
pub mod projector;
pub mod slots;

pub use booking::{BookingCandidate, BookingRejection, validate_booking};
pub use clock::{ClinicClock, MINUTES_PER_DAY};
pub use projector::WeeklyAvailability;
pub use slots::{ScheduleError, Slot, SlotRules, generate_slots, group_by_day};

/// One projected shift on a concrete date, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub therapist_id: Uuid,
}

/// Half-open overlap: touching endpoints do not collide.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}
