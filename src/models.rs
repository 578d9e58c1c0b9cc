use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::schedule::ClinicClock;
use crate::store::ScheduleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScheduleStore>,
    pub clock: ClinicClock,
    pub slot_cadence_min: i32,
    pub max_slot_range_days: i64,
    pub closed_dates: Arc<BTreeSet<NaiveDate>>,
}

/* -------------------------
   API envelope
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

/* -------------------------
   DB Row Models
--------------------------*/

/// Stored as smallint: 0 admin, 1 therapist, 2 patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum UserRole {
    Admin = 0,
    Therapist = 1,
    Patient = 2,
}

/// Stored as smallint: 0 scheduled, 1 completed, 2 cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum AppointmentStatus {
    Scheduled = 0,
    Completed = 1,
    Cancelled = 2,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationRow {
    pub location_id: Uuid,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRow {
    pub service_id: Uuid,
    pub name: String,
    pub duration_min: i32,
    pub cost_cents: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow)]
pub struct CertificationRow {
    pub user_id: Uuid,
    pub service_id: Uuid,
}

/// Recurring weekly block a therapist works at a location.
/// `day_of_week` is 0 = Sunday; minutes count from local midnight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShiftRow {
    pub shift_id: Uuid,
    pub therapist_id: Uuid,
    pub location_id: Uuid,
    pub day_of_week: i16,
    pub start_minute: i32,
    pub end_minute: i32,
}

impl ShiftRow {
    pub fn is_well_formed(&self) -> bool {
        (0..=6).contains(&self.day_of_week)
            && self.start_minute >= 0
            && self.start_minute < self.end_minute
            && self.end_minute <= crate::schedule::MINUTES_PER_DAY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentRow {
    pub appointment_id: Uuid,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_at: DateTime<Utc>,
    pub duration_min: i32,
    pub status: AppointmentStatus,
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub service_id: Uuid,
    pub location_id: Uuid,
}

impl AppointmentRow {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(self.duration_min as i64)
    }

    /// Cancelled appointments never hold a therapist's time.
    pub fn is_active(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

/// Appointment about to be inserted; the store assigns the id and status.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub start_at: DateTime<Utc>,
    pub duration_min: i32,
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub service_id: Uuid,
    pub location_id: Uuid,
}

impl NewAppointment {
    pub fn into_row(self, appointment_id: Uuid) -> AppointmentRow {
        AppointmentRow {
            appointment_id,
            start_at: self.start_at,
            duration_min: self.duration_min,
            status: AppointmentStatus::Scheduled,
            patient_id: self.patient_id,
            therapist_id: self.therapist_id,
            service_id: self.service_id,
            location_id: self.location_id,
        }
    }
}
