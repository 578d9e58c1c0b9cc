//! Storage seam for the booking engine.
//!
//! `PgStore` is the production backend; `MemoryStore` backs local runs without
//! a database and the test suite. Both implement booking as one atomic
//! check-and-insert per therapist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AppointmentRow, LocationRow, NewAppointment, ServiceRow, ShiftRow, UserRow};
use crate::schedule::{BookingRejection, ClinicClock};

pub mod memory;
pub mod pg;
pub mod seed;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Rejected(#[from] BookingRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for BookError {
    fn from(e: sqlx::Error) -> Self {
        BookError::Store(StoreError::Database(e))
    }
}

/// Therapists certified for `service_id` (if set) and working at
/// `location_id` (if set).
#[derive(Debug, Clone, Copy, Default)]
pub struct TherapistFilter {
    pub service_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    pub location_id: Option<Uuid>,
    /// `None` means every therapist.
    pub therapist_ids: Option<Vec<Uuid>>,
}

/// Appointments whose `[start_at, end_at)` intersects `[from, to)`, any status.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub location_id: Option<Uuid>,
    pub therapist_ids: Option<Vec<Uuid>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_locations(&self) -> Result<Vec<LocationRow>, StoreError>;

    async fn find_location(&self, location_id: Uuid) -> Result<Option<LocationRow>, StoreError>;

    async fn list_services(&self) -> Result<Vec<ServiceRow>, StoreError>;

    async fn find_service(&self, service_id: Uuid) -> Result<Option<ServiceRow>, StoreError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, StoreError>;

    async fn list_therapists(&self, filter: TherapistFilter) -> Result<Vec<UserRow>, StoreError>;

    async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<ShiftRow>, StoreError>;

    /// Ordered by `start_at`.
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentRow>, StoreError>;

    /// Validates `new` against the therapist's shifts and appointments and
    /// inserts it with status `scheduled`, atomically with respect to every
    /// other booking for the same therapist.
    async fn book(
        &self,
        new: NewAppointment,
        clock: &ClinicClock,
    ) -> Result<AppointmentRow, BookError>;
}
