// src/store/pg.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    AppointmentRow, AppointmentStatus, LocationRow, NewAppointment, ServiceRow, ShiftRow, UserRole,
    UserRow,
};
use crate::schedule::{BookingCandidate, ClinicClock, validate_booking};
use crate::store::{
    AppointmentFilter, BookError, ScheduleStore, ShiftFilter, StoreError, TherapistFilter,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn list_locations(&self) -> Result<Vec<LocationRow>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT location_id, name, address
            FROM location
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_location(&self, location_id: Uuid) -> Result<Option<LocationRow>, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT location_id, name, address
            FROM location
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_services(&self) -> Result<Vec<ServiceRow>, StoreError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT service_id, name, duration_min, cost_cents
            FROM service
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_service(&self, service_id: Uuid) -> Result<Option<ServiceRow>, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT service_id, name, duration_min, cost_cents
            FROM service
            WHERE service_id = $1
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, name, role, specialization
            FROM app_user
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_therapists(&self, filter: TherapistFilter) -> Result<Vec<UserRow>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.user_id, u.name, u.role, u.specialization
            FROM app_user u
            WHERE u.role = $1
              AND ($2::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM therapist_service ts
                    WHERE ts.user_id = u.user_id AND ts.service_id = $2))
              AND ($3::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM shift s
                    WHERE s.therapist_id = u.user_id AND s.location_id = $3))
            ORDER BY u.name ASC
            "#,
        )
        .bind(UserRole::Therapist)
        .bind(filter.service_id)
        .bind(filter.location_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<ShiftRow>, StoreError> {
        let rows = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT shift_id, therapist_id, location_id, day_of_week, start_minute, end_minute
            FROM shift
            WHERE ($1::uuid IS NULL OR location_id = $1)
              AND ($2::uuid[] IS NULL OR therapist_id = ANY($2))
            ORDER BY therapist_id ASC, day_of_week ASC, start_minute ASC
            "#,
        )
        .bind(filter.location_id)
        .bind(filter.therapist_ids.clone())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentRow>, StoreError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT appointment_id, start_at, duration_min, status,
                   patient_id, therapist_id, service_id, location_id
            FROM appointment
            WHERE ($1::uuid IS NULL OR location_id = $1)
              AND ($2::uuid[] IS NULL OR therapist_id = ANY($2))
              AND ($3::timestamptz IS NULL OR start_at + make_interval(mins => duration_min) > $3)
              AND ($4::timestamptz IS NULL OR start_at < $4)
            ORDER BY start_at ASC, appointment_id ASC
            "#,
        )
        .bind(filter.location_id)
        .bind(filter.therapist_ids.clone())
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn book(
        &self,
        new: NewAppointment,
        clock: &ClinicClock,
    ) -> Result<AppointmentRow, BookError> {
        let candidate = BookingCandidate {
            therapist_id: new.therapist_id,
            location_id: new.location_id,
            start_at: new.start_at,
            duration_min: new.duration_min,
        };

        // Dropping `tx` on any early return rolls back.
        let mut tx = self.db.begin().await?;

        // Serializes bookings per therapist until commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(new.therapist_id)
            .execute(&mut *tx)
            .await?;

        let shifts = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT shift_id, therapist_id, location_id, day_of_week, start_minute, end_minute
            FROM shift
            WHERE therapist_id = $1 AND location_id = $2
            "#,
        )
        .bind(new.therapist_id)
        .bind(new.location_id)
        .fetch_all(&mut *tx)
        .await?;

        let existing = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT appointment_id, start_at, duration_min, status,
                   patient_id, therapist_id, service_id, location_id
            FROM appointment
            WHERE therapist_id = $1
              AND status <> $2
              AND start_at < $4
              AND start_at + make_interval(mins => duration_min) > $3
            "#,
        )
        .bind(new.therapist_id)
        .bind(AppointmentStatus::Cancelled)
        .bind(candidate.start_at)
        .bind(candidate.end_at())
        .fetch_all(&mut *tx)
        .await?;

        validate_booking(&candidate, &shifts, &existing, clock)?;

        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            INSERT INTO appointment (
              start_at,
              duration_min,
              status,
              patient_id,
              therapist_id,
              service_id,
              location_id
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING appointment_id, start_at, duration_min, status,
                      patient_id, therapist_id, service_id, location_id
            "#,
        )
        .bind(new.start_at)
        .bind(new.duration_min)
        .bind(AppointmentStatus::Scheduled)
        .bind(new.patient_id)
        .bind(new.therapist_id)
        .bind(new.service_id)
        .bind(new.location_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}
