// src/routes/appointment_routes.rs

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use chrono::DateTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{ApiOk, AppState, AppointmentRow, NewAppointment, UserRole},
    routes::{optional_date, optional_uuid},
    schedule::{BookingRejection, MINUTES_PER_DAY},
    store::{AppointmentFilter, BookError},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/appointments", get(list_appointments).post(book_appointment))
}

/* ============================================================
   GET /appointments
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub location_id: Option<String>,
    pub therapist_id: Option<String>,
    // YYYY-MM-DD, clinic-local
    pub date: Option<String>,
}

/// Staff schedule: appointments touching the given clinic-local day, any status.
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<AppointmentRow>>>, ApiError> {
    let location_id = optional_uuid("location_id", q.location_id.as_deref())?;
    let therapist_id = optional_uuid("therapist_id", q.therapist_id.as_deref())?;
    let date = optional_date("date", q.date.as_deref())?;

    let (from, to) = match date {
        Some(d) => {
            let (from, to) = state
                .clock
                .day_bounds(d)
                .ok_or_else(|| ApiError::invalid_request("date out of range"))?;
            (Some(from), Some(to))
        }
        None => (None, None),
    };

    let rows = state
        .store
        .list_appointments(&AppointmentFilter {
            location_id,
            therapist_ids: therapist_id.map(|id| vec![id]),
            from,
            to,
        })
        .await?;

    Ok(Json(ApiOk { data: rows }))
}

/* ============================================================
   POST /appointments (book)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    /// Epoch seconds.
    pub datetime: Option<i64>,
    pub duration_mins: Option<i32>,
    pub patient_id: Option<Uuid>,
    pub therapist_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

pub async fn book_appointment(
    State(state): State<AppState>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiOk<AppointmentRow>>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_request(e.body_text()))?;

    let (
        Some(datetime),
        Some(duration_min),
        Some(patient_id),
        Some(therapist_id),
        Some(service_id),
        Some(location_id),
    ) = (
        req.datetime,
        req.duration_mins,
        req.patient_id,
        req.therapist_id,
        req.service_id,
        req.location_id,
    )
    else {
        return Err(ApiError::invalid_request("Missing required fields"));
    };

    if !(1..=MINUTES_PER_DAY).contains(&duration_min) {
        return Err(ApiError::invalid_request(format!(
            "duration_mins must be between 1 and {MINUTES_PER_DAY}"
        )));
    }
    let start_at = DateTime::from_timestamp(datetime, 0)
        .ok_or_else(|| ApiError::invalid_request("datetime out of range"))?;

    state
        .store
        .find_service(service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("service"))?;
    state
        .store
        .find_location(location_id)
        .await?
        .ok_or_else(|| ApiError::not_found("location"))?;
    ensure_role(&state, therapist_id, UserRole::Therapist, "therapist").await?;
    ensure_role(&state, patient_id, UserRole::Patient, "patient").await?;

    if state.closed_dates.contains(&state.clock.local_date(start_at)) {
        tracing::info!(%therapist_id, %start_at, "booking rejected: clinic closed");
        return Err(BookingRejection::NotAvailable.into());
    }

    let new = NewAppointment {
        start_at,
        duration_min,
        patient_id,
        therapist_id,
        service_id,
        location_id,
    };

    match state.store.book(new, &state.clock).await {
        Ok(row) => {
            tracing::info!(
                appointment_id = %row.appointment_id,
                %therapist_id,
                %start_at,
                duration_min,
                "appointment booked"
            );
            Ok((StatusCode::CREATED, Json(ApiOk { data: row })))
        }
        Err(BookError::Rejected(reason)) => {
            tracing::info!(%therapist_id, %start_at, duration_min, %reason, "booking rejected");
            Err(reason.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn ensure_role(
    state: &AppState,
    user_id: Uuid,
    role: UserRole,
    what: &str,
) -> Result<(), ApiError> {
    match state.store.find_user(user_id).await? {
        Some(u) if u.role == role => Ok(()),
        _ => Err(ApiError::not_found(what)),
    }
}
