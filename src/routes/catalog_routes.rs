// src/routes/catalog_routes.rs

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    models::{ApiOk, AppState, LocationRow, ServiceRow, ShiftRow, UserRow},
    routes::optional_uuid,
    store::{ShiftFilter, TherapistFilter},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/services", get(list_services))
        .route("/therapists", get(list_therapists))
        .route("/availabilities", get(list_availabilities))
}

pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<LocationRow>>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.store.list_locations().await?,
    }))
}

pub async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<ServiceRow>>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.store.list_services().await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TherapistQuery {
    pub service_id: Option<String>,
    pub location_id: Option<String>,
}

/// Therapists certified for `service_id` and working at `location_id`, when given.
pub async fn list_therapists(
    State(state): State<AppState>,
    Query(q): Query<TherapistQuery>,
) -> Result<Json<ApiOk<Vec<UserRow>>>, ApiError> {
    let filter = TherapistFilter {
        service_id: optional_uuid("service_id", q.service_id.as_deref())?,
        location_id: optional_uuid("location_id", q.location_id.as_deref())?,
    };

    Ok(Json(ApiOk {
        data: state.store.list_therapists(filter).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub location_id: Option<String>,
}

pub async fn list_availabilities(
    State(state): State<AppState>,
    Query(q): Query<AvailabilityQuery>,
) -> Result<Json<ApiOk<Vec<ShiftRow>>>, ApiError> {
    let filter = ShiftFilter {
        location_id: optional_uuid("location_id", q.location_id.as_deref())?,
        therapist_ids: None,
    };

    Ok(Json(ApiOk {
        data: state.store.list_shifts(&filter).await?,
    }))
}
