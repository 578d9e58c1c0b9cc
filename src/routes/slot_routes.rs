// src/routes/slot_routes.rs

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{ApiOk, AppState, UserRole},
    routes::{optional_bool, optional_uuid, parse_date, parse_uuid, required},
    schedule::{Interval, Slot, SlotRules, WeeklyAvailability, generate_slots, group_by_day},
    store::{AppointmentFilter, ShiftFilter, TherapistFilter},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/slots", get(get_slots))
}

/* ============================================================
   DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub location_id: Option<String>,
    pub service_id: Option<String>,
    // YYYY-MM-DD, clinic-local, inclusive
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub therapist_id: Option<String>,
    pub detailed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotDto {
    /// Epoch seconds.
    pub time: i64,
    pub therapist_ids: Vec<Uuid>,
}

/// Plain start times are the detailed list with the therapists dropped.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SlotList {
    Times(Vec<i64>),
    Detailed(Vec<SlotDto>),
}

impl SlotList {
    fn from_slots(slots: Vec<Slot>, detailed: bool) -> Self {
        if detailed {
            SlotList::Detailed(
                slots
                    .into_iter()
                    .map(|s| SlotDto {
                        time: s.start_at.timestamp(),
                        therapist_ids: s.therapist_ids,
                    })
                    .collect(),
            )
        } else {
            SlotList::Times(slots.into_iter().map(|s| s.start_at.timestamp()).collect())
        }
    }
}

/* ============================================================
   GET /slots
   ============================================================ */

pub async fn get_slots(
    State(state): State<AppState>,
    Query(q): Query<SlotQuery>,
) -> Result<Json<ApiOk<BTreeMap<String, SlotList>>>, ApiError> {
    let location_id =
        parse_uuid("location_id", required("location_id", q.location_id.as_deref())?)?;
    let service_id = parse_uuid("service_id", required("service_id", q.service_id.as_deref())?)?;
    let start = parse_date("start_date", required("start_date", q.start_date.as_deref())?)?;
    let end = parse_date("end_date", required("end_date", q.end_date.as_deref())?)?;
    let therapist_id = optional_uuid("therapist_id", q.therapist_id.as_deref())?;
    let detailed = optional_bool("detailed", q.detailed.as_deref())?.unwrap_or(false);

    if end < start {
        return Err(ApiError::invalid_request("end_date must not be before start_date"));
    }
    let days = (end - start).num_days() + 1;
    if days > state.max_slot_range_days {
        return Err(ApiError::invalid_request(format!(
            "date range must not exceed {} days",
            state.max_slot_range_days
        )));
    }

    let service = state
        .store
        .find_service(service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("service"))?;
    state
        .store
        .find_location(location_id)
        .await?
        .ok_or_else(|| ApiError::not_found("location"))?;

    let rules = SlotRules::new(service.duration_min, state.slot_cadence_min)?;

    let therapist_ids: Vec<Uuid> = match therapist_id {
        Some(id) => {
            let user = state.store.find_user(id).await?;
            if !user.is_some_and(|u| u.role == UserRole::Therapist) {
                return Err(ApiError::not_found("therapist"));
            }
            vec![id]
        }
        None => state
            .store
            .list_therapists(TherapistFilter {
                service_id: Some(service_id),
                location_id: Some(location_id),
            })
            .await?
            .into_iter()
            .map(|u| u.user_id)
            .collect(),
    };

    let mut by_day = open_slots(&state, location_id, &therapist_ids, &rules, start, end).await?;

    // Every requested date gets a key, even when nothing is open.
    let data = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| {
            let slots = by_day.remove(&d).unwrap_or_default();
            (d.format("%Y-%m-%d").to_string(), SlotList::from_slots(slots, detailed))
        })
        .collect();

    tracing::debug!(
        %location_id,
        %service_id,
        therapists = therapist_ids.len(),
        %start,
        %end,
        "slots computed"
    );

    Ok(Json(ApiOk { data }))
}

/// Projects shifts over `[start, end]`, generates slots against the current
/// appointments and buckets them by clinic-local day.
async fn open_slots(
    state: &AppState,
    location_id: Uuid,
    therapist_ids: &[Uuid],
    rules: &SlotRules,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<NaiveDate, Vec<Slot>>, ApiError> {
    if therapist_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let shifts = state
        .store
        .list_shifts(&ShiftFilter {
            location_id: Some(location_id),
            therapist_ids: Some(therapist_ids.to_vec()),
        })
        .await?;

    let (from, _) = state
        .clock
        .day_bounds(start)
        .ok_or_else(|| ApiError::invalid_request("start_date out of range"))?;
    let (_, to) = state
        .clock
        .day_bounds(end)
        .ok_or_else(|| ApiError::invalid_request("end_date out of range"))?;

    // Widened by a day each side for appointments crossing midnight.
    let appointments = state
        .store
        .list_appointments(&AppointmentFilter {
            location_id: None,
            therapist_ids: Some(therapist_ids.to_vec()),
            from: Some(from - Duration::days(1)),
            to: Some(to + Duration::days(1)),
        })
        .await?;

    let weekly = WeeklyAvailability::from_shifts(&shifts)
        .with_closures(state.closed_dates.iter().copied());
    let intervals: Vec<Interval> = weekly
        .project_range(start, end, &state.clock)
        .into_values()
        .flatten()
        .collect();

    let slots = generate_slots(&intervals, rules, &appointments);
    Ok(group_by_day(slots, &state.clock))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chrono::{DateTime, Utc};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::models::AppointmentStatus;
    use crate::routes::router;
    use crate::routes::test_support::{clinic, get, json_body, state};
    use crate::schedule::fixtures::{appointment, at, monday};

    fn minutes(body: &serde_json::Value, day: &str) -> Vec<i64> {
        let midnight = at(monday(), 0).timestamp();
        body["data"][day]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| (v.as_i64().unwrap() - midnight) / 60)
            .collect()
    }

    #[tokio::test]
    async fn any_therapist_mode_merges_and_keys_every_day() {
        let c = clinic();
        let app = router(state(c.data));

        let uri = format!(
            "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-01&end_date=2025-06-03",
            c.location, c.service
        );
        let response = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        let days: Vec<&String> = body["data"].as_object().unwrap().keys().collect();
        assert_eq!(days, vec!["2025-06-01", "2025-06-02", "2025-06-03"]);
        assert!(body["data"]["2025-06-01"].as_array().unwrap().is_empty());
        assert!(body["data"]["2025-06-03"].as_array().unwrap().is_empty());

        let expected: Vec<i64> = (540..=960).step_by(30).collect();
        assert_eq!(minutes(&body, "2025-06-02"), expected);
    }

    #[tokio::test]
    async fn detailed_mode_lists_eligible_therapists() {
        let c = clinic();
        let mut data = c.data;
        data.appointments
            .push(appointment(c.therapist_a, at(monday(), 600), 60, AppointmentStatus::Scheduled));
        let app = router(state(data));

        let uri = format!(
            "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02&detailed=true",
            c.location, c.service
        );
        let body = json_body(app.oneshot(get(&uri)).await.unwrap()).await;
        let slots = body["data"]["2025-06-02"].as_array().unwrap();

        let at_600 = slots
            .iter()
            .find(|s| s["time"].as_i64() == Some(at(monday(), 600).timestamp()))
            .unwrap();
        // A is booked at 10:00; only B remains.
        assert_eq!(at_600["therapist_ids"], serde_json::json!([c.therapist_b.to_string()]));

        let at_540 = slots
            .iter()
            .find(|s| s["time"].as_i64() == Some(at(monday(), 540).timestamp()))
            .unwrap();
        assert_eq!(at_540["therapist_ids"], serde_json::json!([c.therapist_a.to_string()]));

        // 09:30 is blocked for A and outside B's shift.
        assert!(!slots.iter().any(|s| s["time"].as_i64() == Some(at(monday(), 570).timestamp())));
    }

    #[tokio::test]
    async fn single_therapist_mode() {
        let c = clinic();
        let app = router(state(c.data));

        let uri = format!(
            "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02&therapist_id={}",
            c.location, c.service, c.therapist_b
        );
        let body = json_body(app.oneshot(get(&uri)).await.unwrap()).await;
        assert_eq!(minutes(&body, "2025-06-02"), vec![600, 630, 660]);
    }

    #[tokio::test]
    async fn closed_dates_offer_nothing() {
        let c = clinic();
        let mut st = state(c.data);
        st.closed_dates = Arc::new(BTreeSet::from([monday()]));
        let app = router(st);

        let uri = format!(
            "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02",
            c.location, c.service
        );
        let body = json_body(app.oneshot(get(&uri)).await.unwrap()).await;
        assert!(body["data"]["2025-06-02"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_or_bad_params() {
        let c = clinic();
        let app = router(state(c.data));

        for uri in [
            format!(
                "/api/v1/slots?service_id={}&start_date=2025-06-02&end_date=2025-06-02",
                c.service
            ),
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02",
                c.location, c.service
            ),
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-03&end_date=2025-06-02",
                c.location, c.service
            ),
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-01&end_date=2025-09-01",
                c.location, c.service
            ),
            format!(
                "/api/v1/slots?location_id=nope&service_id={}&start_date=2025-06-02&end_date=2025-06-02",
                c.service
            ),
        ] {
            let response = app.clone().oneshot(get(&uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"]["code"], "INVALID_REQUEST");
        }
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        let c = clinic();
        let app = router(state(c.data));

        for uri in [
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02",
                c.location,
                Uuid::new_v4()
            ),
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02",
                Uuid::new_v4(),
                c.service
            ),
            format!(
                "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02&therapist_id={}",
                c.location, c.service, c.patient
            ),
        ] {
            let response = app.clone().oneshot(get(&uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn appointment_from_previous_evening_blocks_morning() {
        let c = clinic();
        let mut data = c.data;
        // Sunday 23:00 for 11 hours runs into Monday 10:00.
        let sunday_late: DateTime<Utc> = at(monday(), -60);
        data.appointments
            .push(appointment(c.therapist_a, sunday_late, 660, AppointmentStatus::Scheduled));
        let app = router(state(data));

        let uri = format!(
            "/api/v1/slots?location_id={}&service_id={}&start_date=2025-06-02&end_date=2025-06-02&therapist_id={}",
            c.location, c.service, c.therapist_a
        );
        let body = json_body(app.oneshot(get(&uri)).await.unwrap()).await;
        assert_eq!(minutes(&body, "2025-06-02").first(), Some(&600));
    }
}
