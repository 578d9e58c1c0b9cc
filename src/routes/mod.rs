use crate::{error::ApiError, models::AppState};
use axum::Router;
use chrono::NaiveDate;
use uuid::Uuid;

pub mod appointment_routes;
pub mod catalog_routes;
pub mod slot_routes;

pub fn router(state: AppState) -> Router {
    let api = catalog_routes::router()
        .merge(slot_routes::router())
        .merge(appointment_routes::router());

    Router::new().nest("/api/v1", api).with_state(state)
}

/* ============================================================
   Query param helpers: everything arrives as optional strings so
   missing and malformed fields both map to INVALID_REQUEST.
   ============================================================ */

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn required<'a>(name: &str, raw: Option<&'a str>) -> Result<&'a str, ApiError> {
    present(raw).ok_or_else(|| ApiError::invalid_request(format!("{name} is required")))
}

pub(crate) fn parse_uuid(name: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_request(format!("{name} must be a UUID")))
}

pub(crate) fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_request(format!("{name} must be YYYY-MM-DD")))
}

pub(crate) fn optional_uuid(name: &str, raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    present(raw).map(|s| parse_uuid(name, s)).transpose()
}

pub(crate) fn optional_date(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    present(raw).map(|s| parse_date(name, s)).transpose()
}

pub(crate) fn optional_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    match present(raw) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(_) => Err(ApiError::invalid_request(format!("{name} must be true or false"))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_params_count_as_missing() {
        assert!(required("x", Some("  ")).is_err());
        assert!(required("x", None).is_err());
        assert_eq!(required("x", Some(" a ")).unwrap(), "a");
        assert_eq!(optional_uuid("x", Some("")).unwrap(), None);
    }

    #[test]
    fn malformed_params_are_rejected() {
        assert!(parse_uuid("x", "42").is_err());
        assert!(parse_date("x", "2025-13-01").is_err());
        assert!(optional_bool("x", Some("yes")).is_err());
        assert_eq!(optional_bool("x", Some("true")).unwrap(), Some(true));
        assert_eq!(optional_date("x", None).unwrap(), None);
    }
}
