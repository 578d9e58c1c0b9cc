use std::collections::BTreeSet;
use std::env;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::schedule::slots::DEFAULT_CADENCE_MIN;

#[derive(Clone, Debug)]
pub struct Config {
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub clinic_timezone: Tz,
    pub slot_cadence_min: i32,
    pub max_slot_range_days: i64,
    pub closed_dates: BTreeSet<NaiveDate>,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let clinic_timezone =
            parse_timezone(&env::var("CLINIC_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()))?;

        let slot_cadence_min = env::var("SLOT_CADENCE_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_CADENCE_MIN);
        let max_slot_range_days = env::var("MAX_SLOT_RANGE_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(31);

        let closed_dates =
            parse_closed_dates(&env::var("CLINIC_CLOSED_DATES").unwrap_or_default())?;

        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(database_url.is_none());

        Ok(Self {
            database_url,
            bind_addr,
            clinic_timezone,
            slot_cadence_min,
            max_slot_range_days,
            closed_dates,
            seed_demo_data,
        })
    }
}

fn parse_timezone(raw: &str) -> anyhow::Result<Tz> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("CLINIC_TIMEZONE: {e}"))
}

fn parse_closed_dates(raw: &str) -> anyhow::Result<BTreeSet<NaiveDate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("CLINIC_CLOSED_DATES: invalid date {s:?}"))
        })
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
