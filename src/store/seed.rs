// src/store/seed.rs

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::models::{
    AppointmentRow, AppointmentStatus, CertificationRow, LocationRow, ServiceRow, ShiftRow,
    UserRole, UserRow,
};
use crate::schedule::ClinicClock;

/// Full contents of a schedule store. Used to seed both backends.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub locations: Vec<LocationRow>,
    pub services: Vec<ServiceRow>,
    pub users: Vec<UserRow>,
    pub certifications: Vec<CertificationRow>,
    pub shifts: Vec<ShiftRow>,
    pub appointments: Vec<AppointmentRow>,
}

fn location(name: &str, address: &str) -> LocationRow {
    LocationRow {
        location_id: Uuid::new_v4(),
        name: name.into(),
        address: address.into(),
    }
}

fn service(name: &str, duration_min: i32, cost_cents: i32) -> ServiceRow {
    ServiceRow {
        service_id: Uuid::new_v4(),
        name: name.into(),
        duration_min,
        cost_cents,
    }
}

fn user(name: String, role: UserRole, specialization: Option<&str>) -> UserRow {
    UserRow {
        user_id: Uuid::new_v4(),
        name,
        role,
        specialization: specialization.map(str::to_string),
    }
}

fn weekly(
    therapist: &UserRow,
    location: &LocationRow,
    days: &[i16],
    start_minute: i32,
    end_minute: i32,
) -> Vec<ShiftRow> {
    days.iter()
        .map(|&day_of_week| ShiftRow {
            shift_id: Uuid::new_v4(),
            therapist_id: therapist.user_id,
            location_id: location.location_id,
            day_of_week,
            start_minute,
            end_minute,
        })
        .collect()
}

/// Demo clinic: two locations, three services, three therapists with weekly
/// shifts, five patients and a handful of appointments during next week
/// (relative to `today`).
pub fn demo(clock: &ClinicClock, today: NaiveDate) -> Dataset {
    let downtown = location("Downtown", "123 Main St");
    let westside = location("Westside", "456 West Ave");

    let assessment = service("Initial Assessment", 60, 15000);
    let massage = service("Massage", 45, 10000);
    let needling = service("Dry Needling", 30, 8000);

    let therapist_a = user("Therapist A".into(), UserRole::Therapist, Some("General"));
    let therapist_b = user("Therapist B".into(), UserRole::Therapist, Some("Massage"));
    let therapist_c = user("Therapist C".into(), UserRole::Therapist, Some("Sports"));
    let patients: Vec<UserRow> = (1..=5)
        .map(|i| user(format!("Patient {i}"), UserRole::Patient, None))
        .collect();

    let certifications = [
        (&therapist_a, &assessment),
        (&therapist_a, &massage),
        (&therapist_a, &needling),
        (&therapist_b, &massage),
        (&therapist_c, &assessment),
        (&therapist_c, &needling),
    ]
    .into_iter()
    .map(|(t, s)| CertificationRow {
        user_id: t.user_id,
        service_id: s.service_id,
    })
    .collect();

    let mut shifts = weekly(&therapist_a, &downtown, &[1, 2, 3, 4, 5], 540, 1020);
    shifts.extend(weekly(&therapist_b, &westside, &[2, 3, 4], 600, 1080));
    shifts.extend(weekly(&therapist_c, &downtown, &[0, 6], 600, 900));

    // Sunday that starts next week; offsets below are days from it.
    let next_week = today + Duration::days(7);
    let sunday = next_week - Duration::days(next_week.weekday().num_days_from_sunday() as i64);

    let bookings = [
        (&therapist_a, &patients[0], &assessment, &downtown, 1, 10, AppointmentStatus::Scheduled),
        (&therapist_a, &patients[1], &massage, &downtown, 1, 13, AppointmentStatus::Scheduled),
        (&therapist_a, &patients[2], &needling, &downtown, 3, 11, AppointmentStatus::Completed),
        (&therapist_a, &patients[3], &assessment, &downtown, 5, 14, AppointmentStatus::Scheduled),
        (&therapist_b, &patients[4], &massage, &westside, 2, 10, AppointmentStatus::Scheduled),
        (&therapist_b, &patients[0], &massage, &westside, 2, 12, AppointmentStatus::Scheduled),
        (&therapist_b, &patients[1], &massage, &westside, 4, 15, AppointmentStatus::Cancelled),
        (&therapist_c, &patients[2], &assessment, &downtown, 6, 10, AppointmentStatus::Scheduled),
        (&therapist_c, &patients[3], &needling, &downtown, 0, 11, AppointmentStatus::Scheduled),
        (&therapist_c, &patients[4], &needling, &downtown, 6, 12, AppointmentStatus::Completed),
    ];

    let appointments = bookings
        .into_iter()
        .filter_map(|(t, p, s, l, day, hour, status)| {
            let start_at = clock.at_minute(sunday + Duration::days(day), hour * 60)?;
            Some(AppointmentRow {
                appointment_id: Uuid::new_v4(),
                start_at,
                duration_min: s.duration_min,
                status,
                patient_id: p.user_id,
                therapist_id: t.user_id,
                service_id: s.service_id,
                location_id: l.location_id,
            })
        })
        .collect();

    let mut users = vec![therapist_a, therapist_b, therapist_c];
    users.extend(patients);

    Dataset {
        locations: vec![downtown, westside],
        services: vec![assessment, massage, needling],
        users,
        certifications,
        shifts,
        appointments,
    }
}
