// src/store/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AppointmentRow, LocationRow, NewAppointment, ServiceRow, ShiftRow, UserRole, UserRow,
};
use crate::schedule::{BookingCandidate, ClinicClock, validate_booking};
use crate::store::seed::Dataset;
use crate::store::{
    AppointmentFilter, BookError, ScheduleStore, ShiftFilter, StoreError, TherapistFilter,
};

/// Process-local store. A single write guard spans validation and insert,
/// which serializes bookings across all therapists.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

fn contains(ids: &Option<Vec<Uuid>>, id: Uuid) -> bool {
    ids.as_ref().is_none_or(|ids| ids.contains(&id))
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn list_locations(&self) -> Result<Vec<LocationRow>, StoreError> {
        let mut out = self.data.read().await.locations.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_location(&self, location_id: Uuid) -> Result<Option<LocationRow>, StoreError> {
        let data = self.data.read().await;
        Ok(data.locations.iter().find(|l| l.location_id == location_id).cloned())
    }

    async fn list_services(&self) -> Result<Vec<ServiceRow>, StoreError> {
        let mut out = self.data.read().await.services.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_service(&self, service_id: Uuid) -> Result<Option<ServiceRow>, StoreError> {
        let data = self.data.read().await;
        Ok(data.services.iter().find(|s| s.service_id == service_id).cloned())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRow>, StoreError> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn list_therapists(&self, filter: TherapistFilter) -> Result<Vec<UserRow>, StoreError> {
        let data = self.data.read().await;

        let mut out: Vec<UserRow> = data
            .users
            .iter()
            .filter(|u| u.role == UserRole::Therapist)
            .filter(|u| {
                filter.service_id.is_none_or(|service_id| {
                    data.certifications
                        .iter()
                        .any(|c| c.user_id == u.user_id && c.service_id == service_id)
                })
            })
            .filter(|u| {
                filter.location_id.is_none_or(|location_id| {
                    data.shifts
                        .iter()
                        .any(|s| s.therapist_id == u.user_id && s.location_id == location_id)
                })
            })
            .cloned()
            .collect();

        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<ShiftRow>, StoreError> {
        let data = self.data.read().await;
        let mut out: Vec<ShiftRow> = data
            .shifts
            .iter()
            .filter(|s| filter.location_id.is_none_or(|l| s.location_id == l))
            .filter(|s| contains(&filter.therapist_ids, s.therapist_id))
            .cloned()
            .collect();
        out.sort_by_key(|s| (s.therapist_id, s.day_of_week, s.start_minute));
        Ok(out)
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentRow>, StoreError> {
        let data = self.data.read().await;
        let mut out: Vec<AppointmentRow> = data
            .appointments
            .iter()
            .filter(|a| filter.location_id.is_none_or(|l| a.location_id == l))
            .filter(|a| contains(&filter.therapist_ids, a.therapist_id))
            .filter(|a| filter.from.is_none_or(|from| a.end_at() > from))
            .filter(|a| filter.to.is_none_or(|to| a.start_at < to))
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.start_at, a.appointment_id));
        Ok(out)
    }

    async fn book(
        &self,
        new: NewAppointment,
        clock: &ClinicClock,
    ) -> Result<AppointmentRow, BookError> {
        let mut data = self.data.write().await;

        let candidate = BookingCandidate {
            therapist_id: new.therapist_id,
            location_id: new.location_id,
            start_at: new.start_at,
            duration_min: new.duration_min,
        };
        validate_booking(&candidate, &data.shifts, &data.appointments, clock)?;

        let row = new.into_row(Uuid::new_v4());
        data.appointments.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{AppointmentStatus, CertificationRow};
    use crate::schedule::BookingRejection;
    use crate::schedule::fixtures::{appointment, at, monday, shift};

    struct World {
        store: Arc<MemoryStore>,
        therapist: Uuid,
        location: Uuid,
        service: Uuid,
    }

    fn world() -> World {
        let (therapist, location, service) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let data = Dataset {
            users: vec![UserRow {
                user_id: therapist,
                name: "Therapist A".into(),
                role: UserRole::Therapist,
                specialization: None,
            }],
            certifications: vec![CertificationRow {
                user_id: therapist,
                service_id: service,
            }],
            shifts: vec![shift(therapist, location, 1, 540, 1020)],
            ..Dataset::default()
        };
        World {
            store: Arc::new(MemoryStore::new(data)),
            therapist,
            location,
            service,
        }
    }

    fn new_appointment(w: &World, minute: i32, duration_min: i32) -> NewAppointment {
        NewAppointment {
            start_at: at(monday(), minute),
            duration_min,
            patient_id: Uuid::new_v4(),
            therapist_id: w.therapist,
            service_id: w.service,
            location_id: w.location,
        }
    }

    #[tokio::test]
    async fn book_inserts_scheduled_appointment() {
        let w = world();
        let clock = ClinicClock::utc();

        let row = w.store.book(new_appointment(&w, 600, 60), &clock).await.unwrap();
        assert_eq!(row.status, AppointmentStatus::Scheduled);

        let all = w.store.list_appointments(&AppointmentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].appointment_id, row.appointment_id);
    }

    #[tokio::test]
    async fn book_rejects_without_writing() {
        let w = world();
        let clock = ClinicClock::utc();

        let err = w.store.book(new_appointment(&w, 1000, 60), &clock).await.unwrap_err();
        assert!(matches!(err, BookError::Rejected(BookingRejection::NotAvailable)));

        w.store.book(new_appointment(&w, 600, 60), &clock).await.unwrap();
        let err = w.store.book(new_appointment(&w, 630, 60), &clock).await.unwrap_err();
        assert!(matches!(err, BookError::Rejected(BookingRejection::DoubleBooked)));

        let all = w.store.list_appointments(&AppointmentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_bookings_admit_exactly_one() {
        let w = world();
        let clock = ClinicClock::utc();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = w.store.clone();
                let new = new_appointment(&w, 600, 60);
                tokio::spawn(async move { store.book(new, &clock).await })
            })
            .collect();

        let mut ok = 0;
        let mut double_booked = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(BookError::Rejected(BookingRejection::DoubleBooked)) => double_booked += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(double_booked, 7);
    }

    #[tokio::test]
    async fn therapist_filter_checks_certification_and_location() {
        let w = world();

        let by_service = TherapistFilter {
            service_id: Some(w.service),
            location_id: None,
        };
        assert_eq!(w.store.list_therapists(by_service).await.unwrap().len(), 1);

        let other_service = TherapistFilter {
            service_id: Some(Uuid::new_v4()),
            location_id: None,
        };
        assert!(w.store.list_therapists(other_service).await.unwrap().is_empty());

        let other_location = TherapistFilter {
            service_id: None,
            location_id: Some(Uuid::new_v4()),
        };
        assert!(w.store.list_therapists(other_location).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appointment_filter_uses_interval_intersection() {
        let w = world();
        {
            let mut data = w.store.data.write().await;
            data.appointments.extend([
                appointment(w.therapist, at(monday(), 1410), 60, AppointmentStatus::Scheduled),
                appointment(w.therapist, at(monday(), 600), 30, AppointmentStatus::Cancelled),
            ]);
        }

        // The late appointment spills past midnight into Tuesday.
        let tuesday = AppointmentFilter {
            from: Some(at(monday(), 1440)),
            to: Some(at(monday(), 2880)),
            ..AppointmentFilter::default()
        };
        let got = w.store.list_appointments(&tuesday).await.unwrap();
        assert_eq!(got.len(), 1);

        let monday_all = AppointmentFilter {
            from: Some(at(monday(), 0)),
            to: Some(at(monday(), 1440)),
            therapist_ids: Some(vec![w.therapist]),
            ..AppointmentFilter::default()
        };
        let got = w.store.list_appointments(&monday_all).await.unwrap();
        assert_eq!(got.len(), 2);
        assert!(got[0].start_at < got[1].start_at);
    }
}
