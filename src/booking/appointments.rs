//! Appointment booking lifecycle
//!
//! State machine per appointment: confirmed → cancelled (terminal).
//! Cancellation is soft; appointment history is never deleted.
//!
//! There is deliberately no double-booking check: this is a walk-in/queue
//! model, not a strict calendar, and a user may hold overlapping confirmed
//! appointments at any number of facilities.

use crate::auth::AuthManager;
use crate::store::types::{Appointment, AppointmentStatus, Facility};
use crate::store::PersistentStore;
use crate::util;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Ticket number prefix for appointments
pub const APPOINTMENT_TICKET_PREFIX: &str = "TICKET-";

/// Estimated minutes of waiting per person ahead in the queue
pub const WAIT_MINUTES_PER_PERSON: u64 = 15;

const SLOT_WINDOW_DAYS: i64 = 7;
const SLOT_OPEN_HOUR: u32 = 8;
const SLOT_CLOSE_HOUR: u32 = 18;
const SLOT_STEP_MINUTES: u32 = 30;

/// Errors that can occur while booking or cancelling appointments
#[derive(Debug, Error)]
pub enum BookingError {
    /// No signed-in user and no explicit user id
    #[error("Sign in to book an appointment")]
    NotAuthenticated,

    /// The facility id does not resolve
    #[error("Facility not found")]
    FacilityNotFound,

    /// The facility does not offer the requested service
    #[error("Service not available at this facility")]
    ServiceUnavailable,

    /// No appointment with that id owned by that user
    #[error("Appointment not found")]
    AppointmentNotFound,
}

/// Queue statistics for a facility
#[derive(Debug, Clone, PartialEq)]
pub struct WaitingStats {
    /// Confirmed future appointments at the facility
    pub total_in_queue: usize,
    /// `total_in_queue` × [`WAIT_MINUTES_PER_PERSON`]
    pub estimated_wait_minutes: u64,
    /// First free slot from the deterministic generator
    pub next_available: Option<DateTime<Utc>>,
}

/// Appointment search views and the booking state machine
pub struct AppointmentManager {
    store: Arc<PersistentStore>,
    auth: Arc<AuthManager>,
}

impl AppointmentManager {
    pub fn new(store: Arc<PersistentStore>, auth: Arc<AuthManager>) -> Self {
        Self { store, auth }
    }

    /// Book a confirmed appointment
    ///
    /// `user_id` falls back to the current session. The appointment records a
    /// denormalized snapshot of the facility name, a generated ticket number,
    /// and an opaque QR reference. When the booking user is the session user,
    /// the appointment id is appended to their back-reference list.
    pub async fn book_appointment(
        &self,
        facility_id: u32,
        service: &str,
        date_time: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let session_id = self.auth.current_user().await.map(|u| u.id);
        let user_id = match user_id {
            Some(id) => id.to_string(),
            None => session_id.clone().ok_or(BookingError::NotAuthenticated)?,
        };

        let facility = self
            .store
            .read(|s| s.facility_by_id(facility_id).cloned())
            .await
            .ok_or(BookingError::FacilityNotFound)?;
        if !facility.offers(service) {
            return Err(BookingError::ServiceUnavailable);
        }

        let ticket_number = util::ticket_number(APPOINTMENT_TICKET_PREFIX);
        let appointment = Appointment {
            id: util::generate_id(),
            facility_id,
            facility_name: facility.name.clone(),
            service: service.to_string(),
            date_time,
            user_id: user_id.clone(),
            status: AppointmentStatus::Confirmed,
            qr_code_url: util::qr_code_url(&ticket_number),
            ticket_number,
            created_at: Utc::now(),
            cancelled_at: None,
        };

        let for_session_user = session_id.as_deref() == Some(user_id.as_str());
        self.store
            .update(|s| {
                s.appointments.push(appointment.clone());
                if for_session_user {
                    if let Some(user) = s.user_by_id_mut(&user_id) {
                        user.appointments.push(appointment.id.clone());
                    }
                }
            })
            .await;
        if for_session_user {
            self.auth.refresh().await;
        }

        tracing::info!(
            appointment_id = %appointment.id,
            facility = %facility.name,
            service,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Soft-cancel an appointment owned by `user_id`
    ///
    /// Cancelling an already-cancelled appointment still succeeds and
    /// re-stamps `cancelled_at`.
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        user_id: &str,
    ) -> Result<Appointment, BookingError> {
        let cancelled_at = Utc::now();
        // Lookup and transition run in one closure under the write lock
        let result = self
            .store
            .update_if(|s| {
                match s
                    .appointments
                    .iter_mut()
                    .find(|a| a.id == appointment_id && a.user_id == user_id)
                {
                    Some(appointment) => {
                        appointment.status = AppointmentStatus::Cancelled;
                        appointment.cancelled_at = Some(cancelled_at);
                        (true, Ok(appointment.clone()))
                    }
                    None => (false, Err(BookingError::AppointmentNotFound)),
                }
            })
            .await;

        if let Ok(appointment) = &result {
            tracing::info!(appointment_id = %appointment.id, "appointment cancelled");
        }
        result
    }

    /// All appointments for a user, most recent `date_time` first
    pub async fn get_user_appointments(&self, user_id: &str) -> Vec<Appointment> {
        let mut appointments = self
            .store
            .read(|s| {
                s.appointments
                    .iter()
                    .filter(|a| a.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        appointments.sort_by(|a, b| b.date_time.cmp(&a.date_time));
        appointments
    }

    /// Queue statistics for a facility
    pub async fn get_waiting_stats(&self, facility_id: u32) -> WaitingStats {
        let now = Utc::now();
        let total_in_queue = self
            .store
            .read(|s| {
                s.appointments
                    .iter()
                    .filter(|a| {
                        a.facility_id == facility_id
                            && a.status == AppointmentStatus::Confirmed
                            && a.date_time >= now
                    })
                    .count()
            })
            .await;

        WaitingStats {
            total_in_queue,
            estimated_wait_minutes: total_in_queue as u64 * WAIT_MINUTES_PER_PERSON,
            next_available: self.get_next_available_slot(facility_id),
        }
    }

    /// First 30-minute slot strictly after now, within the daily operating
    /// window, over the next seven days
    ///
    /// A presentation heuristic: the generator ignores existing bookings and
    /// is not a capacity check.
    pub fn get_next_available_slot(&self, _facility_id: u32) -> Option<DateTime<Utc>> {
        next_slot_after(Utc::now())
    }

    /// Facilities matching a free-text query against name, address, or any
    /// offered service; an empty query returns the whole catalog
    pub async fn search_facilities(&self, query: &str) -> Vec<Facility> {
        let query = query.trim().to_string();
        self.store
            .read(|s| {
                if query.is_empty() {
                    s.facilities.clone()
                } else {
                    s.facilities
                        .iter()
                        .filter(|f| f.matches_query(&query))
                        .cloned()
                        .collect()
                }
            })
            .await
    }

    /// Facilities offering the exact named service
    pub async fn filter_by_service(&self, service: &str) -> Vec<Facility> {
        self.store
            .read(|s| {
                s.facilities
                    .iter()
                    .filter(|f| f.offers(service))
                    .cloned()
                    .collect()
            })
            .await
    }
}

/// Enumerate fixed slots and return the first one strictly after `now`
fn next_slot_after(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    for day in 0..SLOT_WINDOW_DAYS {
        let date = today + Duration::days(day);
        for hour in SLOT_OPEN_HOUR..SLOT_CLOSE_HOUR {
            for minute in (0..60).step_by(SLOT_STEP_MINUTES as usize) {
                let slot = Utc.from_utc_datetime(&date.and_hms_opt(hour, minute, 0)?);
                if slot > now {
                    return Some(slot);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SignupData;
    use crate::catalog::FacilityCatalog;
    use crate::store::types::User;
    use crate::store::StoreConfig;
    use crate::sync::ChangeBus;
    use tempfile::tempdir;

    struct Fixture {
        store: Arc<PersistentStore>,
        auth: Arc<AuthManager>,
        manager: AppointmentManager,
        user: User,
        bus: ChangeBus,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let bus = ChangeBus::default();
        let store = Arc::new(
            PersistentStore::open(StoreConfig::new(dir.path()), bus.clone()).unwrap(),
        );
        FacilityCatalog::new(Arc::clone(&store))
            .seed_defaults()
            .await;

        let auth = Arc::new(AuthManager::attach(Arc::clone(&store)).await);
        let user = auth
            .signup(SignupData {
                email: "a@b.com".to_string(),
                password: "secret1".to_string(),
                full_name: "Awa Diop".to_string(),
                phone: None,
            })
            .await
            .unwrap();

        let manager = AppointmentManager::new(Arc::clone(&store), Arc::clone(&auth));
        Fixture {
            store,
            auth,
            manager,
            user,
            bus,
            _dir: dir,
        }
    }

    fn june_first() -> DateTime<Utc> {
        "2025-06-01T09:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_book_appointment() {
        let fx = fixture().await;

        let appointment = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.facility_name, "Hôpital Principal de Dakar");
        assert_eq!(appointment.user_id, fx.user.id);
        assert!(appointment.ticket_number.starts_with(APPOINTMENT_TICKET_PREFIX));
        assert_eq!(
            appointment.qr_code_url,
            format!("qr://verify/{}", appointment.ticket_number)
        );

        // Back-reference lands on the stored user and the session cache
        let stored = fx.store.snapshot().await;
        assert_eq!(
            stored.user_by_id(&fx.user.id).unwrap().appointments,
            vec![appointment.id.clone()]
        );
        assert_eq!(
            fx.auth.current_user().await.unwrap().appointments,
            vec![appointment.id]
        );
    }

    #[tokio::test]
    async fn test_book_unknown_facility() {
        let fx = fixture().await;
        let result = fx
            .manager
            .book_appointment(9999, "Consultation Générale", june_first(), None)
            .await;
        assert!(matches!(result, Err(BookingError::FacilityNotFound)));
    }

    #[tokio::test]
    async fn test_book_service_not_offered() {
        let fx = fixture().await;
        // Facility 1 has no cardiology department
        let result = fx
            .manager
            .book_appointment(1, "Cardiologie", june_first(), None)
            .await;
        assert!(matches!(result, Err(BookingError::ServiceUnavailable)));
    }

    #[tokio::test]
    async fn test_book_requires_effective_user() {
        let fx = fixture().await;
        fx.auth.logout().await;

        let result = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await;
        assert!(matches!(result, Err(BookingError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_book_for_other_user_skips_session_back_reference() {
        let fx = fixture().await;

        let appointment = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), Some("someone-else"))
            .await
            .unwrap();

        assert_eq!(appointment.user_id, "someone-else");
        assert!(fx
            .auth
            .current_user()
            .await
            .unwrap()
            .appointments
            .is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_bookings_are_allowed() {
        let fx = fixture().await;

        fx.manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();
        fx.manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();

        assert_eq!(fx.manager.get_user_appointments(&fx.user.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_book_and_cancel_end_to_end() {
        let fx = fixture().await;

        let appointment = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);

        let listed = fx.manager.get_user_appointments(&fx.user.id).await;
        assert!(listed.iter().any(|a| a.id == appointment.id));

        let cancelled = fx
            .manager
            .cancel_appointment(&appointment.id, &fx.user.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        // History is retained, but nothing is confirmed anymore
        let listed = fx.manager.get_user_appointments(&fx.user.id).await;
        assert!(listed.iter().any(|a| a.id == appointment.id));
        assert_eq!(
            listed
                .iter()
                .filter(|a| a.status == AppointmentStatus::Confirmed)
                .count(),
            0
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_appointment() {
        let fx = fixture().await;

        let result = fx.manager.cancel_appointment("missing", &fx.user.id).await;
        assert!(matches!(result, Err(BookingError::AppointmentNotFound)));
    }

    #[tokio::test]
    async fn test_cancel_scoped_to_owner() {
        let fx = fixture().await;
        let appointment = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();

        let result = fx
            .manager
            .cancel_appointment(&appointment.id, "someone-else")
            .await;
        assert!(matches!(result, Err(BookingError::AppointmentNotFound)));
    }

    #[tokio::test]
    async fn test_rejected_cancel_does_not_publish_a_change() {
        let fx = fixture().await;

        let mut notices = fx.bus.subscribe();
        let _ = fx.manager.cancel_appointment("missing", &fx.user.id).await;
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_double_cancel_succeeds_and_restamps() {
        let fx = fixture().await;
        let appointment = fx
            .manager
            .book_appointment(1, "Consultation Générale", june_first(), None)
            .await
            .unwrap();

        let first = fx
            .manager
            .cancel_appointment(&appointment.id, &fx.user.id)
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        let second = fx
            .manager
            .cancel_appointment(&appointment.id, &fx.user.id)
            .await
            .unwrap();

        assert_eq!(second.status, AppointmentStatus::Cancelled);
        assert!(second.cancelled_at.unwrap() >= first.cancelled_at.unwrap());
    }

    #[tokio::test]
    async fn test_appointments_ordered_by_date_descending() {
        let fx = fixture().await;

        for offset in [2, 0, 1] {
            fx.manager
                .book_appointment(
                    1,
                    "Consultation Générale",
                    june_first() + Duration::days(offset),
                    None,
                )
                .await
                .unwrap();
        }

        let listed = fx.manager.get_user_appointments(&fx.user.id).await;
        assert_eq!(listed.len(), 3);
        assert!(listed[0].date_time > listed[1].date_time);
        assert!(listed[1].date_time > listed[2].date_time);
    }

    #[tokio::test]
    async fn test_waiting_stats_counts_confirmed_future_only() {
        let fx = fixture().await;
        let future = Utc::now() + Duration::days(1);
        let past = Utc::now() - Duration::days(1);

        fx.manager
            .book_appointment(1, "Consultation Générale", future, None)
            .await
            .unwrap();
        let to_cancel = fx
            .manager
            .book_appointment(1, "Urgences", future, None)
            .await
            .unwrap();
        fx.manager
            .cancel_appointment(&to_cancel.id, &fx.user.id)
            .await
            .unwrap();
        fx.manager
            .book_appointment(1, "Consultation Générale", past, None)
            .await
            .unwrap();
        // Different facility does not count
        fx.manager
            .book_appointment(2, "Pédiatrie", future, None)
            .await
            .unwrap();

        let stats = fx.manager.get_waiting_stats(1).await;
        assert_eq!(stats.total_in_queue, 1);
        assert_eq!(stats.estimated_wait_minutes, WAIT_MINUTES_PER_PERSON);
        assert!(stats.next_available.is_some());
    }

    #[tokio::test]
    async fn test_search_facilities() {
        let fx = fixture().await;

        let all = fx.manager.search_facilities("").await;
        assert_eq!(all.len(), 10);

        let by_name = fx.manager.search_facilities("fann").await;
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 2);

        let by_address = fx.manager.search_facilities("thiès").await;
        assert!(by_address.iter().any(|f| f.id == 5));

        let by_service = fx.manager.search_facilities("maternité").await;
        assert!(by_service.iter().all(|f| f
            .services
            .iter()
            .any(|s| s.to_lowercase().contains("maternité"))));

        assert!(fx.manager.search_facilities("zzz").await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_by_service() {
        let fx = fixture().await;

        let pediatrics = fx.manager.filter_by_service("Pédiatrie").await;
        assert!(!pediatrics.is_empty());
        assert!(pediatrics.iter().all(|f| f.offers("Pédiatrie")));

        assert!(fx.manager.filter_by_service("Astrologie").await.is_empty());
    }

    #[test]
    fn test_next_slot_rounds_up_within_day() {
        let now = "2025-06-01T09:10:00Z".parse().unwrap();
        let slot = next_slot_after(now).unwrap();
        assert_eq!(slot, "2025-06-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_next_slot_before_opening() {
        let now = "2025-06-01T05:00:00Z".parse().unwrap();
        let slot = next_slot_after(now).unwrap();
        assert_eq!(slot, "2025-06-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_next_slot_after_closing_moves_to_next_day() {
        let now = "2025-06-01T17:45:00Z".parse().unwrap();
        let slot = next_slot_after(now).unwrap();
        assert_eq!(slot, "2025-06-02T08:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_slot_is_strictly_after_now() {
        let now = "2025-06-01T09:30:00Z".parse().unwrap();
        let slot = next_slot_after(now).unwrap();
        assert!(slot > now);
        assert_eq!(slot, "2025-06-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
