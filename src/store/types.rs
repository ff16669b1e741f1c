//! Core data types for the mediqueue store
//!
//! This module defines the entities held by the single persisted blob:
//! - `Store`: the root record owning every collection
//! - `Facility` and `Service`: seeded, read-only reference data
//! - `User`: the account directory plus per-user back-reference lists
//! - `Appointment` and `Ticket`: the two lifecycle records
//!
//! Cross-entity links are id-based weak references resolved by lookup at
//! read time; no entity holds a strong reference to another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The root record holding all collections
///
/// Serialized as one JSON blob; the whole value is read and written
/// atomically from the caller's point of view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Store {
    pub facilities: Vec<Facility>,
    pub services: Vec<Service>,
    pub users: Vec<User>,
    /// Id of the signed-in user, if any; must reference an entry in `users`
    pub current_user_id: Option<String>,
    pub appointments: Vec<Appointment>,
    pub tickets: Vec<Ticket>,
}

impl Store {
    pub fn facility_by_id(&self, id: u32) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_by_id_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// Case-sensitive match on the stored email
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// The user referenced by `current_user_id`, if both exist
    pub fn current_user(&self) -> Option<&User> {
        self.current_user_id
            .as_deref()
            .and_then(|id| self.user_by_id(id))
    }
}

/// Geographic coordinates of a facility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A medical facility offering services
///
/// Reference data: immutable after seeding, read-only to all managers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Names of the services this facility offers
    pub services: Vec<String>,
    pub description: String,
    pub location: GeoPoint,
    /// Typical walk-in waiting time in minutes
    pub waiting_time: u32,
    pub rating: f64,
    /// Day name → opening hours display string (e.g. "08:00 - 18:00", "24/7")
    pub opening_hours: BTreeMap<String, String>,
    /// Base consultation price in CFA francs
    pub price: u32,
    pub capacity: String,
}

impl Facility {
    /// Whether this facility offers the named service (exact match)
    pub fn offers(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }

    /// Case-insensitive match against name, address, or any offered service
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.address.to_lowercase().contains(&query)
            || self
                .services
                .iter()
                .any(|s| s.to_lowercase().contains(&query))
    }
}

/// A catalog service entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: u32,
    pub name: String,
    /// Price in CFA francs
    pub price: u32,
    /// Display duration (e.g. "30 min", "Immédiat")
    pub duration: String,
}

/// A registered user
///
/// Passwords are stored and compared in plaintext; this mirrors the
/// single-device MVP contract and is out of scope to harden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Back-reference list of appointment ids for quick lookup
    #[serde(default)]
    pub appointments: Vec<String>,
    /// Back-reference list of ticket ids for quick lookup
    #[serde(default)]
    pub tickets: Vec<String>,
}

/// Appointment lifecycle state: confirmed → cancelled (terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A booked appointment
///
/// Never physically deleted; cancellation is a soft status transition so
/// history is retained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    /// Weak reference to a facility
    pub facility_id: u32,
    /// Denormalized snapshot of the facility name at booking time
    pub facility_name: String,
    pub service: String,
    pub date_time: DateTime<Utc>,
    /// Weak reference to the booking user
    pub user_id: String,
    pub status: AppointmentStatus,
    pub ticket_number: String,
    pub qr_code_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Ticket lifecycle state: active → used, or active → expired (both terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Expired,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Active => write!(f, "active"),
            TicketStatus::Used => write!(f, "used"),
            TicketStatus::Expired => write!(f, "expired"),
        }
    }
}

/// A purchased queue ticket
///
/// Expiry is evaluated lazily on access, never by a background timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    /// Weak reference to a facility
    pub facility_id: u32,
    pub service: String,
    /// Price paid in CFA francs
    pub price: u32,
    /// Weak reference to the purchasing user
    pub user_id: String,
    pub purchase_date: DateTime<Utc>,
    pub status: TicketStatus,
    pub ticket_number: String,
    pub qr_code_url: String,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Whether this ticket's validity window has passed at `now`
    pub fn is_past_validity(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}
