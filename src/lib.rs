//! # MediQueue
//!
//! Local-First Medical Booking Engine - A Rust library for managing medical
//! appointments, queue tickets, and facility catalogs over a single
//! persisted store.
//!
//! ## Features
//!
//! - **Single-blob persistence**: The whole application state lives in one
//!   JSON document, loaded on open and rewritten on every change
//! - **Cross-handle sync**: A broadcast change bus keeps concurrent store
//!   handles over the same blob in agreement, last writer wins
//! - **Lifecycle state machines**: Appointments (confirmed/cancelled) and
//!   queue tickets (active/used/expired with lazy expiry)
//! - **Session management**: Signup, login, and whitelist-based profile
//!   updates backed by the same store
//! - **Seeded catalog**: A fixed set of facilities and services, seeded
//!   once into an empty store
//!
//! ## Modules
//!
//! - [`store`]: Persisted single-document store and change propagation
//! - [`sync`]: Change bus connecting store handles
//! - [`auth`]: Accounts and the current session
//! - [`catalog`]: Facility and service reference data
//! - [`booking`]: Appointment and ticket lifecycles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediqueue::booking::AppointmentManager;
//! use mediqueue::auth::{AuthManager, SignupData};
//! use mediqueue::catalog::FacilityCatalog;
//! use mediqueue::store::{PersistentStore, StoreConfig};
//! use mediqueue::sync::ChangeBus;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = ChangeBus::default();
//!     let store = Arc::new(PersistentStore::open(
//!         StoreConfig::new("./mediqueue_data"),
//!         bus,
//!     )?);
//!
//!     let catalog = FacilityCatalog::new(Arc::clone(&store));
//!     catalog.seed_defaults().await;
//!
//!     let auth = Arc::new(AuthManager::attach(Arc::clone(&store)).await);
//!     auth.signup(SignupData {
//!         email: "awa@example.com".to_string(),
//!         password: "secret1".to_string(),
//!         full_name: "Awa Diop".to_string(),
//!         phone: None,
//!     })
//!     .await?;
//!
//!     let appointments = AppointmentManager::new(Arc::clone(&store), Arc::clone(&auth));
//!     let slot = appointments
//!         .get_next_available_slot(1)
//!         .ok_or("no open slot")?;
//!     appointments
//!         .book_appointment(1, "Consultation Générale", slot, None)
//!         .await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod store;
pub mod sync;
pub mod util;

// Re-export top-level types for convenience
pub use store::{
    Appointment, AppointmentStatus, Facility, GeoPoint, PersistentStore, Service, Store,
    StoreConfig, StoreError, StoreEvent, StoreResult, Ticket, TicketStatus, User,
};

pub use sync::{ChangeBus, ChangeNotice};

pub use auth::{AuthError, AuthManager, ProfilePatch, SignupData};

pub use catalog::FacilityCatalog;

pub use booking::{
    AppointmentManager, BookingError, TicketError, TicketManager, WaitingStats,
};

pub use config::{Config, ConfigError, LoggingConfig, StoreSettings};
