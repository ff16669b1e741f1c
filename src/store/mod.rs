//! Mediqueue persistent store
//!
//! The single source of truth for all collections:
//!
//! - **types**: The root [`Store`] record and every domain entity
//! - **persist**: The [`PersistentStore`] handle owning load/save/seed and
//!   change notification
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   mutation closure → in-memory Store → whole-blob JSON save
//!                                      → listener snapshot + bus notice
//!
//! Read Path:
//!   snapshot/read closure → in-memory Store
//!   (remote notice → reload blob → listener snapshot)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use mediqueue::store::{PersistentStore, StoreConfig};
//! use mediqueue::sync::ChangeBus;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = ChangeBus::default();
//!     let store = PersistentStore::open(StoreConfig::new("./data"), bus)?;
//!
//!     store.update(|s| s.current_user_id = None).await;
//!     let snapshot = store.snapshot().await;
//!     println!("{} users on record", snapshot.users.len());
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod persist;
pub mod types;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use persist::{PersistentStore, StoreConfig, StoreEvent};
pub use types::{
    Appointment, AppointmentStatus, Facility, GeoPoint, Service, Store, Ticket, TicketStatus, User,
};
