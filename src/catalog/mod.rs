//! Facility and service catalog
//!
//! Read-mostly views over the seeded reference data. The catalog never
//! mutates the store except through the one idempotent seeding step;
//! pagination, sorting, and rendering live with the callers.

pub mod seed;

use crate::store::types::{Facility, Service};
use crate::store::PersistentStore;
use std::sync::Arc;

pub use seed::{default_facilities, default_services};

/// Read-only catalog over the facility/service collections
pub struct FacilityCatalog {
    store: Arc<PersistentStore>,
}

impl FacilityCatalog {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    /// Populate the reference collections if the store is empty
    ///
    /// Idempotent; returns whether seeding ran.
    pub async fn seed_defaults(&self) -> bool {
        self.store
            .seed_defaults(seed::default_facilities(), seed::default_services())
            .await
    }

    /// All facilities, in catalog order
    pub async fn facilities(&self) -> Vec<Facility> {
        self.store.read(|s| s.facilities.clone()).await
    }

    /// Look up one facility by id
    pub async fn facility_by_id(&self, id: u32) -> Option<Facility> {
        self.store.read(|s| s.facility_by_id(id).cloned()).await
    }

    /// All catalog services
    pub async fn services(&self) -> Vec<Service> {
        self.store.read(|s| s.services.clone()).await
    }
}
