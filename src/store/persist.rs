//! Persistent store
//!
//! Single source of truth for all collections. One handle corresponds to one
//! live view (a browser tab in the original deployment): it keeps the whole
//! [`Store`] in memory, writes it back as a single JSON blob after every
//! mutation, and notifies listeners with a full snapshot on every change,
//! local or remote.
//!
//! Consistency is last-writer-wins at whole-blob granularity. Two handles
//! mutating concurrently before either write lands means the later save wins
//! in full. That is the accepted single-user-per-device contract, not a bug
//! to fix here.

use crate::store::error::StoreResult;
use crate::store::types::{Facility, Service, Store};
use crate::sync::{ChangeBus, ChangeNotice};
use crate::util;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Duration};
use uuid::Uuid;

/// Capacity of the per-handle listener channel
const LISTENER_CAPACITY: usize = 64;

/// Configuration for the persistent store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the persisted blob
    pub data_dir: PathBuf,
    /// Autosave cadence in seconds (default: 30)
    pub autosave_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("mediqueue_data"),
            autosave_interval_secs: 30,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Path of the single well-known blob
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

/// Notification delivered to listeners whenever the store changes
///
/// Carries the full snapshot; consumers re-read whatever subset they need.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub store: Store,
}

/// The persistent store handle
pub struct PersistentStore {
    config: StoreConfig,
    data: Arc<RwLock<Store>>,
    listeners: broadcast::Sender<StoreEvent>,
    bus: ChangeBus,
    /// Identity of this handle on the bus; own notices are ignored
    origin: Uuid,
    shutdown: Arc<RwLock<bool>>,
}

impl PersistentStore {
    /// Open a store handle over the blob at `config.store_path()`
    ///
    /// Missing or malformed persisted data falls back to an empty store;
    /// load never surfaces an error to the caller.
    pub fn open(config: StoreConfig, bus: ChangeBus) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = Self::load_blob(&config);
        let (listeners, _) = broadcast::channel(LISTENER_CAPACITY);

        Ok(Self {
            config,
            data: Arc::new(RwLock::new(store)),
            listeners,
            bus,
            origin: Uuid::new_v4(),
            shutdown: Arc::new(RwLock::new(false)),
        })
    }

    /// Read the blob, treating missing or malformed data as empty
    fn load_blob(config: &StoreConfig) -> Store {
        match util::load_json::<Store>(&config.store_path()) {
            Ok(Some(store)) => {
                tracing::debug!(path = ?config.store_path(), "loaded persisted store");
                store
            }
            Ok(None) => {
                tracing::info!(path = ?config.store_path(), "no persisted store, starting empty");
                Store::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = ?config.store_path(),
                    error = %e,
                    "malformed persisted store, starting empty"
                );
                Store::default()
            }
        }
    }

    /// This handle's identity on the change bus
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Full clone of the in-memory state
    pub async fn snapshot(&self) -> Store {
        self.data.read().await.clone()
    }

    /// Run a read-only closure against the current state
    pub async fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        let data = self.data.read().await;
        f(&data)
    }

    /// Apply a mutation, persist, and notify
    ///
    /// The save is best-effort: a write failure is logged and the in-memory
    /// state stays authoritative for this handle. Listeners and the bus are
    /// notified either way.
    pub async fn update<T>(&self, f: impl FnOnce(&mut Store) -> T) -> T {
        self.update_if(|s| (true, f(s))).await
    }

    /// Apply a conditional mutation under one write-lock acquisition
    ///
    /// The closure returns whether it changed the store along with its
    /// result. Check-then-act sequences belong here: running the check and
    /// the transition in one closure means no other writer can slip in
    /// between them. The blob is written before the lock is released, so
    /// persisted snapshots never run behind the in-memory state; persisting
    /// and notification are skipped when no change is reported.
    pub async fn update_if<T>(&self, f: impl FnOnce(&mut Store) -> (bool, T)) -> T {
        let (value, snapshot) = {
            let mut data = self.data.write().await;
            let (changed, value) = f(&mut data);
            if !changed {
                return value;
            }
            let snapshot = data.clone();
            if let Err(e) = util::store_json(&self.config.store_path(), &snapshot) {
                tracing::error!(error = %e, "store save failed, in-memory state kept");
            }
            (value, snapshot)
        };

        self.notify(snapshot);
        self.bus.publish(ChangeNotice::from_origin(self.origin));

        value
    }

    /// Serialize the current state and write the blob
    ///
    /// Holds the read lock for the duration of the write so a save can
    /// never land on disk after a newer update's snapshot.
    pub async fn save(&self) -> StoreResult<()> {
        let data = self.data.read().await;
        util::store_json(&self.config.store_path(), &*data)
    }

    /// Replace the in-memory state with whatever the blob holds now
    pub async fn reload(&self) -> Store {
        let loaded = Self::load_blob(&self.config);
        let mut data = self.data.write().await;
        *data = loaded;
        data.clone()
    }

    /// Populate facility/service reference data if either list is empty
    ///
    /// Idempotent: a second call when data is already present is a no-op and
    /// does not persist or notify. Returns whether seeding ran.
    pub async fn seed_defaults(&self, facilities: Vec<Facility>, services: Vec<Service>) -> bool {
        let needs_seed = self
            .read(|s| s.facilities.is_empty() || s.services.is_empty())
            .await;
        if !needs_seed {
            tracing::debug!("reference data already present, skipping seed");
            return false;
        }

        self.update(|s| {
            if s.facilities.is_empty() {
                s.facilities = facilities;
            }
            if s.services.is_empty() {
                s.services = services;
            }
            tracing::info!(
                facilities = s.facilities.len(),
                services = s.services.len(),
                "seeded reference data"
            );
        })
        .await;

        true
    }

    /// Get a receiver for change notifications
    ///
    /// Fires on every local mutation and on every applied remote change;
    /// remote changes are re-loaded from the blob before notifying, so
    /// listeners always see the freshest version known to this handle.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.listeners.subscribe()
    }

    fn notify(&self, snapshot: Store) {
        let _ = self.listeners.send(StoreEvent { store: snapshot });
    }

    /// React to a bus notice from another handle
    ///
    /// Own notices are ignored. A foreign notice re-loads from the blob and
    /// notifies listeners. Returns whether the notice was applied.
    pub async fn apply_remote_change(&self, notice: &ChangeNotice) -> bool {
        if notice.origin == self.origin {
            return false;
        }

        tracing::debug!(origin = %notice.origin, "applying remote store change");
        let snapshot = self.reload().await;
        self.notify(snapshot);
        true
    }

    /// Start the periodic autosave task
    ///
    /// Bounds how much in-memory-only state is lost if the handle goes away
    /// uncleanly. Performs a final save when shut down.
    pub fn start_autosave(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let period = Duration::from_secs(store.config.autosave_interval_secs);

        tokio::spawn(async move {
            let mut ticker = interval(period);

            loop {
                ticker.tick().await;

                if *store.shutdown.read().await {
                    break;
                }

                if let Err(e) = store.save().await {
                    tracing::error!(error = %e, "autosave failed");
                }
            }

            if let Err(e) = store.save().await {
                tracing::error!(error = %e, "final autosave failed");
            }
        })
    }

    /// Start the task that watches the bus and applies foreign changes
    pub fn start_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let mut rx = store.bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notice) => {
                        if *store.shutdown.read().await {
                            break;
                        }
                        store.apply_remote_change(&notice).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // The blob holds the latest state anyway; one reload
                        // catches up on any number of missed notices.
                        tracing::warn!(missed, "sync receiver lagged, reloading");
                        let snapshot = store.reload().await;
                        store.notify(snapshot);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Flush state and mark background tasks for termination
    pub async fn shutdown(&self) -> StoreResult<()> {
        *self.shutdown.write().await = true;
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::User;
    use chrono::Utc;
    use tempfile::tempdir;

    fn test_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            full_name: "Awa Diop".to_string(),
            phone: None,
            created_at: Utc::now(),
            appointments: vec![],
            tickets: vec![],
        }
    }

    fn sample_services() -> Vec<Service> {
        vec![Service {
            id: 1,
            name: "Consultation Générale".to_string(),
            price: 5000,
            duration: "30 min".to_string(),
        }]
    }

    fn sample_facilities() -> Vec<Facility> {
        vec![Facility {
            id: 1,
            name: "Hôpital Principal de Dakar".to_string(),
            address: "Avenue Nelson Mandela, Dakar".to_string(),
            phone: "+221 33 839 50 50".to_string(),
            services: vec!["Consultation Générale".to_string()],
            description: String::new(),
            location: crate::store::types::GeoPoint {
                lat: 14.6928,
                lng: -17.4467,
            },
            waiting_time: 45,
            rating: 4.2,
            opening_hours: Default::default(),
            price: 5000,
            capacity: "500 lits".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_open_empty_starts_default() {
        let dir = tempdir().unwrap();
        let store =
            PersistentStore::open(StoreConfig::new(dir.path()), ChangeBus::default()).unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot, Store::default());
    }

    #[tokio::test]
    async fn test_round_trip_persistence() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        let first =
            PersistentStore::open(config.clone(), ChangeBus::default()).unwrap();
        first
            .update(|s| s.users.push(test_user("u1", "a@b.com")))
            .await;
        let written = first.snapshot().await;

        // Fresh handle simulates a new tab
        let second = PersistentStore::open(config, ChangeBus::default()).unwrap();
        assert_eq!(second.snapshot().await, written);
    }

    #[tokio::test]
    async fn test_malformed_blob_recovers_to_empty() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        std::fs::write(config.store_path(), "{this is not json").unwrap();

        let store = PersistentStore::open(config, ChangeBus::default()).unwrap();
        assert_eq!(store.snapshot().await, Store::default());
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let dir = tempdir().unwrap();
        let store =
            PersistentStore::open(StoreConfig::new(dir.path()), ChangeBus::default()).unwrap();

        let seeded = store
            .seed_defaults(sample_facilities(), sample_services())
            .await;
        assert!(seeded);

        let seeded_again = store
            .seed_defaults(sample_facilities(), sample_services())
            .await;
        assert!(!seeded_again);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.facilities.len(), 1);
        assert_eq!(snapshot.services.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_persists_immediately() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        let store = PersistentStore::open(config.clone(), ChangeBus::default()).unwrap();
        store
            .seed_defaults(sample_facilities(), sample_services())
            .await;

        let reopened = PersistentStore::open(config, ChangeBus::default()).unwrap();
        assert_eq!(reopened.snapshot().await.facilities.len(), 1);
    }

    #[tokio::test]
    async fn test_update_if_without_change_is_silent() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let bus = ChangeBus::default();
        let store = PersistentStore::open(config.clone(), bus.clone()).unwrap();

        let mut listeners = store.subscribe();
        let mut notices = bus.subscribe();

        let value = store.update_if(|_| (false, 7)).await;
        assert_eq!(value, 7);
        assert!(listeners.try_recv().is_err());
        assert!(notices.try_recv().is_err());
        assert!(!config.store_path().exists());
    }

    #[tokio::test]
    async fn test_update_if_with_change_persists_and_notifies() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let store = PersistentStore::open(config.clone(), ChangeBus::default()).unwrap();

        let mut listeners = store.subscribe();
        store
            .update_if(|s| {
                s.users.push(test_user("u1", "a@b.com"));
                (true, ())
            })
            .await;

        assert_eq!(listeners.try_recv().unwrap().store.users.len(), 1);
        let reopened = PersistentStore::open(config, ChangeBus::default()).unwrap();
        assert_eq!(reopened.snapshot().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_matches_memory_after_update() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let store = PersistentStore::open(config.clone(), ChangeBus::default()).unwrap();

        store
            .update(|s| s.users.push(test_user("u1", "a@b.com")))
            .await;

        let on_disk: Store =
            serde_json::from_str(&std::fs::read_to_string(config.store_path()).unwrap()).unwrap();
        assert_eq!(on_disk, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_listener_receives_snapshot_on_update() {
        let dir = tempdir().unwrap();
        let store =
            PersistentStore::open(StoreConfig::new(dir.path()), ChangeBus::default()).unwrap();

        let mut rx = store.subscribe();
        store
            .update(|s| s.users.push(test_user("u1", "a@b.com")))
            .await;

        let event = rx.try_recv().unwrap();
        assert_eq!(event.store.users.len(), 1);
        assert_eq!(event.store.users[0].email, "a@b.com");
    }

    #[tokio::test]
    async fn test_update_publishes_bus_notice() {
        let dir = tempdir().unwrap();
        let bus = ChangeBus::default();
        let store = PersistentStore::open(StoreConfig::new(dir.path()), bus.clone()).unwrap();

        let mut rx = bus.subscribe();
        store.update(|_| {}).await;

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.origin, store.origin());
    }

    #[tokio::test]
    async fn test_remote_change_reloads_and_notifies() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let bus = ChangeBus::default();

        let tab_a = PersistentStore::open(config.clone(), bus.clone()).unwrap();
        let tab_b = PersistentStore::open(config, bus).unwrap();

        tab_a
            .update(|s| s.users.push(test_user("u1", "a@b.com")))
            .await;

        // B has not seen the write yet
        assert!(tab_b.snapshot().await.users.is_empty());

        let mut rx = tab_b.subscribe();
        let applied = tab_b
            .apply_remote_change(&ChangeNotice::from_origin(tab_a.origin()))
            .await;
        assert!(applied);

        assert_eq!(tab_b.snapshot().await.users.len(), 1);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.store.users.len(), 1);
    }

    #[tokio::test]
    async fn test_own_notices_are_ignored() {
        let dir = tempdir().unwrap();
        let store =
            PersistentStore::open(StoreConfig::new(dir.path()), ChangeBus::default()).unwrap();

        let applied = store
            .apply_remote_change(&ChangeNotice::from_origin(store.origin()))
            .await;
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_shutdown_saves() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        let store = PersistentStore::open(config.clone(), ChangeBus::default()).unwrap();
        {
            // Mutate in memory without going through update()
            let mut data = store.data.write().await;
            data.users.push(test_user("u1", "a@b.com"));
        }
        store.shutdown().await.unwrap();

        let reopened = PersistentStore::open(config, ChangeBus::default()).unwrap();
        assert_eq!(reopened.snapshot().await.users.len(), 1);
    }
}
