//! MediQueue CLI
//!
//! Demo driver for the local-first booking engine.

use mediqueue::auth::{AuthError, AuthManager, SignupData};
use mediqueue::booking::{AppointmentManager, TicketManager};
use mediqueue::catalog::FacilityCatalog;
use mediqueue::config::{Config, LoggingConfig};
use mediqueue::store::PersistentStore;
use mediqueue::sync::ChangeBus;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_logging(&config.logging);

    tracing::info!("MediQueue Booking Engine v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", config.store.data_dir);

    let bus = ChangeBus::default();
    let store = Arc::new(PersistentStore::open(
        config.store.to_store_config(),
        bus,
    )?);

    // Background tasks: periodic autosave and remote-change intake
    let autosave_handle = store.start_autosave();
    let sync_handle = store.start_sync();

    // Seed the facility catalog on first run
    let catalog = FacilityCatalog::new(Arc::clone(&store));
    if catalog.seed_defaults().await {
        tracing::info!("Seeded default facility catalog");
    }

    let auth = Arc::new(AuthManager::attach(Arc::clone(&store)).await);
    let appointments = AppointmentManager::new(Arc::clone(&store), Arc::clone(&auth));
    let tickets = TicketManager::new(Arc::clone(&store), Arc::clone(&auth));

    demo_session(&auth).await?;
    demo_booking(&catalog, &appointments).await?;
    demo_tickets(&tickets, &auth).await?;

    // Shutdown
    tracing::info!("Shutting down...");
    store.shutdown().await?;
    autosave_handle.abort();
    sync_handle.abort();

    tracing::info!("MediQueue shutdown complete");
    Ok(())
}

/// Initialize tracing from the logging config
///
/// `RUST_LOG` wins over the configured level when set; `format = "json"`
/// selects the structured layer.
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("mediqueue={}", logging.level)),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Sign in the demo account, creating it on first run
async fn demo_session(auth: &AuthManager) -> Result<(), AuthError> {
    let user = match auth.login("demo@mediqueue.sn", "demo-pass").await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Creating demo account");
            auth.signup(SignupData {
                email: "demo@mediqueue.sn".to_string(),
                password: "demo-pass".to_string(),
                full_name: "Demo Patient".to_string(),
                phone: Some("+221 77 000 00 00".to_string()),
            })
            .await?
        }
        Err(e) => return Err(e),
    };

    tracing::info!("Signed in as {} ({})", user.full_name, user.email);
    Ok(())
}

async fn demo_booking(
    catalog: &FacilityCatalog,
    appointments: &AppointmentManager,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Booking demo appointment...");

    let facilities = appointments.search_facilities("hôpital").await;
    tracing::info!("Found {} facilities matching \"hôpital\"", facilities.len());

    let facility = catalog
        .facility_by_id(1)
        .await
        .ok_or("facility catalog not seeded")?;

    let slot = appointments
        .get_next_available_slot(facility.id)
        .ok_or("no open slot in the booking window")?;
    let appointment = appointments
        .book_appointment(facility.id, "Consultation Générale", slot, None)
        .await?;
    tracing::info!(
        "Booked {} at {} for {}",
        appointment.ticket_number,
        facility.name,
        appointment.date_time
    );

    let stats = appointments.get_waiting_stats(facility.id).await;
    tracing::info!(
        "Queue at {}: {} waiting, ~{} min",
        facility.name,
        stats.total_in_queue,
        stats.estimated_wait_minutes
    );

    Ok(())
}

async fn demo_tickets(
    tickets: &TicketManager,
    auth: &AuthManager,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Purchasing demo ticket...");

    let ticket = tickets.purchase_ticket(1, "Urgences", 10000, None).await?;
    tracing::info!(
        "Ticket {} valid until {} ({})",
        ticket.ticket_number,
        ticket.valid_until,
        ticket.qr_code_url
    );

    let verified = tickets.validate_ticket(&ticket.ticket_number).await?;
    tracing::info!("Verified ticket {} is {}", verified.ticket_number, verified.status);

    let user = auth.current_user().await.ok_or("no session")?;
    let owned = tickets.get_user_tickets(&user.id).await;
    tracing::info!("{} holds {} ticket(s)", user.full_name, owned.len());

    Ok(())
}
