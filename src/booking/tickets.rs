//! Queue-ticket purchase and redemption lifecycle
//!
//! State machine per ticket: active → used, or active → expired. Both end
//! states are terminal. Expiry is evaluated lazily on the next access and
//! the transition persists even when the access itself is rejected.

use crate::auth::AuthManager;
use crate::store::types::{Ticket, TicketStatus};
use crate::store::PersistentStore;
use crate::util;
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Ticket number prefix for queue tickets
pub const TICKET_PREFIX: &str = "SMH-";

/// Validity window from purchase, in hours
pub const TICKET_VALIDITY_HOURS: i64 = 24;

/// Errors that can occur in the ticket lifecycle
#[derive(Debug, Error)]
pub enum TicketError {
    /// No signed-in user and no explicit user id
    #[error("Sign in to purchase a ticket")]
    NotAuthenticated,

    /// No matching ticket for that id/number (and owner, where scoped)
    #[error("Ticket not found")]
    TicketNotFound,

    /// The ticket is already used or expired
    #[error("Ticket already used or expired")]
    InvalidState,

    /// The validity window has passed; the ticket was just marked expired
    #[error("Ticket expired")]
    Expired,
}

/// Ticket purchase and redemption
pub struct TicketManager {
    store: Arc<PersistentStore>,
    auth: Arc<AuthManager>,
}

impl TicketManager {
    pub fn new(store: Arc<PersistentStore>, auth: Arc<AuthManager>) -> Self {
        Self { store, auth }
    }

    /// Purchase an active ticket valid for 24 hours
    ///
    /// `user_id` falls back to the current session. The facility id is a weak
    /// reference and is not validated. When the purchasing user is the
    /// session user, the ticket id is appended to their back-reference list.
    pub async fn purchase_ticket(
        &self,
        facility_id: u32,
        service: &str,
        price: u32,
        user_id: Option<&str>,
    ) -> Result<Ticket, TicketError> {
        let session_id = self.auth.current_user().await.map(|u| u.id);
        let user_id = match user_id {
            Some(id) => id.to_string(),
            None => session_id.clone().ok_or(TicketError::NotAuthenticated)?,
        };

        let now = Utc::now();
        let ticket_number = util::ticket_number(TICKET_PREFIX);
        let ticket = Ticket {
            id: util::generate_id(),
            facility_id,
            service: service.to_string(),
            price,
            user_id: user_id.clone(),
            purchase_date: now,
            status: TicketStatus::Active,
            qr_code_url: util::qr_code_url(&ticket_number),
            ticket_number,
            valid_until: now + Duration::hours(TICKET_VALIDITY_HOURS),
            used_at: None,
        };

        let for_session_user = session_id.as_deref() == Some(user_id.as_str());
        self.store
            .update(|s| {
                s.tickets.push(ticket.clone());
                if for_session_user {
                    if let Some(user) = s.user_by_id_mut(&user_id) {
                        user.tickets.push(ticket.id.clone());
                    }
                }
            })
            .await;
        if for_session_user {
            self.auth.refresh().await;
        }

        tracing::info!(ticket_id = %ticket.id, facility_id, service, "ticket purchased");
        Ok(ticket)
    }

    /// Redeem an active ticket owned by `user_id`
    ///
    /// A ticket past its validity window is marked expired (and that
    /// transition persists) instead of being honored.
    pub async fn use_ticket(&self, ticket_id: &str, user_id: &str) -> Result<Ticket, TicketError> {
        let now = Utc::now();
        // Status check and transition run in one closure so no concurrent
        // redemption can slip between them.
        let result = self
            .store
            .update_if(|s| {
                let ticket = match s
                    .tickets
                    .iter_mut()
                    .find(|t| t.id == ticket_id && t.user_id == user_id)
                {
                    Some(ticket) => ticket,
                    None => return (false, Err(TicketError::TicketNotFound)),
                };
                if ticket.status != TicketStatus::Active {
                    return (false, Err(TicketError::InvalidState));
                }
                if ticket.is_past_validity(now) {
                    ticket.status = TicketStatus::Expired;
                    return (true, Err(TicketError::Expired));
                }
                ticket.status = TicketStatus::Used;
                ticket.used_at = Some(now);
                (true, Ok(ticket.clone()))
            })
            .await;

        match &result {
            Ok(ticket) => tracing::info!(ticket_id = %ticket.id, "ticket used"),
            Err(TicketError::Expired) => {
                tracing::info!(ticket_id, "ticket expired on use attempt");
            }
            Err(_) => {}
        }
        result
    }

    /// Verify a ticket by number, without consuming it
    ///
    /// Facility-side flow: the lookup is global, not scoped to a user. The
    /// expiry side effect is the same as in [`use_ticket`](Self::use_ticket),
    /// but a valid ticket stays active.
    pub async fn validate_ticket(&self, ticket_number: &str) -> Result<Ticket, TicketError> {
        let now = Utc::now();
        let result = self
            .store
            .update_if(|s| {
                let ticket = match s
                    .tickets
                    .iter_mut()
                    .find(|t| t.ticket_number == ticket_number)
                {
                    Some(ticket) => ticket,
                    None => return (false, Err(TicketError::TicketNotFound)),
                };
                if ticket.status != TicketStatus::Active {
                    return (false, Err(TicketError::InvalidState));
                }
                if ticket.is_past_validity(now) {
                    ticket.status = TicketStatus::Expired;
                    return (true, Err(TicketError::Expired));
                }
                // A valid ticket stays active; nothing to persist
                (false, Ok(ticket.clone()))
            })
            .await;

        if matches!(&result, Err(TicketError::Expired)) {
            tracing::info!(ticket_number, "ticket expired on validation");
        }
        result
    }

    /// All tickets for a user, most recent purchase first
    pub async fn get_user_tickets(&self, user_id: &str) -> Vec<Ticket> {
        let mut tickets = self
            .store
            .read(|s| {
                s.tickets
                    .iter()
                    .filter(|t| t.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        tickets.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        tickets
    }
}
