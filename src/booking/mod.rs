//! Appointment and queue-ticket lifecycles
//!
//! Two state machines over the shared store: appointments move between
//! confirmed and cancelled, tickets move from active to one of the
//! terminal states (used or expired). Both managers resolve the acting
//! user from the auth session when no explicit user id is given.

pub mod appointments;
pub mod tickets;

pub use appointments::{AppointmentManager, BookingError, WaitingStats};
pub use tickets::{TicketError, TicketManager};
