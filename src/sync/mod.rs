//! Cross-instance synchronization
//!
//! One persisted blob can be shared by several live store handles (the
//! browser-tab model). The [`bus`] module provides the broadcast channel
//! that stands in for the platform storage event: publish on write, reload
//! on a foreign notice. Consistency stays last-writer-wins at whole-blob
//! granularity; the bus bounds staleness, it does not arbitrate writes.

pub mod bus;

pub use bus::{ChangeBus, ChangeNotice, DEFAULT_BUS_CAPACITY};
