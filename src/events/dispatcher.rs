//! # Dispatcher
//!
//! Owns the set of event kinds bound on the customer channel and turns raw
//! channel messages into [`DomainEvent`]s. Invalid messages are logged and
//! dropped here, so nothing past this point ever sees a malformed payload and
//! nothing here can fail the caller.

use super::kind::EventKind;
use super::normalizer::{normalize, DomainEvent};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    kinds: Vec<EventKind>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher bound to every kind the tracker understands.
    pub fn new() -> Self {
        Self {
            kinds: EventKind::ALL.to_vec(),
        }
    }

    /// A dispatcher bound to a subset of kinds.
    pub fn with_kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let mut kinds: Vec<_> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        Self { kinds }
    }

    /// Kinds the subscription manager should bind.
    pub fn bound_kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Normalizes a raw message; invalid ones become `None` with a diagnostic.
    pub fn dispatch(&self, raw_kind: &str, payload: &Value) -> Option<DomainEvent> {
        match normalize(raw_kind, payload) {
            Ok(event) if self.kinds.contains(&event.kind()) => {
                debug!(kind = %event.kind(), booking_id = %event.booking_id(), "Dispatched");
                Some(event)
            }
            Ok(event) => {
                debug!(kind = %event.kind(), "Kind not bound, dropped");
                None
            }
            Err(invalid) => {
                warn!(raw_kind, error = %invalid, "Invalid event dropped");
                None
            }
        }
    }
}
