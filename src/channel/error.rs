use super::transport::TransportError;
use crate::events::EventKind;
use thiserror::Error;

/// Errors raised while opening the customer channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubscriptionError {
    /// The customer identity was blank, so no channel name can be derived.
    #[error("Cannot subscribe without a customer identity")]
    EmptyIdentity,

    #[error("Failed to connect to {channel}: {source}")]
    Connect {
        channel: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to bind {kind} on {channel}: {source}")]
    Bind {
        channel: String,
        kind: EventKind,
        #[source]
        source: TransportError,
    },
}

impl SubscriptionError {
    /// Connection problems are worth retrying on the next activation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Bind { .. })
    }
}
