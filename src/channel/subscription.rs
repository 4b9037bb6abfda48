//! # Subscription Manager
//!
//! Owns at most one [`ChannelSubscription`], scoped to a customer identity.
//!
//! ## Teardown order
//! [`SubscriptionManager::close`] unbinds every bound kind before it releases
//! the connection. A handler must never fire on a connection that is halfway
//! torn down, so the reverse order is never used, including when `open` has
//! to roll back a partially bound channel.

use super::error::SubscriptionError;
use super::transport::PushTransport;
use crate::events::EventKind;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `<prefix>.<identity>`
pub fn channel_name(prefix: &str, identity: &str) -> String {
    format!("{prefix}.{identity}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSubscription {
    channel_name: String,
    identity: String,
    bound: BTreeSet<EventKind>,
    active: bool,
}

impl ChannelSubscription {
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn bound_kinds(&self) -> &BTreeSet<EventKind> {
        &self.bound
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

pub struct SubscriptionManager {
    prefix: String,
    transport: Arc<dyn PushTransport>,
    current: Option<ChannelSubscription>,
}

impl SubscriptionManager {
    pub fn new(prefix: impl Into<String>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            prefix: prefix.into(),
            transport,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ChannelSubscription> {
        self.current.as_ref()
    }

    /// True when `kind` is currently bound on `channel`. Anything else is a
    /// stale binding and must be dropped by the caller.
    pub fn accepts(&self, channel: &str, kind: EventKind) -> bool {
        self.current
            .as_ref()
            .is_some_and(|sub| sub.active && sub.channel_name == channel && sub.bound.contains(&kind))
    }

    /// Opens the channel for `identity` and binds `kinds` on it.
    ///
    /// Reuses the current subscription when it already belongs to `identity`;
    /// a subscription for any other identity is closed first. A failed open
    /// leaves nothing connected or bound.
    ///
    /// # Returns
    ///
    /// The active subscription on `<prefix>.<identity>`, or:
    /// - [`SubscriptionError::EmptyIdentity`] for a blank identity, before any transport call
    /// - [`SubscriptionError::Connect`] when the push server refuses the connection
    /// - [`SubscriptionError::Bind`] when a kind cannot be bound (the kinds bound so far are released)
    ///
    /// Connect and bind failures are retryable on the next activation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut manager = SubscriptionManager::new("private-customer", transport);
    /// let subscription = manager.open("c42", &EventKind::ALL).await?;
    /// assert_eq!(subscription.channel_name(), "private-customer.c42");
    ///
    /// // Unbinds every kind, then disconnects.
    /// manager.close().await;
    /// ```
    pub async fn open(
        &mut self,
        identity: &str,
        kinds: &[EventKind],
    ) -> Result<ChannelSubscription, SubscriptionError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(SubscriptionError::EmptyIdentity);
        }

        let wanted: BTreeSet<EventKind> = kinds.iter().copied().collect();
        if let Some(current) = &self.current {
            if current.active && current.identity == identity && current.bound == wanted {
                debug!(channel = %current.channel_name, "Subscription reused");
                return Ok(current.clone());
            }
        }
        self.close().await;

        let channel = channel_name(&self.prefix, identity);
        if let Err(source) = self.transport.connect(&channel).await {
            warn!(%channel, error = %source, "Connect failed");
            return Err(SubscriptionError::Connect { channel, source });
        }

        let mut bound = BTreeSet::new();
        for kind in wanted {
            if let Err(source) = self.transport.bind(&channel, kind).await {
                warn!(%channel, %kind, error = %source, "Bind failed, rolling back");
                self.release(&channel, &bound).await;
                return Err(SubscriptionError::Bind { channel, kind, source });
            }
            bound.insert(kind);
        }

        let subscription = ChannelSubscription {
            channel_name: channel,
            identity: identity.to_string(),
            bound,
            active: true,
        };
        info!(channel = %subscription.channel_name, kinds = subscription.bound.len(), "Subscribed");
        self.current = Some(subscription.clone());
        Ok(subscription)
    }

    /// Unbinds everything, then disconnects. Returns the closed subscription.
    ///
    /// Transport failures during teardown are logged and otherwise ignored:
    /// the subscription is gone either way.
    pub async fn close(&mut self) -> Option<ChannelSubscription> {
        let mut subscription = self.current.take()?;
        self.release(&subscription.channel_name, &subscription.bound).await;
        subscription.bound.clear();
        subscription.active = false;
        info!(channel = %subscription.channel_name, "Unsubscribed");
        Some(subscription)
    }

    async fn release(&self, channel: &str, bound: &BTreeSet<EventKind>) {
        for kind in bound.iter().rev() {
            if let Err(e) = self.transport.unbind(channel, *kind).await {
                warn!(channel, %kind, error = %e, "Unbind failed");
            }
        }
        if let Err(e) = self.transport.disconnect(channel).await {
            warn!(channel, error = %e, "Disconnect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{InMemoryTransport, TransportCall, TransportError};

    const KINDS: [EventKind; 2] = [EventKind::DriverAssigned, EventKind::DriverLocation];

    fn manager() -> (Arc<InMemoryTransport>, SubscriptionManager) {
        let transport = Arc::new(InMemoryTransport::new());
        let manager = SubscriptionManager::new("private-customer", transport.clone());
        (transport, manager)
    }

    #[tokio::test]
    async fn open_connects_then_binds() {
        let (transport, mut manager) = manager();

        let sub = manager.open(" c42 ", &KINDS).await.unwrap();

        assert_eq!(sub.channel_name(), "private-customer.c42");
        assert_eq!(sub.identity(), "c42");
        assert!(sub.is_active());
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Connect("private-customer.c42".into()),
                TransportCall::Bind("private-customer.c42".into(), EventKind::DriverAssigned),
                TransportCall::Bind("private-customer.c42".into(), EventKind::DriverLocation),
            ]
        );
        assert!(manager.accepts("private-customer.c42", EventKind::DriverLocation));
        assert!(!manager.accepts("private-customer.c42", EventKind::AutoCancelled));
        assert!(!manager.accepts("private-customer.c7", EventKind::DriverLocation));
    }

    #[tokio::test]
    async fn close_unbinds_before_disconnecting() {
        let (transport, mut manager) = manager();
        manager.open("c42", &KINDS).await.unwrap();

        let closed = manager.close().await.unwrap();

        assert!(!closed.is_active());
        assert!(closed.bound_kinds().is_empty());
        let calls = transport.calls();
        let teardown = &calls[3..];
        assert!(matches!(teardown[0], TransportCall::Unbind(..)));
        assert!(matches!(teardown[1], TransportCall::Unbind(..)));
        assert_eq!(teardown[2], TransportCall::Disconnect("private-customer.c42".into()));
        assert!(!transport.is_connected("private-customer.c42"));
        assert!(manager.current().is_none());
        assert!(manager.close().await.is_none());
    }

    #[tokio::test]
    async fn same_identity_is_reused() {
        let (transport, mut manager) = manager();
        manager.open("c42", &KINDS).await.unwrap();
        manager.open("c42", &KINDS).await.unwrap();

        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn identity_change_closes_the_old_channel_first() {
        let (transport, mut manager) = manager();
        manager.open("c1", &KINDS).await.unwrap();
        manager.open("c2", &KINDS).await.unwrap();

        let calls = transport.calls();
        let first_c2 = calls
            .iter()
            .position(|c| *c == TransportCall::Connect("private-customer.c2".into()))
            .unwrap();
        let c1_disconnect = calls
            .iter()
            .position(|c| *c == TransportCall::Disconnect("private-customer.c1".into()))
            .unwrap();
        assert!(c1_disconnect < first_c2);
        assert!(transport.bound_kinds("private-customer.c1").is_empty());
        assert!(!manager.accepts("private-customer.c1", EventKind::DriverAssigned));
        assert!(manager.accepts("private-customer.c2", EventKind::DriverAssigned));
    }

    #[tokio::test]
    async fn connect_failure_is_retryable() {
        let (transport, mut manager) = manager();
        transport.refuse_connections(1);

        let err = manager.open("c42", &KINDS).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            SubscriptionError::Connect { source: TransportError::ConnectionRefused(_), .. }
        ));
        assert!(manager.current().is_none());

        manager.open("c42", &KINDS).await.unwrap();
        assert!(transport.is_connected("private-customer.c42"));
    }

    #[tokio::test]
    async fn bind_failure_rolls_back() {
        let (transport, mut manager) = manager();
        transport.fail_bind(Some(EventKind::DriverLocation));

        let err = manager.open("c42", &KINDS).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::Bind { kind: EventKind::DriverLocation, .. }));
        assert!(transport.bound_kinds("private-customer.c42").is_empty());
        assert!(!transport.is_connected("private-customer.c42"));
        assert_eq!(
            transport.calls().last(),
            Some(&TransportCall::Disconnect("private-customer.c42".into()))
        );
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let (transport, mut manager) = manager();
        assert_eq!(manager.open("  ", &KINDS).await, Err(SubscriptionError::EmptyIdentity));
        assert!(transport.calls().is_empty());
    }
}
