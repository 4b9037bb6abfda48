//! # Push Transport
//!
//! The seam between the tracker and whatever delivers push messages. The
//! tracker only needs four operations on a named channel; the wire protocol
//! behind them is somebody else's problem.
//!
//! [`InMemoryTransport`] records every call in order and can be told to refuse
//! connections, which is how the teardown ordering is tested.

use crate::events::EventKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),
    #[error("Channel not connected: {0}")]
    NotConnected(String),
    #[error("Transport protocol error: {0}")]
    Protocol(String),
}

/// A push transport that can hold named channels with per-kind bindings.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self, channel: &str) -> Result<(), TransportError>;
    async fn bind(&self, channel: &str, kind: EventKind) -> Result<(), TransportError>;
    async fn unbind(&self, channel: &str, kind: EventKind) -> Result<(), TransportError>;
    async fn disconnect(&self, channel: &str) -> Result<(), TransportError>;
}

/// One raw message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    /// The event tag, not yet validated.
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl ChannelMessage {
    pub fn new(channel: impl Into<String>, kind: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            kind: kind.into(),
            payload,
        }
    }
}

/// A call observed by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect(String),
    Bind(String, EventKind),
    Unbind(String, EventKind),
    Disconnect(String),
}

#[derive(Debug, Default)]
struct TransportState {
    calls: Vec<TransportCall>,
    connected: BTreeSet<String>,
    bound: BTreeSet<(String, EventKind)>,
    refuse_connects: usize,
    failing_bind: Option<EventKind>,
}

/// Transport that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<TransportState>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses the next `attempts` connection attempts.
    pub fn refuse_connections(&self, attempts: usize) {
        self.lock().refuse_connects = attempts;
    }

    /// Makes every bind of `kind` fail until cleared with `None`.
    pub fn fail_bind(&self, kind: Option<EventKind>) {
        self.lock().failing_bind = kind;
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    pub fn is_connected(&self, channel: &str) -> bool {
        self.lock().connected.contains(channel)
    }

    /// Kinds currently bound on `channel`.
    pub fn bound_kinds(&self, channel: &str) -> Vec<EventKind> {
        self.lock()
            .bound
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, kind)| *kind)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PushTransport for InMemoryTransport {
    async fn connect(&self, channel: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Connect(channel.to_string()));
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(TransportError::ConnectionRefused(channel.to_string()));
        }
        state.connected.insert(channel.to_string());
        Ok(())
    }

    async fn bind(&self, channel: &str, kind: EventKind) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Bind(channel.to_string(), kind));
        if !state.connected.contains(channel) {
            return Err(TransportError::NotConnected(channel.to_string()));
        }
        if state.failing_bind == Some(kind) {
            return Err(TransportError::Protocol(format!("bind {kind} rejected")));
        }
        state.bound.insert((channel.to_string(), kind));
        Ok(())
    }

    async fn unbind(&self, channel: &str, kind: EventKind) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Unbind(channel.to_string(), kind));
        state.bound.remove(&(channel.to_string(), kind));
        Ok(())
    }

    async fn disconnect(&self, channel: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Disconnect(channel.to_string()));
        if !state.connected.remove(channel) {
            return Err(TransportError::NotConnected(channel.to_string()));
        }
        Ok(())
    }
}
