//! Push events: the kinds bound on the channel, normalization of raw payloads
//! into [`DomainEvent`]s, and the dispatcher that drops what cannot be used.

pub mod dispatcher;
pub mod kind;
pub mod normalizer;

pub use dispatcher::*;
pub use kind::*;
pub use normalizer::{normalize, DomainEvent, InvalidEvent};
