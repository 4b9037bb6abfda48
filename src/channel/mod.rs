//! The identity-scoped push channel: the transport seam and the subscription
//! manager that owns its bindings.

pub mod error;
pub mod subscription;
pub mod transport;

pub use error::*;
pub use subscription::*;
pub use transport::*;
