//! Plain data carried through the tracker: bookings, drivers and locations.

pub mod booking;
pub mod driver;
pub mod location;

pub use booking::*;
pub use driver::*;
pub use location::*;
