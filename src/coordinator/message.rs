use super::error::TrackerError;
use crate::channel::{ChannelMessage, ChannelSubscription};
use crate::clients::ServiceError;
use crate::geo::DistanceEta;
use crate::model::{BookingId, BookingRecord, CancellationReason, DriverLocationSample};
use crate::watchdog::WatchdogTicket;
use tokio::sync::oneshot;
use tokio::time::Instant;

pub type Response<T> = oneshot::Sender<Result<T, TrackerError>>;

/// Messages processed by the tracking actor.
///
/// The last two variants are sent by the actor's own background tasks.
#[derive(Debug)]
pub enum TrackingRequest {
    Activate {
        identity: String,
        respond_to: Response<Option<BookingId>>,
    },
    Deactivate {
        respond_to: Response<()>,
    },
    Track {
        booking: BookingRecord,
        respond_to: Response<()>,
    },
    Deliver {
        message: ChannelMessage,
        respond_to: Response<()>,
    },
    Rate {
        booking_id: BookingId,
        respond_to: Response<()>,
    },
    CancellationReasons {
        respond_to: Response<Vec<CancellationReason>>,
    },
    Snapshot {
        respond_to: Response<TrackingSnapshot>,
    },
    Dispose {
        respond_to: Response<()>,
    },
    WatchdogExpired {
        ticket: WatchdogTicket,
    },
    BookingsFetched {
        identity: String,
        generation: u64,
        result: Result<Vec<BookingRecord>, ServiceError>,
        respond_to: Response<Option<BookingId>>,
    },
}

/// A read-only view of the coordinator.
#[derive(Debug, Clone)]
pub struct TrackingSnapshot {
    pub identity: Option<String>,
    pub channel: Option<ChannelSubscription>,
    pub booking: Option<BookingRecord>,
    pub last_sample: Option<DriverLocationSample>,
    pub eta: Option<DistanceEta>,
    pub watchdog_armed_for: Option<BookingId>,
    /// When the armed watchdog gives up on the driver search.
    pub watchdog_deadline: Option<Instant>,
    pub disposed: bool,
}
