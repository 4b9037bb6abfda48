use crate::channel::ChannelMessage;
use crate::coordinator::{Response, TrackerError, TrackingRequest, TrackingSnapshot};
use crate::model::{BookingId, BookingRecord, CancellationReason};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Handle for talking to the tracking actor. Cheap to clone.
#[derive(Clone)]
pub struct TrackingClient {
    sender: mpsc::Sender<TrackingRequest>,
}

impl TrackingClient {
    pub fn new(sender: mpsc::Sender<TrackingRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(Response<T>) -> TrackingRequest,
    ) -> Result<T, TrackerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| TrackerError::ActorClosed)?;
        response.await.map_err(|_| TrackerError::ActorDropped)?
    }

    /// Opens the customer channel and resumes the customer's open booking, if any.
    ///
    /// A subscription failure is retryable; call again on the next activation.
    #[instrument(skip(self))]
    pub async fn activate(&self, identity: &str) -> Result<Option<BookingId>, TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::Activate {
            identity: identity.to_string(),
            respond_to,
        })
        .await
    }

    /// Releases the channel and the watchdog and stops tracking.
    #[instrument(skip(self))]
    pub async fn deactivate(&self) -> Result<(), TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::Deactivate { respond_to })
            .await
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.booking_id))]
    pub async fn track(&self, booking: BookingRecord) -> Result<(), TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::Track {
            booking,
            respond_to,
        })
        .await
    }

    /// Hands a raw push message to the tracker. Invalid, stale and foreign
    /// messages are dropped inside; this only fails if the tracker is gone.
    #[instrument(skip(self, message), fields(channel = %message.channel, kind = %message.kind))]
    pub async fn deliver(&self, message: ChannelMessage) -> Result<(), TrackerError> {
        self.call(|respond_to| TrackingRequest::Deliver {
            message,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn rate(&self, booking_id: BookingId) -> Result<(), TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::Rate {
            booking_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn cancellation_reasons(&self) -> Result<Vec<CancellationReason>, TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::CancellationReasons { respond_to })
            .await
    }

    pub async fn snapshot(&self) -> Result<TrackingSnapshot, TrackerError> {
        self.call(|respond_to| TrackingRequest::Snapshot { respond_to })
            .await
    }

    /// Disposes the tracker. Later calls fail with [`TrackerError::Disposed`].
    #[instrument(skip(self))]
    pub async fn dispose(&self) -> Result<(), TrackerError> {
        debug!("Sending request");
        self.call(|respond_to| TrackingRequest::Dispose { respond_to })
            .await
    }
}
