use super::context::TrackingContext;
use super::message::TrackingRequest;
use super::state::Coordinator;
use crate::clients::TrackingClient;
use crate::runtime::TrackerConfig;
use tokio::sync::mpsc;
use tracing::info;

/// The server half of the tracker.
///
/// Owns the receiving end of the mailbox. All state lives inside
/// [`run`](Self::run), so no locks are needed around it.
pub struct TrackingActor {
    receiver: mpsc::Receiver<TrackingRequest>,
    mailbox: mpsc::WeakSender<TrackingRequest>,
    config: TrackerConfig,
}

impl TrackingActor {
    pub fn new(config: TrackerConfig) -> (Self, TrackingClient) {
        let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));
        let actor = Self {
            receiver,
            mailbox: sender.downgrade(),
            config,
        };
        (actor, TrackingClient::new(sender))
    }

    /// Runs until every client is dropped.
    ///
    /// Requests are handled one at a time, in arrival order. Booking fetches,
    /// cancellation reasons and watchdog expiries complete on background
    /// tasks and come back through the mailbox, so they are serialized with
    /// push messages. Background tasks only hold a weak handle on the mailbox
    /// and do not keep the actor alive.
    ///
    /// When the mailbox closes, the channel is unbound and disconnected and
    /// the watchdog disarmed, unless [`TrackingClient::dispose`] already did.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (actor, client) = TrackingActor::new(TrackerConfig::default());
    /// let context = TrackingContext::new(transport, bookings, listener);
    /// let handle = tokio::spawn(actor.run(context));
    ///
    /// client.activate("customer-42").await?;
    /// client.deliver(ChannelMessage::new("private-customer.customer-42", "driver-location", payload)).await?;
    ///
    /// drop(client);
    /// handle.await?;
    /// ```
    pub async fn run(mut self, context: TrackingContext) {
        info!(prefix = %self.config.channel_prefix, "Actor started");
        let mut coordinator = Coordinator::new(self.config, context, self.mailbox);

        while let Some(request) = self.receiver.recv().await {
            coordinator.handle(request).await;
        }

        coordinator.shutdown().await;
        info!("Shutdown");
    }
}
