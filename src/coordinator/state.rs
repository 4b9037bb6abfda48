use super::context::TrackingContext;
use super::error::TrackerError;
use super::message::{Response, TrackingRequest, TrackingSnapshot};
use crate::channel::{ChannelMessage, SubscriptionError, SubscriptionManager};
use crate::clients::{resumable_booking, BookingService, ServiceError, TrackingListener};
use crate::events::Dispatcher;
use crate::geo::{decode_with_precision, DistanceEta, EtaEstimator};
use crate::lifecycle::{self, Effect, EtaTarget, Outcome};
use crate::model::{
    BookingId, BookingRecord, CancellationReason, Coordinate, DriverLocationSample, PickupKind,
};
use crate::runtime::TrackerConfig;
use crate::watchdog::{Watchdog, WatchdogTicket};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The booking currently followed, with its ephemeral live data.
struct ActiveBooking {
    record: BookingRecord,
    last_sample: Option<DriverLocationSample>,
    eta: Option<DistanceEta>,
}

/// State owned by [`TrackingActor::run`](super::TrackingActor::run).
pub(crate) struct Coordinator {
    config: TrackerConfig,
    estimator: EtaEstimator,
    dispatcher: Dispatcher,
    subscriptions: SubscriptionManager,
    watchdog: Watchdog,
    bookings: Arc<dyn BookingService>,
    listener: Arc<dyn TrackingListener>,
    mailbox: mpsc::WeakSender<TrackingRequest>,
    identity: Option<String>,
    /// Bumped on every activation, deactivation and disposal. A booking
    /// fetch only applies if the generation it started under is still current.
    activation: u64,
    active: Option<ActiveBooking>,
    disposed: bool,
}

impl Coordinator {
    pub(crate) fn new(
        config: TrackerConfig,
        context: TrackingContext,
        mailbox: mpsc::WeakSender<TrackingRequest>,
    ) -> Self {
        Self {
            estimator: EtaEstimator::new(config.average_speed_kph),
            dispatcher: Dispatcher::new(),
            subscriptions: SubscriptionManager::new(config.channel_prefix.clone(), context.transport),
            watchdog: Watchdog::new(),
            bookings: context.bookings,
            listener: context.listener,
            mailbox,
            identity: None,
            activation: 0,
            active: None,
            disposed: false,
            config,
        }
    }

    pub(crate) async fn handle(&mut self, request: TrackingRequest) {
        match request {
            TrackingRequest::Activate {
                identity,
                respond_to,
            } => self.activate(identity, respond_to).await,
            TrackingRequest::Deactivate { respond_to } => {
                let _ = respond_to.send(self.deactivate().await);
            }
            TrackingRequest::Track {
                booking,
                respond_to,
            } => {
                let _ = respond_to.send(self.track(booking));
            }
            TrackingRequest::Deliver {
                message,
                respond_to,
            } => {
                let _ = respond_to.send(self.deliver(message));
            }
            TrackingRequest::Rate {
                booking_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.rate(booking_id));
            }
            TrackingRequest::CancellationReasons { respond_to } => {
                self.cancellation_reasons(respond_to)
            }
            TrackingRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(self.snapshot()));
            }
            TrackingRequest::Dispose { respond_to } => {
                self.dispose().await;
                let _ = respond_to.send(Ok(()));
            }
            TrackingRequest::WatchdogExpired { ticket } => self.watchdog_expired(ticket),
            TrackingRequest::BookingsFetched {
                identity,
                generation,
                result,
                respond_to,
            } => {
                let _ = respond_to.send(self.bookings_fetched(identity, generation, result));
            }
        }
    }

    /// Releases everything once the mailbox is closed.
    pub(crate) async fn shutdown(&mut self) {
        if !self.disposed {
            self.release().await;
        }
    }

    // =========================================================================
    // Activation
    // =========================================================================

    async fn activate(&mut self, identity: String, respond_to: Response<Option<BookingId>>) {
        if self.disposed {
            let _ = respond_to.send(Err(TrackerError::Disposed));
            return;
        }

        let identity = identity.trim().to_string();
        if identity.is_empty() {
            // Nothing is released for a blank identity.
            let _ = respond_to.send(Err(SubscriptionError::EmptyIdentity.into()));
            return;
        }
        if self.identity.as_deref() != Some(identity.as_str()) {
            // Bookings belong to the identity they were fetched for.
            self.release_booking();
            self.identity = None;
        }

        let kinds = self.dispatcher.bound_kinds().to_vec();
        if let Err(e) = self.subscriptions.open(&identity, &kinds).await {
            warn!(%identity, error = %e, "Activation failed");
            let _ = respond_to.send(Err(e.into()));
            return;
        }

        self.identity = Some(identity.clone());
        self.activation += 1;
        let generation = self.activation;
        debug!(%identity, generation, "Fetching active bookings");

        let bookings = Arc::clone(&self.bookings);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = bookings.fetch_active_bookings(&identity).await;
            let Some(mailbox) = mailbox.upgrade() else {
                let _ = respond_to.send(Err(TrackerError::TaskFailed(
                    "tracker stopped before bookings arrived".to_string(),
                )));
                return;
            };
            let _ = mailbox
                .send(TrackingRequest::BookingsFetched {
                    identity,
                    generation,
                    result,
                    respond_to,
                })
                .await;
        });
    }

    fn bookings_fetched(
        &mut self,
        identity: String,
        generation: u64,
        result: Result<Vec<BookingRecord>, ServiceError>,
    ) -> Result<Option<BookingId>, TrackerError> {
        if self.disposed {
            debug!(%identity, "Late booking fetch discarded");
            return Err(TrackerError::Disposed);
        }
        if self.identity.as_deref() != Some(identity.as_str()) || generation != self.activation {
            debug!(%identity, generation, current = self.activation, "Superseded booking fetch discarded");
            return Err(TrackerError::Superseded(identity));
        }

        let bookings = result.inspect_err(|e| {
            warn!(%identity, error = %e, "Fetching active bookings failed");
        })?;

        let Some(record) = resumable_booking(bookings) else {
            debug!(%identity, "No open booking to resume");
            return Ok(self.tracked_id());
        };
        if let Some(active) = &self.active {
            let current = &active.record;
            if current.booking_id == record.booking_id || !current.status.is_terminal() {
                // Local state has seen newer events than the fetch.
                debug!(%identity, fetched = %record.booking_id, tracked = %current.booking_id, "Keeping tracked booking");
                return Ok(Some(current.booking_id.clone()));
            }
        }

        let booking_id = record.booking_id.clone();
        self.begin_tracking(record);
        Ok(Some(booking_id))
    }

    async fn deactivate(&mut self) -> Result<(), TrackerError> {
        if self.disposed {
            return Err(TrackerError::Disposed);
        }
        self.release().await;
        self.identity = None;
        self.activation += 1;
        info!("Deactivated");
        Ok(())
    }

    async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.activation += 1;
        self.release().await;
        self.identity = None;
        info!("Disposed");
    }

    /// Unbinds and disconnects the channel and disarms the watchdog.
    async fn release(&mut self) {
        self.release_booking();
        self.subscriptions.close().await;
    }

    fn release_booking(&mut self) {
        self.watchdog.disarm_any();
        if let Some(previous) = self.active.take() {
            debug!(booking_id = %previous.record.booking_id, "Stopped tracking");
        }
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    fn track(&mut self, record: BookingRecord) -> Result<(), TrackerError> {
        if self.disposed {
            return Err(TrackerError::Disposed);
        }
        if record.booking_id.is_empty() {
            return Err(TrackerError::EmptyBookingId);
        }
        self.begin_tracking(record);
        Ok(())
    }

    fn begin_tracking(&mut self, record: BookingRecord) {
        self.release_booking();

        if record.status.is_searching() {
            self.arm_watchdog(record.booking_id.clone(), record.pickup_kind);
        }
        info!(booking_id = %record.booking_id, status = %record.status, "Tracking");
        self.listener.on_state_changed(&record);
        self.active = Some(ActiveBooking {
            record,
            last_sample: None,
            eta: None,
        });
    }

    fn tracked_id(&self) -> Option<BookingId> {
        self.active.as_ref().map(|active| active.record.booking_id.clone())
    }

    fn arm_watchdog(&mut self, booking_id: BookingId, kind: PickupKind) {
        let window = self.config.watchdog_window(kind);
        let mailbox = self.mailbox.clone();
        self.watchdog.arm(booking_id, window, move |ticket| async move {
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(TrackingRequest::WatchdogExpired { ticket }).await;
            }
        });
    }

    fn deliver(&mut self, message: ChannelMessage) -> Result<(), TrackerError> {
        if self.disposed {
            return Err(TrackerError::Disposed);
        }
        let Some(event) = self.dispatcher.dispatch(&message.kind, &message.payload) else {
            return Ok(());
        };
        let kind = event.kind();
        if !self.subscriptions.accepts(&message.channel, kind) {
            debug!(channel = %message.channel, %kind, "Stale binding, dropped");
            return Ok(());
        }
        let Some(active) = self.active.as_mut() else {
            debug!(%kind, "No tracked booking, dropped");
            return Ok(());
        };

        let outcome = lifecycle::apply(&mut active.record, event);
        self.settle(kind.wire_name(), outcome);
        Ok(())
    }

    fn watchdog_expired(&mut self, ticket: WatchdogTicket) {
        if self.disposed {
            return;
        }
        if !self.watchdog.claim(&ticket) {
            debug!(booking_id = %ticket.booking_id, "Stale watchdog ticket ignored");
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let outcome = lifecycle::expire_search(&mut active.record, &ticket.booking_id);
        if outcome.is_applied() {
            info!(booking_id = %ticket.booking_id, "Driver search timed out");
        }
        self.settle("watchdog", outcome);
    }

    fn rate(&mut self, booking_id: BookingId) -> Result<(), TrackerError> {
        if self.disposed {
            return Err(TrackerError::Disposed);
        }
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.record.booking_id == booking_id)
        else {
            return Err(TrackerError::NotTracked(booking_id));
        };

        lifecycle::mark_rated(&mut active.record)?;
        info!(%booking_id, "Rated");
        self.listener.on_state_changed(&active.record);
        Ok(())
    }

    fn cancellation_reasons(&self, respond_to: Response<Vec<CancellationReason>>) {
        if self.disposed {
            let _ = respond_to.send(Err(TrackerError::Disposed));
            return;
        }
        let bookings = Arc::clone(&self.bookings);
        tokio::spawn(async move {
            let result = bookings.fetch_cancellation_reasons().await.map_err(|e| {
                warn!(error = %e, "Fetching cancellation reasons failed");
                TrackerError::from(e)
            });
            let _ = respond_to.send(result);
        });
    }

    fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            identity: self.identity.clone(),
            channel: self.subscriptions.current().cloned(),
            booking: self.active.as_ref().map(|active| active.record.clone()),
            last_sample: self.active.as_ref().and_then(|active| active.last_sample.clone()),
            eta: self.active.as_ref().and_then(|active| active.eta.clone()),
            watchdog_armed_for: self.watchdog.armed_for().cloned(),
            watchdog_deadline: self.watchdog.deadline(),
            disposed: self.disposed,
        }
    }

    // =========================================================================
    // Effects
    // =========================================================================

    fn settle(&mut self, cause: &'static str, outcome: Outcome) {
        let Some(active) = &self.active else {
            return;
        };
        let booking_id = &active.record.booking_id;
        match outcome {
            Outcome::Ignored(reason) => {
                debug!(%booking_id, cause, ?reason, "Event ignored");
            }
            Outcome::Applied { previous, effects } => {
                let status = active.record.status;
                if status != previous {
                    info!(%booking_id, from = %previous, to = %status, cause, "Transition");
                }
                self.run_effects(effects);
            }
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if self.disposed {
                return;
            }
            let Some(active) = self.active.as_mut() else {
                return;
            };

            match effect {
                Effect::DisarmWatchdog => {
                    self.watchdog.disarm(&active.record.booking_id);
                }
                Effect::ArmWatchdog => {
                    let booking_id = active.record.booking_id.clone();
                    let kind = active.record.pickup_kind;
                    self.arm_watchdog(booking_id, kind);
                }
                Effect::UpdateRoute(encoded) => {
                    match decode_with_precision(&encoded, self.config.polyline_precision) {
                        Ok(route) => {
                            self.listener.on_route_updated(&active.record.booking_id, &route);
                            active.record.route = route;
                        }
                        Err(e) => {
                            warn!(booking_id = %active.record.booking_id, error = %e, "Route polyline rejected");
                        }
                    }
                }
                Effect::UpdateLocation(sample) => {
                    active.last_sample = Some(sample);
                }
                Effect::RecomputeEta(target) => {
                    let to = match target {
                        EtaTarget::Pickup => active.record.pickup,
                        EtaTarget::Dropoff => active.record.dropoff,
                    };
                    let from = active
                        .last_sample
                        .as_ref()
                        .map_or(Coordinate::SENTINEL, |sample| sample.coordinate);
                    match self.estimator.estimate(from, to) {
                        Some(eta) => {
                            self.listener.on_distance_eta_updated(eta.meters, &eta.text);
                            active.eta = Some(eta);
                        }
                        None => {
                            debug!(booking_id = %active.record.booking_id, ?target, "No fix, ETA cleared");
                            if active.eta.take().is_some() {
                                self.listener.on_distance_eta_updated(0.0, "");
                            }
                        }
                    }
                }
                Effect::ClearEta => {
                    if active.eta.take().is_some() {
                        self.listener.on_distance_eta_updated(0.0, "");
                    }
                }
                Effect::NotifyStateChanged => self.listener.on_state_changed(&active.record),
                Effect::NotifyWatchdogFired => self.listener.on_watchdog_fired(&active.record.booking_id),
                Effect::Notice(notice) => self.listener.on_notice(&active.record.booking_id, &notice),
            }
        }
    }
}
