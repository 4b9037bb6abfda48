//! # Auto-Cancel Watchdog
//!
//! A single timer that gives up on the driver search for one booking.
//!
//! The watchdog never touches booking state itself. When the window closes it
//! hands a [`WatchdogTicket`] to the `on_fire` callback; the owner routes the
//! ticket back to wherever the state lives and calls [`Watchdog::claim`]
//! before acting on it. A ticket is claimable once, and only while it is the
//! ticket of the currently armed timer, so a timer that was disarmed or
//! replaced after it had already fired stays a no-op.

use crate::model::BookingId;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

/// Identifies one arming of the watchdog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogTicket {
    pub booking_id: BookingId,
    pub generation: u64,
}

struct ArmedWatchdog {
    ticket: WatchdogTicket,
    deadline: Instant,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct Watchdog {
    armed: Option<ArmedWatchdog>,
    next_generation: u64,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `booking_id`, replacing whatever was armed before.
    ///
    /// `on_fire` runs on a spawned task once `window` has elapsed, unless the
    /// timer is disarmed or re-armed first. It receives the ticket and should
    /// route it back to the owner, which decides through [`claim`](Self::claim)
    /// whether the expiry still applies.
    ///
    /// # Returns
    ///
    /// The ticket identifying this arming. Only this ticket can be claimed
    /// until the watchdog is armed again.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (tx, mut rx) = mpsc::unbounded_channel();
    /// watchdog.arm("b1".into(), Duration::from_secs(60), move |ticket| async move {
    ///     let _ = tx.send(ticket);
    /// });
    ///
    /// let ticket = rx.recv().await.unwrap();
    /// if watchdog.claim(&ticket) {
    ///     // Driver not found: cancel the search.
    /// }
    /// ```
    pub fn arm<F, Fut>(&mut self, booking_id: BookingId, window: Duration, on_fire: F) -> WatchdogTicket
    where
        F: FnOnce(WatchdogTicket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disarm_any();

        self.next_generation += 1;
        let ticket = WatchdogTicket {
            booking_id,
            generation: self.next_generation,
        };
        let deadline = Instant::now() + window;
        let fired = ticket.clone();
        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            on_fire(fired).await;
        });

        debug!(booking_id = %ticket.booking_id, window_secs = window.as_secs(), "Watchdog armed");
        self.armed = Some(ArmedWatchdog {
            ticket: ticket.clone(),
            deadline,
            task,
        });
        ticket
    }

    /// Disarms the timer if it is armed for `booking_id`.
    pub fn disarm(&mut self, booking_id: &BookingId) -> bool {
        if self.armed_for() != Some(booking_id) {
            return false;
        }
        self.disarm_any().is_some()
    }

    /// Disarms whatever is armed and returns the booking it was armed for.
    pub fn disarm_any(&mut self) -> Option<BookingId> {
        let armed = self.armed.take()?;
        armed.task.abort();
        debug!(booking_id = %armed.ticket.booking_id, "Watchdog disarmed");
        Some(armed.ticket.booking_id)
    }

    pub fn armed_for(&self) -> Option<&BookingId> {
        self.armed.as_ref().map(|armed| &armed.ticket.booking_id)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|armed| armed.deadline)
    }

    /// Accepts a fired ticket. Returns `false` for a ticket that is not the
    /// armed one or has already been claimed; the timer is spent afterwards.
    pub fn claim(&mut self, ticket: &WatchdogTicket) -> bool {
        match &self.armed {
            Some(armed) if armed.ticket == *ticket => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn arm_into(
        watchdog: &mut Watchdog,
        booking: &str,
        secs: u64,
        tx: &mpsc::UnboundedSender<WatchdogTicket>,
    ) -> WatchdogTicket {
        let tx = tx.clone();
        watchdog.arm(booking.into(), Duration::from_secs(secs), move |ticket| async move {
            let _ = tx.send(ticket);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_window() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watchdog = Watchdog::new();
        let ticket = arm_into(&mut watchdog, "b1", 60, &tx);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, ticket);
        assert!(watchdog.claim(&fired));
        assert!(!watchdog.claim(&fired));
        assert!(watchdog.armed_for().is_none());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watchdog = Watchdog::new();
        arm_into(&mut watchdog, "b1", 60, &tx);

        assert!(!watchdog.disarm(&"other".into()));
        assert!(watchdog.disarm(&"b1".into()));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watchdog = Watchdog::new();
        let old = arm_into(&mut watchdog, "b1", 60, &tx);
        let new = arm_into(&mut watchdog, "b2", 60, &tx);

        assert_eq!(watchdog.armed_for(), Some(&BookingId::new("b2")));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(rx.recv().await.unwrap(), new);
        assert!(rx.try_recv().is_err());
        assert!(!watchdog.claim(&old));
        assert!(watchdog.claim(&new));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_for_same_booking_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut watchdog = Watchdog::new();
        let first = arm_into(&mut watchdog, "b1", 60, &tx);
        let second = arm_into(&mut watchdog, "b1", 900, &tx);

        assert_ne!(first, second);
        assert!(!watchdog.claim(&first));
        assert!(watchdog.deadline().is_some());
    }
}
