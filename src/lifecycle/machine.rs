use super::effect::{Effect, EtaTarget, IgnoreReason, Notice, Outcome};
use super::error::LifecycleError;
use crate::events::DomainEvent;
use crate::model::{BookingId, BookingRecord, BookingStatus, CancellationSource};

use crate::model::BookingStatus::{Allocated, Cancelled, Delivered, Halted, Initiated, PickedUp};

/// Applies one push event to the tracked booking.
///
/// `PaymentFailed` is reported in every state, terminal ones included. Every
/// other event is ignored once the booking is terminal.
pub fn apply(record: &mut BookingRecord, event: DomainEvent) -> Outcome {
    if !belongs_to(record, event.booking_id()) {
        return Outcome::Ignored(IgnoreReason::ForeignBooking);
    }

    let previous = record.status;
    if let DomainEvent::PaymentFailed { message, .. } = event {
        return applied(previous, vec![Effect::Notice(Notice::PaymentFailed { message })]);
    }
    if previous.is_terminal() {
        return Outcome::Ignored(IgnoreReason::Terminal);
    }

    let effects = match (previous, event) {
        (Initiated, DomainEvent::DriverAssigned { driver, route, .. }) => {
            record.status = Allocated;
            record.driver = Some(driver);
            let mut effects = vec![Effect::DisarmWatchdog];
            effects.extend(route.map(Effect::UpdateRoute));
            effects.push(Effect::NotifyStateChanged);
            effects
        }
        (Allocated, DomainEvent::DriverAssigned { driver, route, .. }) => {
            let same_driver = record
                .driver
                .as_ref()
                .is_some_and(|current| current.driver_id == driver.driver_id);
            if same_driver && route.is_none() {
                return Outcome::Ignored(IgnoreReason::Duplicate);
            }
            // Reassignment, or the same driver with a fresh route.
            record.driver = Some(driver);
            let mut effects: Vec<Effect> = route.map(Effect::UpdateRoute).into_iter().collect();
            effects.push(Effect::NotifyStateChanged);
            effects
        }

        (Allocated, DomainEvent::DriverLocation { sample, .. }) => {
            vec![Effect::UpdateLocation(sample), Effect::RecomputeEta(EtaTarget::Pickup)]
        }
        (PickedUp | Halted, DomainEvent::DriverLocation { sample, .. }) => {
            vec![Effect::UpdateLocation(sample), Effect::RecomputeEta(EtaTarget::Dropoff)]
        }

        (Allocated, DomainEvent::PickupConfirmed { route, .. }) => {
            record.status = PickedUp;
            let mut effects = vec![Effect::ClearEta];
            effects.extend(route.map(Effect::UpdateRoute));
            effects.push(Effect::RecomputeEta(EtaTarget::Dropoff));
            effects.push(Effect::NotifyStateChanged);
            effects
        }
        (PickedUp | Halted, DomainEvent::PickupConfirmed { .. }) => {
            return Outcome::Ignored(IgnoreReason::Duplicate);
        }

        // Allocated is accepted: drop can overtake pickup under unordered delivery.
        (Allocated | PickedUp | Halted, DomainEvent::DropConfirmed { .. }) => {
            record.status = Delivered;
            vec![
                Effect::ClearEta,
                Effect::NotifyStateChanged,
                Effect::Notice(Notice::Delivered),
            ]
        }

        (_, DomainEvent::BookingCancelledByDriver { reason, .. }) => {
            cancel(record, CancellationSource::Driver, Notice::DriverCancelled { reason })
        }
        (_, DomainEvent::AutoCancelled { .. }) => {
            cancel(record, CancellationSource::System, Notice::AutoCancelled)
        }

        (PickedUp, DomainEvent::BookingHalted { .. }) => {
            record.status = Halted;
            vec![Effect::NotifyStateChanged, Effect::Notice(Notice::Halted)]
        }
        (Halted, DomainEvent::BookingHalted { .. }) => {
            return Outcome::Ignored(IgnoreReason::Duplicate);
        }
        (Halted, DomainEvent::HaltResumed { .. }) => {
            record.status = PickedUp;
            vec![Effect::NotifyStateChanged, Effect::Notice(Notice::Resumed)]
        }
        (PickedUp, DomainEvent::HaltResumed { .. }) => vec![Effect::Notice(Notice::Resumed)],

        (Allocated, DomainEvent::LookingForNewDriver { .. }) => {
            record.status = Initiated;
            record.driver = None;
            vec![
                Effect::ClearEta,
                Effect::ArmWatchdog,
                Effect::NotifyStateChanged,
                Effect::Notice(Notice::LookingForNewDriver),
            ]
        }
        (Initiated, DomainEvent::LookingForNewDriver { .. }) => {
            vec![Effect::Notice(Notice::LookingForNewDriver)]
        }

        _ => return Outcome::Ignored(IgnoreReason::NotApplicable),
    };

    applied(previous, effects)
}

/// Gives up on the driver search for `booking_id`.
///
/// Only a booking that is still `Initiated` is cancelled; in any other state
/// the expiry is a no-op.
pub fn expire_search(record: &mut BookingRecord, booking_id: &BookingId) -> Outcome {
    if !belongs_to(record, booking_id) {
        return Outcome::Ignored(IgnoreReason::ForeignBooking);
    }
    match record.status {
        Initiated => {
            record.status = Cancelled;
            record.cancellation = Some(CancellationSource::Watchdog);
            applied(
                Initiated,
                vec![Effect::NotifyStateChanged, Effect::NotifyWatchdogFired],
            )
        }
        status if status.is_terminal() => Outcome::Ignored(IgnoreReason::Terminal),
        _ => Outcome::Ignored(IgnoreReason::NotApplicable),
    }
}

/// Sets the post-terminal `rated` flag.
pub fn mark_rated(record: &mut BookingRecord) -> Result<(), LifecycleError> {
    if record.status != Delivered {
        return Err(LifecycleError::NotDelivered {
            booking_id: record.booking_id.clone(),
            status: record.status,
        });
    }
    if record.rated {
        return Err(LifecycleError::AlreadyRated(record.booking_id.clone()));
    }
    record.rated = true;
    Ok(())
}

fn belongs_to(record: &BookingRecord, booking_id: &BookingId) -> bool {
    !booking_id.is_empty() && *booking_id == record.booking_id
}

fn cancel(record: &mut BookingRecord, source: CancellationSource, notice: Notice) -> Vec<Effect> {
    record.status = Cancelled;
    record.cancellation = Some(source);
    vec![
        Effect::DisarmWatchdog,
        Effect::ClearEta,
        Effect::NotifyStateChanged,
        Effect::Notice(notice),
    ]
}

fn applied(previous: BookingStatus, effects: Vec<Effect>) -> Outcome {
    Outcome::Applied { previous, effects }
}
