//! Transition event delivery.
//!
//! Subscribers name the edges they care about with a [`TransitionEvents`]
//! mask and get called synchronously, in registration order, while the
//! transition is being committed. Callbacks run under the governor's
//! critical section: keep them short and never call back into the governor.

use core::ops::{BitOr, BitOrAssign};

use platform::{Error, PowerState};

/// Bitmask of power-state transition edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransitionEvents(u16);

impl TransitionEvents {
    /// No edges.
    pub const NONE: TransitionEvents = TransitionEvents(0);
    /// The system entered PS4.
    pub const ENTERING_PS4: TransitionEvents = TransitionEvents(1 << 0);
    /// The system left PS4.
    pub const LEAVING_PS4: TransitionEvents = TransitionEvents(1 << 1);
    /// The system entered PS3.
    pub const ENTERING_PS3: TransitionEvents = TransitionEvents(1 << 2);
    /// The system left PS3.
    pub const LEAVING_PS3: TransitionEvents = TransitionEvents(1 << 3);
    /// The system entered PS2.
    pub const ENTERING_PS2: TransitionEvents = TransitionEvents(1 << 4);
    /// The system left PS2.
    pub const LEAVING_PS2: TransitionEvents = TransitionEvents(1 << 5);
    /// The system woke out of the PS1 retained drop.
    pub const LEAVING_PS1: TransitionEvents = TransitionEvents(1 << 6);
    /// The system woke from sleep.
    pub const LEAVING_SLEEP: TransitionEvents = TransitionEvents(1 << 7);
    /// The system left standby.
    pub const LEAVING_STANDBY: TransitionEvents = TransitionEvents(1 << 8);

    /// Whether any edge is present in both masks.
    pub fn intersects(self, other: TransitionEvents) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether the mask is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw bits.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// The edges raised by a `from` → `to` transition.
    ///
    /// Only the three active operating points have entry edges; the deep
    /// states announce themselves through their leave edge on wake.
    pub fn for_transition(from: PowerState, to: PowerState) -> TransitionEvents {
        let mut events = TransitionEvents::NONE;
        events |= match from {
            PowerState::Ps1 => Self::LEAVING_PS1,
            PowerState::Ps2 => Self::LEAVING_PS2,
            PowerState::Ps3 => Self::LEAVING_PS3,
            PowerState::Ps4 => Self::LEAVING_PS4,
            PowerState::Sleep => Self::LEAVING_SLEEP,
            PowerState::Standby => Self::LEAVING_STANDBY,
            PowerState::Ps0 => Self::NONE,
        };
        events |= match to {
            PowerState::Ps2 => Self::ENTERING_PS2,
            PowerState::Ps3 => Self::ENTERING_PS3,
            PowerState::Ps4 => Self::ENTERING_PS4,
            _ => Self::NONE,
        };
        events
    }
}

impl BitOr for TransitionEvents {
    type Output = TransitionEvents;

    fn bitor(self, rhs: TransitionEvents) -> TransitionEvents {
        TransitionEvents(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransitionEvents {
    fn bitor_assign(&mut self, rhs: TransitionEvents) {
        self.0 |= rhs.0;
    }
}

/// Callback invoked on a subscribed transition, with `(from, to)`.
pub type TransitionCallback = fn(PowerState, PowerState);

/// Ticket returned by [`TransitionNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionHandle(u32);

#[derive(Debug)]
struct Subscriber {
    id: u32,
    events: TransitionEvents,
    callback: TransitionCallback,
}

/// Maximum concurrent transition subscribers.
pub const MAX_SUBSCRIBERS: usize = 8;

/// Ordered table of transition subscribers.
#[derive(Debug, Default)]
pub struct TransitionNotifier {
    subscribers: heapless::Vec<Subscriber, MAX_SUBSCRIBERS>,
    next_id: u32,
}

impl TransitionNotifier {
    /// Empty notifier.
    pub const fn new() -> Self {
        TransitionNotifier { subscribers: heapless::Vec::new(), next_id: 0 }
    }

    /// Register `callback` for the edges in `events`.
    ///
    /// Fails with `InvalidParameter` for an empty mask and `Busy` when the
    /// table is full.
    pub fn subscribe(
        &mut self,
        events: TransitionEvents,
        callback: TransitionCallback,
    ) -> Result<SubscriptionHandle, Error> {
        if events.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let id = self.next_id;
        self.subscribers
            .push(Subscriber { id, events, callback })
            .map_err(|_| Error::Busy)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(SubscriptionHandle(id))
    }

    /// Drop the subscription behind `handle`.
    ///
    /// Delivery order of the remaining subscribers is unchanged. Fails with
    /// `InvalidParameter` for an unknown (or already removed) handle.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), Error> {
        let position = self
            .subscribers
            .iter()
            .position(|subscriber| subscriber.id == handle.0)
            .ok_or(Error::InvalidParameter)?;
        self.subscribers.remove(position);
        Ok(())
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver a committed `from` → `to` transition to every subscriber
    /// whose mask matches, oldest subscription first.
    pub fn notify(&self, from: PowerState, to: PowerState) {
        let events = TransitionEvents::for_transition(from, to);
        if events.is_empty() {
            return;
        }
        for subscriber in &self.subscribers {
            if subscriber.events.intersects(events) {
                (subscriber.callback)(from, to);
            }
        }
    }
}
